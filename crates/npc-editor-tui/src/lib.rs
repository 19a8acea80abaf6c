//! Terminal front end for the NPC editor.
//!
//! Renders the shared [`EditorState`] (ratatui + crossterm) on a dedicated OS
//! thread and turns key presses into [`EditorCommand`]s for an
//! [`EditorSession`](npc_editor::session::EditorSession) worker running on
//! the tokio runtime. The TUI never mutates NPC data itself; it only reads
//! snapshots of the state and moves its own cursors.
//!
//! # Quick start
//!
//! ```ignore
//! use npc_editor::prelude::*;
//! use npc_editor_tui::{TuiConfig, spawn_tui};
//!
//! let state = EditorState::new().shared();
//! let (tx, rx) = tokio::sync::mpsc::channel(32);
//! let session = EditorSession::new(client, state.clone());
//! tokio::spawn(session.run(rx));
//! let handle = spawn_tui(state, tx, TuiConfig::default());
//! handle.join().unwrap();
//! ```

use std::io;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::{cursor, execute};
use npc_editor::prelude::*;
use ratatui::prelude::*;
use tokio::sync::mpsc;

mod app;
mod input;
mod render;

pub use render::{log_level_style, spinner, status_style, truncate_str};

use app::App;
use input::{handle_key_event, sync_cursor};
use render::render;

/// Configuration for the TUI.
pub struct TuiConfig {
    /// API location shown in the header.
    pub base_url: String,
    /// Log buffer from [`UiTracingLayer`].
    ///
    /// When set, the TUI drains pending log lines once per frame into its own
    /// log pane, so tracing calls never touch the editor state lock.
    pub log_buffer: Option<LogBuffer>,
    /// How long to wait for input before redrawing.
    pub tick_rate: Duration,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            base_url: npc_editor::DEFAULT_BASE_URL.to_string(),
            log_buffer: None,
            tick_rate: Duration::from_millis(100),
        }
    }
}

/// Spawn the TUI on a dedicated OS thread.
///
/// The thread exits when the user quits. Dropping its command sender then
/// lets the session worker finish.
pub fn spawn_tui(
    state: SharedState,
    commands: mpsc::Sender<EditorCommand>,
    config: TuiConfig,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        if let Err(e) = run_tui(state, commands, &config) {
            eprintln!("TUI error: {e}");
        }
    })
}

/// Run the TUI event loop (blocking). Call this from a dedicated OS thread.
pub fn run_tui(
    state: SharedState,
    commands: mpsc::Sender<EditorCommand>,
    config: &TuiConfig,
) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let mut app = App::new();
    let mut tick: u64 = 0;

    while !app.should_quit {
        lock_state(&state).clear_expired(Instant::now());
        sync_cursor(&mut app, &state);

        // Pull pending log lines from the tracing layer before rendering.
        if let Some(ref log_buf) = config.log_buffer {
            log_buf.flush_into(&mut app.logs);
        }

        terminal.draw(|frame| {
            render(frame, &state, &app, &config.base_url, tick);
        })?;
        tick = tick.wrapping_add(1);

        if event::poll(config.tick_rate)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            handle_key_event(key, &mut app, &state, &commands);
        }
    }

    // Restore terminal.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;
    terminal.show_cursor()?;
    Ok(())
}
