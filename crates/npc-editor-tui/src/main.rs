//! Terminal editor for NPC prompts, names and inventories.
//!
//! Reads the API location from `NPC_EDITOR_URL` unless `--base-url` is given.
//!
//! ```sh
//! npc-editor-tui --base-url http://localhost:3000/api/editor
//! ```

use std::time::Duration;

use clap::Parser;
use npc_editor::prelude::*;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Terminal editor for NPC prompts, names and inventories.
#[derive(Parser)]
#[command(name = "npc-editor-tui", version)]
struct Cli {
    /// Editor API base URL (overrides NPC_EDITOR_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Request timeout in seconds (overrides NPC_EDITOR_TIMEOUT_SECS)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Also show debug-level lines in the log pane
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match EditorConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Some(url) = cli.base_url {
        config = config.with_base_url(url);
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }

    let client = match EditorClient::from_config(&config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    // Set up tracing → TUI log buffer.
    let min_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let (tracing_layer, log_buffer) = UiTracingLayer::with_min_level(min_level);
    tracing_subscriber::registry().with(tracing_layer).init();

    // State shared between the session worker and the TUI.
    let state = EditorState::new().shared();
    let (tx, rx) = tokio::sync::mpsc::channel(32);
    let session = EditorSession::new(client, state.clone()).with_status_ttl(config.status_ttl);
    let worker = tokio::spawn(session.run(rx));

    if tx.send(EditorCommand::Reload).await.is_err() {
        eprintln!("Error: editor session stopped before the first load");
        std::process::exit(1);
    }

    // Spawn TUI on a dedicated thread.
    let tui_config = npc_editor_tui::TuiConfig {
        base_url: config.base_url.clone(),
        log_buffer: Some(log_buffer),
        ..Default::default()
    };
    let tui_handle = npc_editor_tui::spawn_tui(state, tx, tui_config);

    // Wait for TUI to exit; its sender drops with it and the worker drains.
    let _ = tokio::task::spawn_blocking(move || tui_handle.join()).await;
    let _ = worker.await;
}
