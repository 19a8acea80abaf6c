//! Rendering for the editor TUI.

use std::time::Instant;

use npc_editor::prelude::*;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::app::{App, Focus, InputMode};

// ── Public Utilities ──────────────────────────────────────────────────

/// Truncate to at most `max` characters, appending "..." if truncated.
pub fn truncate_str(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

/// Map a log level to a ratatui [`Style`].
pub fn log_level_style(level: LogLevel) -> Style {
    match level {
        LogLevel::Trace => Style::default().fg(Color::DarkGray),
        LogLevel::Debug => Style::default().fg(Color::Cyan),
        LogLevel::Info => Style::default().fg(Color::Green),
        LogLevel::Warn => Style::default().fg(Color::Yellow),
        LogLevel::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

/// Colour for a status message kind.
pub fn status_style(kind: StatusKind) -> Style {
    match kind {
        StatusKind::Info => Style::default().fg(Color::Cyan),
        StatusKind::Success => Style::default().fg(Color::Green),
        StatusKind::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

/// Spinner frame for the busy indicator.
pub fn spinner(tick: u64) -> char {
    const FRAMES: [char; 4] = ['|', '/', '-', '\\'];
    FRAMES[(tick % FRAMES.len() as u64) as usize]
}

// ── Snapshot ──────────────────────────────────────────────────────────

/// One resolved prompt binding with what the detail pane shows about it.
struct BindingRow {
    binding: PromptBinding,
    stats: PromptStats,
    missing: bool,
    /// Other NPC ids bound to the same key.
    shared_with: Vec<String>,
}

struct InventoryRow {
    item_id: String,
    name: String,
    /// `None` for an entry in a shape the editor does not read.
    quantity: Option<u32>,
    in_catalog: bool,
}

struct DetailSnapshot {
    id: String,
    name: String,
    model: Option<String>,
    portrait: Option<String>,
    friendly: Option<f64>,
    bindings: Vec<BindingRow>,
    inventory: Vec<InventoryRow>,
}

/// Everything a frame needs, cloned under the state lock so no widget is
/// built while it is held.
struct RenderSnapshot {
    rows: Vec<NpcSummary>,
    detail: Option<DetailSnapshot>,
    /// Filtered catalog for add-item mode.
    items: Vec<(String, String)>,
    /// NPCs sharing the key open in the prompt editor.
    editing_aliases: Vec<String>,
    busy: bool,
    loaded: bool,
    status: Option<StatusMessage>,
}

fn snapshot(state: &SharedState, app: &App) -> RenderSnapshot {
    let s = lock_state(state);
    let detail = s.selected.as_deref().and_then(|id| {
        let npc = s.npc(id)?;
        let bindings = resolve(Some(npc))
            .into_iter()
            .map(|binding| {
                let text = s.prompt_text(&binding.key);
                let shared_with = s
                    .key_aliases(&binding.key)
                    .into_iter()
                    .filter(|other| other != id)
                    .collect();
                BindingRow {
                    stats: PromptStats::of(text),
                    missing: text.is_none(),
                    shared_with,
                    binding,
                }
            })
            .collect();
        let inventory = npc
            .inventory()
            .iter()
            .map(|e| match e.raw {
                Some(ref raw) => InventoryRow {
                    item_id: String::new(),
                    name: raw.to_string(),
                    quantity: None,
                    in_catalog: true,
                },
                None => InventoryRow {
                    item_id: e.item_id.clone(),
                    name: s.item_name(&e.item_id).to_string(),
                    quantity: Some(e.quantity),
                    in_catalog: s.items.contains_key(&e.item_id),
                },
            })
            .collect();
        Some(DetailSnapshot {
            id: id.to_string(),
            name: npc.display_name(id).to_string(),
            model: npc.model_text(),
            portrait: npc.portrait_text(),
            friendly: npc.stat(Stat::Friendly.as_str()),
            bindings,
            inventory,
        })
    });
    let items = if app.input_mode == InputMode::AddItem {
        s.filter_items(&app.input_buffer)
            .into_iter()
            .map(|(id, item)| (id.to_string(), item.name.clone().unwrap_or_default()))
            .collect()
    } else {
        Vec::new()
    };
    let editing_aliases = app
        .editing_key
        .as_deref()
        .map(|k| s.key_aliases(k))
        .unwrap_or_default();
    RenderSnapshot {
        rows: s.filter_npcs(&app.filter),
        detail,
        items,
        editing_aliases,
        busy: s.busy,
        loaded: s.loaded,
        status: s.current_status(Instant::now()).cloned(),
    }
    // lock released here
}

// ── Root Render ───────────────────────────────────────────────────────

pub(crate) fn render(frame: &mut Frame, state: &SharedState, app: &App, base_url: &str, tick: u64) {
    let area = frame.area();
    let snap = snapshot(state, app);

    // Outer layout: [3] header | [flex] body | [flex] logs? | [3] input bar.
    let mut constraints = vec![Constraint::Length(3), Constraint::Min(8)];
    if app.show_logs {
        constraints.push(Constraint::Length(10));
    }
    constraints.push(Constraint::Length(3));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    render_header(frame, chunks[0], &snap, base_url, tick);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(chunks[1]);
    render_npc_list(frame, body[0], &snap, app);
    match app.input_mode {
        InputMode::EditPrompt => render_prompt_editor(frame, body[1], &snap, app),
        InputMode::AddItem => render_item_picker(frame, body[1], &snap, app),
        _ => render_detail(frame, body[1], &snap, app),
    }

    if app.show_logs {
        render_logs(frame, chunks[2], app);
    }
    render_input(frame, chunks[chunks.len() - 1], app);
}

// ── Header ────────────────────────────────────────────────────────────

fn render_header(frame: &mut Frame, area: Rect, snap: &RenderSnapshot, base_url: &str, tick: u64) {
    let mut spans = vec![
        Span::styled("API: ", Style::default().fg(Color::DarkGray)),
        Span::raw(base_url.to_string()),
        Span::raw("   "),
    ];
    if snap.busy {
        spans.push(Span::styled(
            format!("{} working", spinner(tick)),
            Style::default().fg(Color::Yellow),
        ));
    } else if !snap.loaded {
        spans.push(Span::styled("not loaded", Style::default().fg(Color::Red)));
    } else {
        spans.push(Span::styled(
            format!("{} NPCs", snap.rows.len()),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if let Some(ref status) = snap.status {
        spans.push(Span::raw("   "));
        spans.push(Span::styled(status.text.clone(), status_style(status.kind)));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue))
        .title(" NPC Editor ");
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn pane_block(title: String, focused: bool) -> Block<'static> {
    let border = if focused { Color::Cyan } else { Color::DarkGray };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title)
}

// ── NPC List ──────────────────────────────────────────────────────────

fn render_npc_list(frame: &mut Frame, area: Rect, snap: &RenderSnapshot, app: &App) {
    let width = area.width.saturating_sub(12) as usize;
    let items: Vec<ListItem> = snap
        .rows
        .iter()
        .map(|row| {
            let badge_style = if row.binding_count == 0 {
                Style::default().fg(Color::Red)
            } else if row.tiered {
                Style::default().fg(Color::Magenta)
            } else {
                Style::default().fg(Color::Blue)
            };
            ListItem::new(Line::from(vec![
                Span::raw(truncate_str(&row.name, width)),
                Span::raw(" "),
                Span::styled(format!("[{}]", row.binding_count), badge_style),
            ]))
        })
        .collect();

    let title = if app.filter.is_empty() {
        " NPCs ".to_string()
    } else {
        format!(" NPCs /{} ", app.filter)
    };
    let list = List::new(items)
        .block(pane_block(title, app.focus == Focus::NpcList))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    let mut list_state = ListState::default();
    if !snap.rows.is_empty() {
        list_state.select(Some(app.list_cursor));
    }
    frame.render_stateful_widget(list, area, &mut list_state);
}

// ── Detail Pane ───────────────────────────────────────────────────────

fn render_detail(frame: &mut Frame, area: Rect, snap: &RenderSnapshot, app: &App) {
    let Some(ref d) = snap.detail else {
        let msg = if snap.loaded {
            "Select an NPC, or press [n] to create one."
        } else {
            "Loading..."
        };
        let block = pane_block(" Details ".into(), false);
        frame.render_widget(Paragraph::new(msg).block(block), area);
        return;
    };

    let inventory_height = (d.inventory.len() as u16).clamp(1, 8) + 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(4),
            Constraint::Length(inventory_height),
        ])
        .split(area);

    // Header: name, id and the pass-through fields the editor knows about.
    let dim = Style::default().fg(Color::DarkGray);
    let mut meta = vec![Span::styled("id ", dim), Span::raw(d.id.clone())];
    if let Some(ref model) = d.model {
        meta.push(Span::styled("  model ", dim));
        meta.push(Span::raw(model.clone()));
    }
    if let Some(ref portrait) = d.portrait {
        meta.push(Span::styled("  portrait ", dim));
        meta.push(Span::raw(portrait.clone()));
    }
    let mut second = Vec::new();
    if let Some(value) = d.friendly {
        second.push(Span::styled("friendly ", dim));
        let tier = Tier::for_friendliness(value)
            .map(|t| format!(" ({t})"))
            .unwrap_or_default();
        second.push(Span::raw(format!("{value}{tier}")));
    }
    let header = Paragraph::new(vec![Line::from(meta), Line::from(second)])
        .block(pane_block(format!(" {} ", d.name), false));
    frame.render_widget(header, chunks[0]);

    // Prompt bindings.
    let items: Vec<ListItem> = d
        .bindings
        .iter()
        .map(|row| {
            let mut spans = vec![
                Span::styled(
                    format!("{:<16}", row.binding.tier.label()),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw(row.binding.key.clone()),
            ];
            if row.missing {
                spans.push(Span::styled("  (no text)", Style::default().fg(Color::Red)));
            } else {
                spans.push(Span::styled(format!("  {}", row.stats.summary()), dim));
            }
            let mut lines = vec![Line::from(spans)];
            if !row.shared_with.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("    shared with {}", row.shared_with.join(", ")),
                    Style::default().fg(Color::Yellow),
                )));
            }
            ListItem::new(lines)
        })
        .collect();
    let title = if d.bindings.is_empty() {
        " Prompts: none configured ".to_string()
    } else {
        format!(" Prompts ({}) ", d.bindings.len())
    };
    let list = List::new(items)
        .block(pane_block(title, app.focus == Focus::Prompts))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut list_state = ListState::default();
    if app.focus == Focus::Prompts && !d.bindings.is_empty() {
        list_state.select(Some(app.binding_cursor));
    }
    frame.render_stateful_widget(list, chunks[1], &mut list_state);

    // Inventory.
    let items: Vec<ListItem> = d
        .inventory
        .iter()
        .map(|row| {
            let name_style = if row.in_catalog {
                Style::default()
            } else {
                Style::default().fg(Color::Red)
            };
            let Some(quantity) = row.quantity else {
                return ListItem::new(Line::from(Span::styled(row.name.clone(), dim)));
            };
            ListItem::new(Line::from(vec![
                Span::styled(row.name.clone(), name_style),
                Span::styled(format!(" x{quantity}"), Style::default().fg(Color::Cyan)),
                Span::styled(format!("  {}", row.item_id), dim),
            ]))
        })
        .collect();
    let list = List::new(items)
        .block(pane_block(
            format!(" Inventory ({}) ", d.inventory.len()),
            app.focus == Focus::Inventory,
        ))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut list_state = ListState::default();
    if app.focus == Focus::Inventory && !d.inventory.is_empty() {
        list_state.select(Some(app.inventory_cursor));
    }
    frame.render_stateful_widget(list, chunks[2], &mut list_state);
}

// ── Prompt Editor ─────────────────────────────────────────────────────

fn render_prompt_editor(frame: &mut Frame, area: Rect, snap: &RenderSnapshot, app: &App) {
    let key = app.editing_key.as_deref().unwrap_or_default();
    let stats = PromptStats::of(Some(&app.input_buffer));

    let mut lines: Vec<Line> = Vec::new();
    if snap.editing_aliases.len() > 1 {
        lines.push(Line::from(Span::styled(
            format!("Shared by {}: saving changes all of them.", snap.editing_aliases.join(", ")),
            Style::default().fg(Color::Yellow),
        )));
        lines.push(Line::from(""));
    }
    let mut text_lines: Vec<Line> = app
        .input_buffer
        .split('\n')
        .map(|l| Line::from(l.to_string()))
        .collect();
    if let Some(last) = text_lines.last_mut() {
        last.push_span(Span::styled("\u{2588}", Style::default().fg(Color::Yellow)));
    }
    lines.extend(text_lines);

    // Follow the cursor at the end of the text.
    let inner_height = area.height.saturating_sub(2) as usize;
    let scroll = lines.len().saturating_sub(inner_height);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(format!(" {key} "))
        .title_bottom(Line::from(format!(" {} ", stats.summary())).right_aligned());
    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((scroll as u16, 0))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

// ── Item Picker ───────────────────────────────────────────────────────

fn render_item_picker(frame: &mut Frame, area: Rect, snap: &RenderSnapshot, app: &App) {
    let items: Vec<ListItem> = snap
        .items
        .iter()
        .map(|(id, name)| {
            ListItem::new(Line::from(vec![
                Span::raw(if name.is_empty() { id.clone() } else { name.clone() }),
                Span::styled(format!("  {id}"), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();
    let title = match snap.detail {
        Some(ref d) => format!(" Add item to {} ({} matches) ", d.name, snap.items.len()),
        None => " Add item ".to_string(),
    };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(title),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    let mut list_state = ListState::default();
    if !snap.items.is_empty() {
        list_state.select(Some(app.item_cursor.min(snap.items.len() - 1)));
    }
    frame.render_stateful_widget(list, area, &mut list_state);
}

// ── Log Pane ──────────────────────────────────────────────────────────

fn render_logs(frame: &mut Frame, area: Rect, app: &App) {
    let inner_height = area.height.saturating_sub(2) as usize;

    let lines: Vec<Line> = app
        .logs
        .iter()
        .map(|log| {
            Line::from(vec![
                Span::styled(format!("{} ", log.time), Style::default().fg(Color::DarkGray)),
                Span::styled(format!("{} ", log.level.label()), log_level_style(log.level)),
                Span::raw(log.message.as_str()),
            ])
        })
        .collect();

    let total = lines.len();
    let scroll = total
        .saturating_sub(inner_height)
        .saturating_sub(app.log_scroll);

    let paragraph = Paragraph::new(lines)
        .block(pane_block(" Log ".into(), app.focus == Focus::Log))
        .scroll((scroll as u16, 0))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

// ── Input Bar ─────────────────────────────────────────────────────────

fn render_input(frame: &mut Frame, area: Rect, app: &App) {
    let (title, style) = match app.input_mode {
        InputMode::Normal => {
            let hint = app.hint.clone().unwrap_or_else(|| {
                "[q] quit  [Tab] focus  [/] filter  [e] edit prompt  [r] rename  [a] add item  [n] new  [R] reload  [,] logs"
                    .to_string()
            });
            (format!(" {hint} "), Style::default().fg(Color::DarkGray))
        }
        InputMode::Filter => (
            " Filter NPCs: [Enter] keep  [Esc] clear ".to_string(),
            Style::default().fg(Color::Cyan),
        ),
        InputMode::EditPrompt => (
            " Editing prompt: [Ctrl+S] save  [Esc] discard ".to_string(),
            Style::default().fg(Color::Yellow),
        ),
        InputMode::Rename => (
            " New name: [Enter] save  [Esc] cancel ".to_string(),
            Style::default().fg(Color::Green),
        ),
        InputMode::AddItem => (
            " Search items: [Up/Down] choose  [Enter] add  [Esc] cancel ".to_string(),
            Style::default().fg(Color::Yellow),
        ),
        InputMode::Create => {
            let shape = if app.create_tiered { "tiered" } else { "single" };
            (
                format!(" New NPC <id> <name> ({shape} prompt, [Tab] toggle)  [Enter] create  [Esc] cancel "),
                Style::default().fg(Color::Green),
            )
        }
    };
    // A validation hint overrides the mode title while a text mode is open.
    let title = match (&app.hint, app.input_mode) {
        (Some(hint), mode) if mode != InputMode::Normal => format!(" {hint} "),
        _ => title,
    };

    let input_text = match app.input_mode {
        InputMode::Normal | InputMode::EditPrompt => String::new(),
        _ => format!("> {}\u{2588}", app.input_buffer),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title);
    frame.render_widget(Paragraph::new(input_text).block(block), area);
}

// ── Tests ─────────────────────────────────────────────────────────────
