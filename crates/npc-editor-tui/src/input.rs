//! Key handling. Edits are never applied here: they become
//! [`EditorCommand`]s for the session worker, which updates the shared state
//! once the server confirms.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use npc_editor::prelude::*;
use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::app::{App, Focus, InputMode};

pub(crate) fn handle_key_event(
    key: KeyEvent,
    app: &mut App,
    state: &SharedState,
    commands: &mpsc::Sender<EditorCommand>,
) {
    // Ctrl+C always quits.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_key(key, app, state, commands),
        InputMode::Filter => handle_filter_key(key, app, state),
        InputMode::EditPrompt => handle_edit_prompt_key(key, app, state, commands),
        InputMode::Rename => handle_rename_key(key, app, state, commands),
        InputMode::AddItem => handle_add_item_key(key, app, state, commands),
        InputMode::Create => handle_create_key(key, app, state, commands),
    }
}

/// Keep the list cursor on the selected NPC, and select the row under the
/// cursor when nothing is selected.
pub(crate) fn sync_cursor(app: &mut App, state: &SharedState) {
    let mut s = lock_state(state);
    let rows = s.filter_npcs(&app.filter);
    if rows.is_empty() {
        app.list_cursor = 0;
        return;
    }
    let selected_row = s
        .selected
        .as_deref()
        .and_then(|id| rows.iter().position(|r| r.id == id));
    match selected_row {
        Some(i) => app.list_cursor = i,
        None => {
            app.list_cursor = app.list_cursor.min(rows.len() - 1);
            s.select(&rows[app.list_cursor].id);
            app.binding_cursor = 0;
            app.inventory_cursor = 0;
        }
    }
}

/// Queue a command unless a request is already outstanding.
fn submit(
    app: &mut App,
    state: &SharedState,
    commands: &mpsc::Sender<EditorCommand>,
    command: EditorCommand,
) -> bool {
    if lock_state(state).busy {
        app.hint = Some("Busy: wait for the current request to finish".into());
        return false;
    }
    trace!("queueing {command:?}");
    match commands.try_send(command) {
        Ok(()) => {
            app.hint = None;
            true
        }
        Err(mpsc::error::TrySendError::Full(_)) => {
            app.hint = Some("Command queue is full".into());
            false
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            warn!("command channel closed; edit not sent");
            app.hint = Some("Editor session has stopped".into());
            false
        }
    }
}

fn step(cursor: usize, len: usize, down: bool) -> usize {
    if len == 0 {
        0
    } else if down {
        (cursor + 1).min(len - 1)
    } else {
        cursor.saturating_sub(1)
    }
}

fn move_cursor(app: &mut App, state: &SharedState, down: bool) {
    match app.focus {
        Focus::NpcList => {
            let mut s = lock_state(state);
            let rows = s.filter_npcs(&app.filter);
            let next = step(app.list_cursor, rows.len(), down);
            if let Some(row) = rows.get(next)
                && next != app.list_cursor
            {
                s.select(&row.id);
                app.list_cursor = next;
                app.binding_cursor = 0;
                app.inventory_cursor = 0;
            }
        }
        Focus::Prompts => {
            let len = lock_state(state).selected_bindings().len();
            app.binding_cursor = step(app.binding_cursor, len, down);
        }
        Focus::Inventory => {
            let len = lock_state(state)
                .selected_npc()
                .map_or(0, |n| n.inventory().len());
            app.inventory_cursor = step(app.inventory_cursor, len, down);
        }
        Focus::Log => {
            app.log_scroll = if down {
                app.log_scroll.saturating_sub(3)
            } else {
                app.log_scroll.saturating_add(3)
            };
        }
    }
}

/// Selected NPC id with its current inventory.
fn selected_inventory(state: &SharedState) -> Option<(String, Vec<InventoryEntry>)> {
    let s = lock_state(state);
    let id = s.selected.clone()?;
    let inventory = s.npc(&id)?.inventory().to_vec();
    Some((id, inventory))
}

fn handle_normal_key(
    key: KeyEvent,
    app: &mut App,
    state: &SharedState,
    commands: &mpsc::Sender<EditorCommand>,
) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char(',') => {
            app.show_logs = !app.show_logs;
            if !app.show_logs && app.focus == Focus::Log {
                app.focus = Focus::NpcList;
            }
        }
        KeyCode::Tab => app.focus = app.focus.next(app.show_logs),
        KeyCode::Up | KeyCode::Char('k') => move_cursor(app, state, false),
        KeyCode::Down | KeyCode::Char('j') => move_cursor(app, state, true),
        KeyCode::PageUp => app.log_scroll = app.log_scroll.saturating_add(20),
        KeyCode::PageDown => app.log_scroll = app.log_scroll.saturating_sub(20),
        KeyCode::End => app.log_scroll = 0,
        KeyCode::Char('/') => {
            app.input_mode = InputMode::Filter;
            app.input_buffer = app.filter.clone();
        }
        KeyCode::Char('R') | KeyCode::F(5) => {
            submit(app, state, commands, EditorCommand::Reload);
        }
        KeyCode::Enter | KeyCode::Char('e') => {
            let target = {
                let s = lock_state(state);
                s.selected_bindings().get(app.binding_cursor).map(|b| {
                    let text = s.prompt_text(&b.key).unwrap_or_default().to_string();
                    (b.key.clone(), text)
                })
            };
            match target {
                Some((key, text)) => {
                    app.editing_key = Some(key);
                    app.input_buffer = text;
                    app.input_mode = InputMode::EditPrompt;
                    app.hint = None;
                }
                None => app.hint = Some("No prompt to edit".into()),
            }
        }
        KeyCode::Char('r') => {
            let name = {
                let s = lock_state(state);
                s.selected
                    .as_deref()
                    .and_then(|id| s.npc(id).map(|n| n.display_name(id).to_string()))
            };
            if let Some(name) = name {
                app.input_buffer = name;
                app.input_mode = InputMode::Rename;
            }
        }
        KeyCode::Char('a') => {
            if lock_state(state).selected.is_some() {
                app.input_buffer.clear();
                app.item_cursor = 0;
                app.input_mode = InputMode::AddItem;
            }
        }
        KeyCode::Char('d') | KeyCode::Delete if app.focus == Focus::Inventory => {
            if let Some((npc_id, inventory)) = selected_inventory(state)
                && app.inventory_cursor < inventory.len()
            {
                let inventory = with_quantity(&inventory, app.inventory_cursor, 0);
                app.inventory_cursor = app.inventory_cursor.min(inventory.len().saturating_sub(1));
                submit(
                    app,
                    state,
                    commands,
                    EditorCommand::SetInventory { npc_id, inventory },
                );
            }
        }
        KeyCode::Char(c @ ('+' | '-')) if app.focus == Focus::Inventory => {
            if let Some((npc_id, inventory)) = selected_inventory(state)
                && let Some(entry) = inventory.get(app.inventory_cursor)
                && entry.is_recognized()
            {
                let quantity = if c == '+' {
                    entry.quantity.saturating_add(1)
                } else {
                    entry.quantity.saturating_sub(1)
                };
                let inventory = with_quantity(&inventory, app.inventory_cursor, quantity);
                submit(
                    app,
                    state,
                    commands,
                    EditorCommand::SetInventory { npc_id, inventory },
                );
            }
        }
        KeyCode::Char('n') => {
            app.input_buffer.clear();
            app.create_tiered = false;
            app.input_mode = InputMode::Create;
        }
        _ => {}
    }
}

fn handle_filter_key(key: KeyEvent, app: &mut App, state: &SharedState) {
    match key.code {
        KeyCode::Enter => app.back_to_normal(),
        KeyCode::Esc => {
            app.filter.clear();
            app.back_to_normal();
        }
        KeyCode::Backspace => {
            app.input_buffer.pop();
            app.filter = app.input_buffer.clone();
        }
        KeyCode::Char(c) => {
            app.input_buffer.push(c);
            app.filter = app.input_buffer.clone();
        }
        _ => return,
    }
    app.list_cursor = 0;
    sync_cursor(app, state);
}

fn handle_edit_prompt_key(
    key: KeyEvent,
    app: &mut App,
    state: &SharedState,
    commands: &mpsc::Sender<EditorCommand>,
) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('s')
            && let Some(key) = app.editing_key.clone()
        {
            let text = app.input_buffer.clone();
            if submit(app, state, commands, EditorCommand::SavePrompt { key, text }) {
                app.back_to_normal();
            }
        }
        return;
    }
    match key.code {
        KeyCode::Esc => {
            app.back_to_normal();
            app.hint = Some("Edit discarded".into());
        }
        KeyCode::Enter => app.input_buffer.push('\n'),
        KeyCode::Tab => app.input_buffer.push('\t'),
        KeyCode::Backspace => {
            app.input_buffer.pop();
        }
        KeyCode::Char(c) => app.input_buffer.push(c),
        _ => {}
    }
}

fn handle_rename_key(
    key: KeyEvent,
    app: &mut App,
    state: &SharedState,
    commands: &mpsc::Sender<EditorCommand>,
) {
    match key.code {
        KeyCode::Esc => app.back_to_normal(),
        KeyCode::Enter => {
            let name = app.input_buffer.trim().to_string();
            if name.is_empty() {
                app.hint = Some("Name cannot be empty".into());
                return;
            }
            let Some(npc_id) = lock_state(state).selected.clone() else {
                app.back_to_normal();
                return;
            };
            if submit(app, state, commands, EditorCommand::Rename { npc_id, name }) {
                app.back_to_normal();
            }
        }
        KeyCode::Backspace => {
            app.input_buffer.pop();
        }
        KeyCode::Char(c) => app.input_buffer.push(c),
        _ => {}
    }
}

fn handle_add_item_key(
    key: KeyEvent,
    app: &mut App,
    state: &SharedState,
    commands: &mpsc::Sender<EditorCommand>,
) {
    match key.code {
        KeyCode::Esc => app.back_to_normal(),
        KeyCode::Up => app.item_cursor = app.item_cursor.saturating_sub(1),
        KeyCode::Down => {
            let len = lock_state(state).filter_items(&app.input_buffer).len();
            app.item_cursor = step(app.item_cursor, len, true);
        }
        KeyCode::Enter => {
            let item_id = lock_state(state)
                .filter_items(&app.input_buffer)
                .get(app.item_cursor)
                .map(|(id, _)| id.to_string());
            let (Some(item_id), Some((npc_id, inventory))) = (item_id, selected_inventory(state))
            else {
                app.hint = Some("No matching item".into());
                return;
            };
            let inventory = with_added(&inventory, &item_id, 1);
            if submit(
                app,
                state,
                commands,
                EditorCommand::SetInventory { npc_id, inventory },
            ) {
                app.back_to_normal();
            }
        }
        KeyCode::Backspace => {
            app.input_buffer.pop();
            app.item_cursor = 0;
        }
        KeyCode::Char(c) => {
            app.input_buffer.push(c);
            app.item_cursor = 0;
        }
        _ => {}
    }
}

/// Parse `<id> <name>`. The id is one word; the name is the rest.
pub(crate) fn parse_create_input(input: &str) -> Result<(String, String), &'static str> {
    let input = input.trim();
    let (id, name) = input.split_once(char::is_whitespace).unwrap_or((input, ""));
    let name = name.trim();
    if id.is_empty() {
        return Err("Enter an id and a name");
    }
    if name.is_empty() {
        return Err("Enter a name after the id");
    }
    Ok((id.to_string(), name.to_string()))
}

fn handle_create_key(
    key: KeyEvent,
    app: &mut App,
    state: &SharedState,
    commands: &mpsc::Sender<EditorCommand>,
) {
    match key.code {
        KeyCode::Esc => app.back_to_normal(),
        KeyCode::Tab => app.create_tiered = !app.create_tiered,
        KeyCode::Enter => {
            let (npc_id, name) = match parse_create_input(&app.input_buffer) {
                Ok(parsed) => parsed,
                Err(msg) => {
                    app.hint = Some(msg.into());
                    return;
                }
            };
            if lock_state(state).npcs.contains_key(&npc_id) {
                app.hint = Some(format!("NPC '{npc_id}' already exists"));
                return;
            }
            let prompt_type = if app.create_tiered {
                PromptType::Tiered
            } else {
                PromptType::Single
            };
            let command = EditorCommand::Create(NewNpc {
                npc_id,
                name,
                prompt_type,
            });
            if submit(app, state, commands, command) {
                app.filter.clear();
                app.back_to_normal();
            }
        }
        KeyCode::Backspace => {
            app.input_buffer.pop();
        }
        KeyCode::Char(c) => app.input_buffer.push(c),
        _ => {}
    }
}
