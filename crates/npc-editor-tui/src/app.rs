//! TUI-local state (not shared with the session).

use npc_editor::prelude::LogLine;

/// Input mode for the TUI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum InputMode {
    /// Arrow keys move the focused cursor, single-key shortcuts act.
    Normal,
    /// Typing narrows the NPC list.
    Filter,
    /// Multi-line prompt editor. Ctrl+S saves, Esc discards.
    EditPrompt,
    /// Single-line name editor for the selected NPC.
    Rename,
    /// Item picker: typing filters the catalog, Enter adds.
    AddItem,
    /// `<id> <name>` for a new NPC; Tab toggles tiered prompts.
    Create,
}

/// Which pane receives cursor keys in normal mode (cycled with Tab).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Focus {
    NpcList,
    Prompts,
    Inventory,
    Log,
}

impl Focus {
    pub(crate) fn next(self, show_logs: bool) -> Self {
        match self {
            Focus::NpcList => Focus::Prompts,
            Focus::Prompts => Focus::Inventory,
            Focus::Inventory if show_logs => Focus::Log,
            Focus::Inventory | Focus::Log => Focus::NpcList,
        }
    }
}

pub(crate) struct App {
    pub(crate) input_mode: InputMode,
    pub(crate) input_buffer: String,
    pub(crate) focus: Focus,
    /// NPC list query (case-insensitive, id or name).
    pub(crate) filter: String,
    pub(crate) list_cursor: usize,
    pub(crate) binding_cursor: usize,
    pub(crate) inventory_cursor: usize,
    /// Cursor in the filtered catalog while in add-item mode.
    pub(crate) item_cursor: usize,
    /// Prompt key being edited in prompt-edit mode.
    pub(crate) editing_key: Option<String>,
    pub(crate) create_tiered: bool,
    pub(crate) show_logs: bool,
    /// Offset from the bottom of the log (0 = follow tail).
    pub(crate) log_scroll: usize,
    pub(crate) logs: Vec<LogLine>,
    /// Local hint shown in the input bar (validation, queue full).
    pub(crate) hint: Option<String>,
    pub(crate) should_quit: bool,
}

impl App {
    pub(crate) fn new() -> Self {
        Self {
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            focus: Focus::NpcList,
            filter: String::new(),
            list_cursor: 0,
            binding_cursor: 0,
            inventory_cursor: 0,
            item_cursor: 0,
            editing_key: None,
            create_tiered: false,
            show_logs: false,
            log_scroll: 0,
            logs: Vec::new(),
            hint: None,
            should_quit: false,
        }
    }

    /// Leave any text mode and drop its buffer and hint.
    pub(crate) fn back_to_normal(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
        self.editing_key = None;
        self.hint = None;
    }
}
