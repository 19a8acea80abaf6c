//! In-memory editor state.
//!
//! [`EditorState`] owns the NPC, prompt and item mappings plus the UI-facing
//! bits (selection, busy flag, status line). It contains no I/O: the
//! [`session`](crate::session) issues requests and calls the `apply_*`
//! methods here only once the server has confirmed a write.
//!
//! ```text
//! EditorSession ──writes──▶ Arc<Mutex<EditorState>> ◀──reads── front end
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::model::{EditorData, Item, NpcRecord, NpcUpdate, PromptBinding};
use crate::resolver::{bindings_are_tiered, resolve};

/// State shared between a session and a front end.
pub type SharedState = Arc<Mutex<EditorState>>;

// ── Status line ────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// A transient message. Each message carries its own expiry, so a newer
/// message is never cut short by an older one's timer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
    pub expires_at: Instant,
}

impl StatusMessage {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

// ── NPC list rows ──────────────────────────────────────────────────

/// One row of the NPC list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NpcSummary {
    pub id: String,
    pub name: String,
    /// Badge value: number of resolved prompt bindings.
    pub binding_count: usize,
    pub tiered: bool,
}

// ── EditorState ────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct EditorState {
    pub npcs: BTreeMap<String, NpcRecord>,
    pub prompts: BTreeMap<String, String>,
    pub items: BTreeMap<String, Item>,
    /// Id of the NPC being edited.
    pub selected: Option<String>,
    /// A request is outstanding; front ends disable the triggering control.
    pub busy: bool,
    /// At least one load has succeeded.
    pub loaded: bool,
    status: Option<StatusMessage>,
}

impl EditorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap in the shared handle used by sessions and front ends.
    pub fn shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    /// Replace every collection with a fresh load. A selection that no
    /// longer exists is cleared.
    pub fn replace_data(&mut self, data: EditorData) {
        self.npcs = data.npcs;
        self.prompts = data.prompts;
        self.items = data.items;
        self.loaded = true;
        if self
            .selected
            .as_ref()
            .is_some_and(|id| !self.npcs.contains_key(id))
        {
            self.selected = None;
        }
    }

    // ── Selection ──

    /// Select an NPC by id. Returns `false` (and keeps the old selection)
    /// when the id is unknown.
    pub fn select(&mut self, id: &str) -> bool {
        if self.npcs.contains_key(id) {
            self.selected = Some(id.to_string());
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn npc(&self, id: &str) -> Option<&NpcRecord> {
        self.npcs.get(id)
    }

    pub fn selected_npc(&self) -> Option<&NpcRecord> {
        self.selected.as_deref().and_then(|id| self.npcs.get(id))
    }

    /// Bindings of the selected NPC; empty when nothing is selected.
    pub fn selected_bindings(&self) -> Vec<PromptBinding> {
        resolve(self.selected_npc())
    }

    // ── Lookups ──

    pub fn prompt_text(&self, key: &str) -> Option<&str> {
        self.prompts.get(key).map(String::as_str)
    }

    pub fn item_name<'a>(&'a self, item_id: &'a str) -> &'a str {
        self.items
            .get(item_id)
            .and_then(|i| i.name.as_deref())
            .unwrap_or(item_id)
    }

    /// NPC rows whose id or name contains `query` (case-insensitive),
    /// sorted by id. An empty query matches everything.
    pub fn filter_npcs(&self, query: &str) -> Vec<NpcSummary> {
        let needle = query.trim().to_lowercase();
        self.npcs
            .iter()
            .filter(|(id, npc)| {
                needle.is_empty()
                    || id.to_lowercase().contains(&needle)
                    || npc
                        .name
                        .as_deref()
                        .is_some_and(|n| n.to_lowercase().contains(&needle))
            })
            .map(|(id, npc)| {
                let bindings = resolve(Some(npc));
                NpcSummary {
                    id: id.clone(),
                    name: npc.display_name(id).to_string(),
                    binding_count: bindings.len(),
                    tiered: bindings_are_tiered(&bindings),
                }
            })
            .collect()
    }

    /// Catalog entries whose id or name contains `query` (case-insensitive).
    pub fn filter_items(&self, query: &str) -> Vec<(&str, &Item)> {
        let needle = query.trim().to_lowercase();
        self.items
            .iter()
            .filter(|(id, item)| {
                needle.is_empty()
                    || id.to_lowercase().contains(&needle)
                    || item
                        .name
                        .as_deref()
                        .is_some_and(|n| n.to_lowercase().contains(&needle))
            })
            .map(|(id, item)| (id.as_str(), item))
            .collect()
    }

    /// Ids of every NPC whose bindings point at `key`. More than one entry
    /// means editing the text changes all of them.
    pub fn key_aliases(&self, key: &str) -> Vec<String> {
        self.npcs
            .iter()
            .filter(|(_, npc)| resolve(Some(npc)).iter().any(|b| b.key == key))
            .map(|(id, _)| id.clone())
            .collect()
    }

    // ── Confirmed writes ──

    /// Record prompt text the server has accepted.
    pub fn apply_prompt_saved(&mut self, key: &str, text: &str) {
        self.prompts.insert(key.to_string(), text.to_string());
    }

    /// Shallow-merge an accepted update. Returns `false` for an unknown id.
    pub fn apply_npc_updated(&mut self, id: &str, update: &NpcUpdate) -> bool {
        match self.npcs.get_mut(id) {
            Some(npc) => {
                update.apply_to(npc);
                true
            }
            None => false,
        }
    }

    // ── Status line ──

    /// Show a message for `ttl`, replacing whatever was shown before.
    pub fn set_status(&mut self, text: impl Into<String>, kind: StatusKind, ttl: Duration) {
        self.set_status_at(text, kind, ttl, Instant::now());
    }

    pub fn set_status_at(
        &mut self,
        text: impl Into<String>,
        kind: StatusKind,
        ttl: Duration,
        now: Instant,
    ) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
            expires_at: now + ttl,
        });
    }

    /// The status message, if it has not expired yet.
    pub fn current_status(&self, now: Instant) -> Option<&StatusMessage> {
        self.status.as_ref().filter(|s| !s.is_expired(now))
    }

    /// Drop an expired status message.
    pub fn clear_expired(&mut self, now: Instant) {
        if self.status.as_ref().is_some_and(|s| s.is_expired(now)) {
            self.status = None;
        }
    }
}

// ── Convenience updaters ───────────────────────────────────────────

/// Lock the shared state and run a closure on the guard.
/// Poisoned locks are recovered; the state holds plain data.
macro_rules! with_state {
    ($state:expr, |$s:ident| $body:block) => {{
        #[allow(unused_mut)]
        let mut $s = $state.lock().unwrap_or_else(|e| e.into_inner());
        $body
    }};
}
pub(crate) use with_state;

/// Lock the shared state from outside the crate, recovering a poisoned lock.
pub fn lock_state(state: &SharedState) -> MutexGuard<'_, EditorState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Set or clear the busy flag.
pub fn set_busy(state: &SharedState, busy: bool) {
    with_state!(state, |s| { s.busy = busy });
}

/// Post a status message on the shared state.
pub fn post_status(state: &SharedState, text: &str, kind: StatusKind, ttl: Duration) {
    with_state!(state, |s| { s.set_status(text, kind, ttl) });
}
