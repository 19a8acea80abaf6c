//! Convenience re-exports for common `npc-editor` types.
//!
//! Meant to be glob-imported by front ends:
//!
//! ```ignore
//! use npc_editor::prelude::*;
//! ```

// ── Data model ──────────────────────────────────────────────────────
pub use crate::model::{
    EditorData, InventoryEntry, Item, NewNpc, NpcRecord, NpcUpdate, PromptBinding, PromptType,
    Stat, Tier, TierMap,
};

// ── Pure logic ──────────────────────────────────────────────────────
pub use crate::resolver::{binding_count, has_tiers, resolve};
pub use crate::inventory::{with_added, with_quantity, without};
pub use crate::stats::PromptStats;

// ── State and session ───────────────────────────────────────────────
pub use crate::session::{EditorCommand, EditorSession};
pub use crate::state::{
    EditorState, NpcSummary, SharedState, StatusKind, StatusMessage, lock_state, post_status,
    set_busy,
};

// ── API and configuration ───────────────────────────────────────────
pub use crate::api::{EditorApi, EditorClient};
pub use crate::config::EditorConfig;
pub use crate::error::EditorError;

// ── Logging ─────────────────────────────────────────────────────────
pub use crate::ui::tracing::{LogBuffer, UiTracingLayer};
pub use crate::ui::{LogLevel, LogLine};
