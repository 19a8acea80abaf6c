//! Editor core for game NPC configuration: names, stat-gated dialogue
//! prompts and starting inventories, managed through an external content
//! API.
//!
//! The API server owns persistence. This crate owns the parts with actual
//! rules in them:
//!
//! - **Prompt-key resolution** ([`resolver`]): turns an NPC record in any of
//!   its three historical prompt shapes into an ordered list of
//!   `(stat, tier, key)` bindings.
//! - **Prompt statistics** ([`stats`]): character, line and rough token counts.
//! - **Editor state** ([`state`]): the owned NPC / prompt / item mappings,
//!   selection, busy flag and transient status line.
//! - **Session** ([`session`]): issues API requests and applies a merge to the
//!   state only after the server confirms.
//!
//! # Getting started
//!
//! ```ignore
//! use npc_editor::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), EditorError> {
//!     let config = EditorConfig::from_env()?;
//!     let client = EditorClient::from_config(&config)?;
//!     let session = EditorSession::new(client, EditorState::new().shared());
//!
//!     session.load().await?;
//!     session.select("innkeeper");
//!     for binding in session.read(|s| s.selected_bindings()) {
//!         println!("{} {} -> {}", binding.stat, binding.tier, binding.key);
//!     }
//!     session.save_prompt("innkeeper_good", "Welcome back, friend!").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`model`] | Wire types: [`Tier`](model::Tier), [`NpcRecord`](model::NpcRecord), [`EditorData`](model::EditorData), update bodies |
//! | [`resolver`] | [`resolve`](resolver::resolve), [`has_tiers`](resolver::has_tiers) |
//! | [`inventory`] | Pure edits on an inventory list: add, remove, set quantity |
//! | [`stats`] | [`PromptStats`](stats::PromptStats) |
//! | [`state`] | [`EditorState`](state::EditorState), filtering, confirmed-write merges, status line |
//! | [`session`] | [`EditorSession`](session::EditorSession), [`EditorCommand`](session::EditorCommand) |
//! | [`api`] | [`EditorApi`](api::EditorApi) trait and the reqwest [`EditorClient`](api::EditorClient) |
//! | [`config`] | [`EditorConfig`](config::EditorConfig) with `NPC_EDITOR_*` overrides |
//! | [`ui`] | Log capture for terminal front ends |

pub mod api;
pub mod config;
pub mod error;
pub mod inventory;
pub mod model;
pub mod prelude;
pub mod resolver;
pub mod session;
pub mod state;
pub mod stats;
pub mod ui;

pub use config::DEFAULT_BASE_URL;
pub use error::EditorError;
