//! Command/result layer between the API and the shared state.
//!
//! Every write follows the same shape: mark the state busy, issue the
//! request, and only on a confirmed success apply a pure merge from
//! [`EditorState`]. Failures leave the collections exactly as they were and
//! surface as a status message plus the returned [`EditorError`].
//!
//! The state lock is only taken between awaits, never across one.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::EditorApi;
use crate::error::EditorError;
use crate::model::{InventoryEntry, NewNpc, NpcUpdate};
use crate::state::{EditorState, SharedState, StatusKind, with_state};

/// A request a front end can queue for the session worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditorCommand {
    Reload,
    SavePrompt { key: String, text: String },
    Rename { npc_id: String, name: String },
    SetInventory { npc_id: String, inventory: Vec<InventoryEntry> },
    Create(NewNpc),
}

impl EditorCommand {
    fn label(&self) -> &'static str {
        match self {
            EditorCommand::Reload => "reload",
            EditorCommand::SavePrompt { .. } => "save_prompt",
            EditorCommand::Rename { .. } => "rename",
            EditorCommand::SetInventory { .. } => "set_inventory",
            EditorCommand::Create(_) => "create",
        }
    }
}

/// Owns an API handle and drives the shared [`EditorState`].
pub struct EditorSession<A> {
    api: A,
    state: SharedState,
    status_ttl: Duration,
}

impl<A: EditorApi> EditorSession<A> {
    pub fn new(api: A, state: SharedState) -> Self {
        Self {
            api,
            state,
            status_ttl: Duration::from_secs(3),
        }
    }

    pub fn with_status_ttl(mut self, ttl: Duration) -> Self {
        self.status_ttl = ttl;
        self
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Run a closure against the locked state.
    pub fn read<R>(&self, f: impl FnOnce(&EditorState) -> R) -> R {
        with_state!(self.state, |s| { f(&*s) })
    }

    /// Select an NPC for editing. `false` when the id is not loaded.
    pub fn select(&self, npc_id: &str) -> bool {
        with_state!(self.state, |s| { s.select(npc_id) })
    }

    fn begin(&self) {
        with_state!(self.state, |s| { s.busy = true });
    }

    /// Clear the busy flag and post the outcome. Success text is only shown
    /// when there is some.
    fn finish(&self, result: &Result<(), EditorError>, success: Option<String>) {
        let ttl = self.status_ttl;
        with_state!(self.state, |s| {
            s.busy = false;
            match result {
                Ok(()) => {
                    if let Some(ref text) = success {
                        s.set_status(text.as_str(), StatusKind::Success, ttl);
                    }
                }
                Err(e) => s.set_status(e.user_message(), StatusKind::Error, ttl),
            }
        });
    }

    /// Fetch everything and replace the local collections.
    ///
    /// On failure the previous collections (possibly empty) stay in place.
    pub async fn load(&self) -> Result<(), EditorError> {
        self.begin();
        let result = match self.api.load_all().await {
            Ok(data) => {
                info!(
                    "loaded {} npc(s), {} prompt(s), {} item(s)",
                    data.npcs.len(),
                    data.prompts.len(),
                    data.items.len()
                );
                with_state!(self.state, |s| { s.replace_data(data) });
                Ok(())
            }
            Err(e) => {
                warn!("load failed: {e}");
                Err(e)
            }
        };
        self.finish(&result, None);
        result
    }

    /// Save prompt text. The local cache changes only after the server
    /// confirms.
    pub async fn save_prompt(&self, key: &str, text: &str) -> Result<(), EditorError> {
        self.begin();
        let result = self.api.save_prompt(key, text).await;
        match result {
            Ok(()) => {
                debug!("prompt {key} saved ({} chars)", text.chars().count());
                with_state!(self.state, |s| { s.apply_prompt_saved(key, text) });
            }
            Err(ref e) => warn!("saving prompt {key} failed: {e}"),
        }
        self.finish(&result, Some(format!("Saved prompt {key}")));
        result
    }

    /// Send a partial update and shallow-merge it on success.
    pub async fn update_npc(&self, npc_id: &str, updates: &NpcUpdate) -> Result<(), EditorError> {
        if updates.is_empty() {
            return Ok(());
        }
        self.begin();
        let result = self.api.update_npc(npc_id, updates).await;
        match result {
            Ok(()) => {
                let known = with_state!(self.state, |s| { s.apply_npc_updated(npc_id, updates) });
                if !known {
                    debug!("update for {npc_id} confirmed but NPC is not loaded locally");
                }
            }
            Err(ref e) => warn!("updating {npc_id} failed: {e}"),
        }
        self.finish(&result, Some(format!("Updated {npc_id}")));
        result
    }

    pub async fn rename(&self, npc_id: &str, name: &str) -> Result<(), EditorError> {
        self.update_npc(npc_id, &NpcUpdate::name(name)).await
    }

    pub async fn set_inventory(
        &self,
        npc_id: &str,
        inventory: Vec<InventoryEntry>,
    ) -> Result<(), EditorError> {
        self.update_npc(npc_id, &NpcUpdate::inventory(inventory))
            .await
    }

    /// Create an NPC, then reload everything and select it.
    ///
    /// Once the server confirms the create this returns `Ok`, even when the
    /// follow-up reload fails; the status line then says so.
    pub async fn create_npc(&self, npc: &NewNpc) -> Result<(), EditorError> {
        self.begin();
        let created = self.api.create_npc(npc).await;
        if let Err(ref e) = created {
            warn!("creating {} failed: {e}", npc.npc_id);
            self.finish(&created, None);
            return created;
        }
        info!("created npc {}", npc.npc_id);

        let (text, kind) = match self.load().await {
            Ok(()) => {
                with_state!(self.state, |s| {
                    if !s.select(&npc.npc_id) {
                        warn!("created npc {} missing from reload", npc.npc_id);
                    }
                });
                (format!("Created {}", npc.npc_id), StatusKind::Success)
            }
            Err(e) => {
                warn!("created npc {} but reload failed: {e}", npc.npc_id);
                let text = format!("Created {}, reload failed: {}", npc.npc_id, e.user_message());
                (text, StatusKind::Info)
            }
        };
        let ttl = self.status_ttl;
        with_state!(self.state, |s| {
            s.busy = false;
            s.set_status(text, kind, ttl);
        });
        Ok(())
    }

    /// Execute one queued command. Errors are already reported on the status
    /// line, so they are only logged here.
    pub async fn execute(&self, command: EditorCommand) {
        let label = command.label();
        let result = match command {
            EditorCommand::Reload => self.load().await,
            EditorCommand::SavePrompt { key, text } => self.save_prompt(&key, &text).await,
            EditorCommand::Rename { npc_id, name } => self.rename(&npc_id, &name).await,
            EditorCommand::SetInventory { npc_id, inventory } => {
                self.set_inventory(&npc_id, inventory).await
            }
            EditorCommand::Create(npc) => self.create_npc(&npc).await,
        };
        if let Err(e) = result {
            debug!("command {label} finished with error: {e}");
        }
    }

    /// Process commands until every sender is dropped.
    pub async fn run(self, mut rx: mpsc::Receiver<EditorCommand>) {
        while let Some(command) = rx.recv().await {
            self.execute(command).await;
        }
        debug!("command channel closed; session worker exiting");
    }
}
