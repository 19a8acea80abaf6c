//! HTTP client for the editor endpoints.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};

use super::wire::{SavePromptRequest, UpdateNpcRequest, WriteAck};
use crate::config::EditorConfig;
use crate::error::EditorError;
use crate::model::{EditorData, NewNpc, NpcUpdate};

/// Boxed future returned by [`EditorApi`] methods.
pub type ApiFuture<'a, T> = BoxFuture<'a, Result<T, EditorError>>;

/// The four operations the editor needs from the content API.
///
/// [`EditorClient`] is the HTTP implementation; tests implement this trait
/// with canned responses.
pub trait EditorApi: Send + Sync {
    /// `GET /npcs`: every NPC, prompt text and catalog item.
    fn load_all(&self) -> ApiFuture<'_, EditorData>;

    /// `POST /npc/prompt`: replace the text stored under `key`.
    fn save_prompt<'a>(&'a self, key: &'a str, text: &'a str) -> ApiFuture<'a, ()>;

    /// `POST /npc/update`: shallow-merge `updates` into one NPC.
    fn update_npc<'a>(&'a self, npc_id: &'a str, updates: &'a NpcUpdate) -> ApiFuture<'a, ()>;

    /// `POST /npc/create`: create a stub NPC.
    fn create_npc<'a>(&'a self, npc: &'a NewNpc) -> ApiFuture<'a, ()>;
}

/// Short id attached to each request's log lines.
fn next_request_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    format!("req-{:04x}", COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Async HTTP client for the editor API.
#[derive(Clone, Debug)]
pub struct EditorClient {
    client: reqwest::Client,
    base_url: String,
}

impl EditorClient {
    /// Build a client for `base_url` with the given request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, EditorError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("npc-editor/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| EditorError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &EditorConfig) -> Result<Self, EditorError> {
        Self::new(&config.base_url, config.timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, EditorError> {
        let id = next_request_id();
        let url = self.url(path);
        debug!("[{id}] GET {url}");
        let start = Instant::now();

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EditorError::Transport(e.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| EditorError::Transport(format!("failed to read response: {e}")))?;

        debug!(
            "[{id}] HTTP {} in {:.2}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(EditorError::Http { status, body: text });
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn post_write<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), EditorError> {
        let id = next_request_id();
        let url = self.url(path);
        debug!("[{id}] POST {url}");
        trace!(
            "[{id}] payload: {}",
            serde_json::to_string(body).unwrap_or_default()
        );
        let start = Instant::now();

        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| EditorError::Transport(e.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| EditorError::Transport(format!("failed to read response: {e}")))?;

        debug!(
            "[{id}] HTTP {} in {:.2}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            // Servers often report application failures with an error status
            // and the usual envelope; prefer the envelope's reason.
            if let Ok(ack) = serde_json::from_str::<WriteAck>(&text)
                && ack.error.is_some()
            {
                warn!("[{id}] {path} rejected with HTTP {status}");
                return ack.into_result();
            }
            return Err(EditorError::Http { status, body: text });
        }

        let ack: WriteAck = serde_json::from_str(&text)?;
        if !ack.success {
            warn!(
                "[{id}] {path} rejected: {}",
                ack.error.as_deref().unwrap_or("no reason given")
            );
        }
        ack.into_result()
    }
}

impl EditorApi for EditorClient {
    fn load_all(&self) -> ApiFuture<'_, EditorData> {
        Box::pin(async move {
            let data: EditorData = self.get_json("npcs").await?;
            debug!(
                "loaded {} npc(s), {} prompt(s), {} item(s)",
                data.npcs.len(),
                data.prompts.len(),
                data.items.len()
            );
            Ok(data)
        })
    }

    fn save_prompt<'a>(&'a self, key: &'a str, text: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            let body = SavePromptRequest {
                prompt_key: key,
                prompt_text: text,
            };
            self.post_write("npc/prompt", &body).await
        })
    }

    fn update_npc<'a>(&'a self, npc_id: &'a str, updates: &'a NpcUpdate) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            let body = UpdateNpcRequest { npc_id, updates };
            self.post_write("npc/update", &body).await
        })
    }

    fn create_npc<'a>(&'a self, npc: &'a NewNpc) -> ApiFuture<'a, ()> {
        Box::pin(async move { self.post_write("npc/create", npc).await })
    }
}
