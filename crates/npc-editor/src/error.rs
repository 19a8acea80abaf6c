//! Error type shared by the client, the session and the front ends.

use reqwest::StatusCode;

/// Everything that can go wrong talking to the content API.
///
/// All variants are recoverable: the session turns them into a status line
/// and leaves local state as it was.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// The request never produced a response (connect, timeout, reset).
    #[error("request failed: {0}")]
    Transport(String),
    /// The server answered with a non-2xx status.
    #[error("API HTTP {status}: {body}")]
    Http { status: StatusCode, body: String },
    /// The body was not the JSON shape we expected.
    #[error("malformed response: {0}")]
    Malformed(String),
    /// The server understood the request and refused it (`success: false`).
    #[error("rejected: {}", .0.as_deref().unwrap_or("unknown error"))]
    Rejected(Option<String>),
    /// A referenced NPC, prompt or item is not loaded.
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("{0}")]
    Io(String),
}

impl EditorError {
    /// Short text for a transient status line.
    pub fn user_message(&self) -> String {
        match self {
            EditorError::Transport(_) => "Could not reach the editor API".to_string(),
            EditorError::Http { status, .. } => format!("Editor API returned {status}"),
            EditorError::Malformed(_) => "Unexpected response from the editor API".to_string(),
            EditorError::Rejected(Some(reason)) => reason.clone(),
            EditorError::Rejected(None) => "Request was rejected".to_string(),
            EditorError::NotFound(what) => format!("{what} not found"),
            EditorError::Config(msg) | EditorError::Io(msg) => msg.clone(),
        }
    }
}

impl From<reqwest::Error> for EditorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            EditorError::Malformed(e.to_string())
        } else {
            EditorError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for EditorError {
    fn from(e: serde_json::Error) -> Self {
        EditorError::Malformed(e.to_string())
    }
}

impl From<std::io::Error> for EditorError {
    fn from(e: std::io::Error) -> Self {
        EditorError::Io(e.to_string())
    }
}
