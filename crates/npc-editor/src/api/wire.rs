//! Request and response bodies for the editor endpoints.

use serde::{Deserialize, Serialize};

use crate::error::EditorError;
use crate::model::NpcUpdate;

/// `POST /npc/prompt`
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SavePromptRequest<'a> {
    pub prompt_key: &'a str,
    pub prompt_text: &'a str,
}

/// `POST /npc/update`
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNpcRequest<'a> {
    pub npc_id: &'a str,
    pub updates: &'a NpcUpdate,
}

/// Envelope returned by every write endpoint.
///
/// A missing `success` field counts as failure.
#[derive(Deserialize, Serialize, Debug, Default, PartialEq, Eq)]
pub struct WriteAck {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WriteAck {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }

    pub fn into_result(self) -> Result<(), EditorError> {
        if self.success {
            Ok(())
        } else {
            Err(EditorError::Rejected(self.error.filter(|e| !e.is_empty())))
        }
    }
}
