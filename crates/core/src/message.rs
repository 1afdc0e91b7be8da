//! Chat event model and the inbound wire payload it is normalized from.

use serde::{Deserialize, Serialize};

use crate::{IngestError, Role};

/// An attachment carried by a chat event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    /// Server-side path, opaque to rendering.
    #[serde(default)]
    pub file_path: String,
    /// URL shown as the attachment link.
    #[serde(default)]
    pub file_url: String,
}

impl Media {
    pub fn new(file_path: impl Into<String>, file_url: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            file_url: file_url.into(),
        }
    }
}

/// One unit in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEvent {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<Media>,
}

impl ChatEvent {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            media: Vec::new(),
        }
    }

    pub fn with_media(mut self, media: Vec<Media>) -> Self {
        self.media = media;
        self
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Payload shape pushed by the remote event stream.
///
/// `role` and `media` are optional on the wire; `content` is required.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundPayload {
    #[serde(default)]
    pub role: Option<String>,
    pub content: String,
    #[serde(default)]
    pub media: Option<Vec<Media>>,
}

impl InboundPayload {
    pub fn parse(raw: &str) -> Result<Self, IngestError> {
        serde_json::from_str(raw).map_err(|e| IngestError::Malformed(e.to_string()))
    }

    /// Canonical event: a missing or empty role becomes `assistant`.
    pub fn into_event(self) -> ChatEvent {
        let role = match self.role.as_deref() {
            None | Some("") => Role::Assistant,
            Some(name) => Role::parse(name),
        };
        ChatEvent {
            role,
            content: self.content,
            media: self.media.unwrap_or_default(),
        }
    }
}
