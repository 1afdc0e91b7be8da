//! Camera connection parameters and camera-feed status.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::CameraConfigError;

/// Parameters pushed to the server before the feed is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub username: String,
    pub password: String,
    /// Device address.
    pub ip: String,
    pub channel: String,
    pub subtype: String,
}

impl CameraConfig {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        ip: impl Into<String>,
        channel: impl Into<String>,
        subtype: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ip: ip.into(),
            channel: channel.into(),
            subtype: subtype.into(),
        }
    }

    /// Every field must be non-blank. Reports all missing fields at once.
    pub fn validate(&self) -> Result<(), CameraConfigError> {
        let fields = [
            ("username", &self.username),
            ("password", &self.password),
            ("ip", &self.ip),
            ("channel", &self.channel),
            ("subtype", &self.subtype),
        ];
        let missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CameraConfigError::MissingFields(missing))
        }
    }

    /// Copy with surrounding whitespace removed from every field.
    pub fn trimmed(&self) -> Self {
        Self::new(
            self.username.trim(),
            self.password.trim(),
            self.ip.trim(),
            self.channel.trim(),
            self.subtype.trim(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CameraFeedStatus {
    #[default]
    Disconnected,
    Connecting,
    Streaming,
    Failed(String),
}

/// What the camera pane knows about the feed. Frames are counted, never
/// decoded.
#[derive(Debug, Clone, Default)]
pub struct CameraFeedState {
    status: CameraFeedStatus,
    frames: u64,
    last_frame_bytes: usize,
}

impl CameraFeedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &CameraFeedStatus {
        &self.status
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_frame_bytes(&self) -> usize {
        self.last_frame_bytes
    }

    pub fn connecting(&mut self) {
        self.status = CameraFeedStatus::Connecting;
        self.frames = 0;
        self.last_frame_bytes = 0;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = CameraFeedStatus::Failed(message.into());
    }

    pub fn disconnect(&mut self) {
        self.status = CameraFeedStatus::Disconnected;
    }

    /// Apply one feed frame: a JSON object with `error` fails the feed,
    /// anything else counts as an image frame.
    pub fn apply_frame(&mut self, frame: &str) {
        if let Some(message) = feed_error(frame) {
            warn!(error = %message, "camera feed reported an error");
            self.status = CameraFeedStatus::Failed(message);
            return;
        }
        self.frames += 1;
        self.last_frame_bytes = frame.len();
        self.status = CameraFeedStatus::Streaming;
    }

    pub fn status_text(&self) -> String {
        match &self.status {
            CameraFeedStatus::Failed(message) => format!("Error: {message}"),
            CameraFeedStatus::Disconnected => "Disconnected".to_string(),
            _ if self.frames > 0 => "Stream connected".to_string(),
            _ => "Connecting...".to_string(),
        }
    }
}

fn feed_error(frame: &str) -> Option<String> {
    if !frame.trim_start().starts_with('{') {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(frame).ok()?;
    match value.get("error")? {
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
