//! ChatBackend trait - the server operations the TUI needs.
//!
//! The trait lives in `vchat-tui` so the TUI never depends on
//! `vchat-interface`. `vchat-interface` provides the HTTP/websocket
//! implementation.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use vchat_core::{CameraConfig, ChatEvent, EventStream, Media};

// ── Notices (spawned request results, delivered to the UI loop) ─────

/// Outcome of a request that ran in a spawned task.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendNotice {
    Submitted,
    SubmitFailed(String),
    Uploaded(Media),
    UploadFailed(String),
    CameraConfigured,
    CameraConfigFailed(String),
    RecordingStopped(Option<String>),
    RecordingStopFailed(String),
}

// ── Trait ────────────────────────────────────────────────────────────

/// Server operations used by the chat session.
///
/// The `open_*` calls spawn their transport task and hand back the owning
/// [`EventStream`]; they must be called inside a tokio runtime.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Short server description for the title bar.
    fn server_label(&self) -> String;

    // --- Chat ---
    async fn submit(&self, transcript: Vec<ChatEvent>, model: Option<String>)
    -> anyhow::Result<()>;

    fn open_event_stream(&self) -> EventStream;

    // --- Media ---
    async fn upload_media(&self, path: &Path) -> anyhow::Result<Media>;

    // --- Camera ---
    async fn set_camera_config(&self, config: &CameraConfig) -> anyhow::Result<()>;

    fn open_camera_feed(&self) -> EventStream;

    // --- Recording ---
    fn open_recording(&self) -> EventStream;

    /// Returns the server's status text.
    async fn stop_recording(&self) -> anyhow::Result<Option<String>>;
}

/// Convenience type alias used throughout the TUI crate.
pub type DynChatBackend = Arc<dyn ChatBackend>;
