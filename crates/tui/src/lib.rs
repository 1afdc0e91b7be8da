//! vchat TUI - Terminal User Interface for vchat.
//!
//! This crate provides the ratatui-based two-pane chat session UI.
//! It depends on `vchat-core` for the transcript model and defines the
//! `ChatBackend` trait that `vchat-interface` implements.

pub mod camera_panel;
pub mod chat_backend;
mod app;
mod chat_renderer;
mod commands;
mod input_handler;
mod layout_manager;
mod session;
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export the trait and notices as the primary public API
pub use chat_backend::{BackendNotice, ChatBackend, DynChatBackend};

// Re-export TUI entry point and session state
pub use app::*;
pub use camera_panel::CameraPanelState;
pub use chat_renderer::*;
pub use commands::*;
pub use input_handler::*;
pub use layout_manager::*;
pub use session::*;

use vchat_core::{ConnectionState, Media, VchatConfig};

// ── ChatViewState ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ChatViewState {
    pub expand_observations: bool,
    pub show_camera_pane: bool,
    pub model: Option<String>,
    pub history_limit: usize,
    pub chat_stream: ConnectionState,
    /// Uploaded media waiting for the next submission.
    pub pending_media: Option<Media>,
    /// File name of the upload in flight.
    pub upload_in_flight: Option<String>,
    pub submits_in_flight: usize,
    pub camera: CameraPanelState,
}

impl ChatViewState {
    pub fn from_config(config: &VchatConfig) -> Self {
        Self {
            expand_observations: config.ui.expand_observations,
            show_camera_pane: config.ui.show_camera_pane,
            model: config.chat.model.clone(),
            history_limit: config.chat.history_limit.max(1),
            chat_stream: ConnectionState::Connecting,
            pending_media: None,
            upload_in_flight: None,
            submits_in_flight: 0,
            camera: CameraPanelState::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_state_from_default_config() {
        let state = ChatViewState::from_config(&VchatConfig::default());
        assert!(!state.expand_observations);
        assert!(state.show_camera_pane);
        assert!(state.model.is_none());
        assert_eq!(state.history_limit, 100);
        assert_eq!(state.chat_stream, ConnectionState::Connecting);
        assert!(state.pending_media.is_none());
    }

    #[test]
    fn test_view_state_follows_config_sections() {
        let mut config = VchatConfig::default();
        config.ui.expand_observations = true;
        config.ui.show_camera_pane = false;
        config.chat.model = Some("llava".to_string());
        config.chat.history_limit = 0;
        let state = ChatViewState::from_config(&config);
        assert!(state.expand_observations);
        assert!(!state.show_camera_pane);
        assert_eq!(state.model.as_deref(), Some("llava"));
        assert_eq!(state.history_limit, 1);
    }
}
