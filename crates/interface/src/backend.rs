//! `ChatBackend` implementation over the HTTP/websocket transport.
//!
//! The TUI only sees the trait, so it never imports `vchat-interface`.

use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use vchat_core::{CameraConfig, ChatEvent, EventStream, Media, ServerConfig};
use vchat_tui::ChatBackend;

use crate::transport::{BackendClient, TransportError, open_ws_stream};

pub const CHAT_STREAM_PATH: &str = "/ws";
pub const CAMERA_FEED_PATH: &str = "/camera-feed";
pub const RECORDING_PATH: &str = "/start-recording";

#[derive(Debug, Clone)]
pub struct ServerBackend {
    client: BackendClient,
}

impl ServerBackend {
    pub fn new(config: &ServerConfig) -> Result<Self, TransportError> {
        Ok(Self {
            client: BackendClient::new(config)?,
        })
    }

    pub fn client(&self) -> &BackendClient {
        &self.client
    }
}

#[async_trait]
impl ChatBackend for ServerBackend {
    fn server_label(&self) -> String {
        self.client.http_base().to_string()
    }

    async fn submit(&self, transcript: Vec<ChatEvent>, model: Option<String>) -> anyhow::Result<()> {
        self.client
            .submit_chat(&transcript, model.as_deref())
            .await
            .context("chat submission failed")?;
        Ok(())
    }

    fn open_event_stream(&self) -> EventStream {
        open_ws_stream("chat", self.client.ws_url(CHAT_STREAM_PATH))
    }

    async fn upload_media(&self, path: &Path) -> anyhow::Result<Media> {
        self.client
            .upload_media(path)
            .await
            .with_context(|| format!("upload of {} failed", path.display()))
    }

    async fn set_camera_config(&self, config: &CameraConfig) -> anyhow::Result<()> {
        Ok(self.client.set_camera_config(config).await?)
    }

    fn open_camera_feed(&self) -> EventStream {
        open_ws_stream("camera", self.client.ws_url(CAMERA_FEED_PATH))
    }

    fn open_recording(&self) -> EventStream {
        open_ws_stream("recording", self.client.ws_url(RECORDING_PATH))
    }

    async fn stop_recording(&self) -> anyhow::Result<Option<String>> {
        Ok(self.client.stop_recording().await?)
    }
}
