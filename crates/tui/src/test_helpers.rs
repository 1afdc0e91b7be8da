//! Shared test helpers for TUI sub-module tests.

use async_trait::async_trait;
use ratatui::text::Line;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::mpsc;
use vchat_core::{CameraConfig, ChatEvent, EventStream, Media, StreamSignal, VchatConfig, render};

use super::*;

pub fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .expect("env lock poisoned")
}

pub fn with_env_overrides<T>(updates: &[(&str, Option<&str>)], f: impl FnOnce() -> T) -> T {
    let _guard = env_lock();
    let previous = updates
        .iter()
        .map(|(key, _)| ((*key).to_string(), std::env::var(key).ok()))
        .collect::<Vec<_>>();
    for (key, value) in updates {
        match value {
            Some(v) => unsafe { std::env::set_var(key, v) },
            None => unsafe { std::env::remove_var(key) },
        }
    }
    let result = f();
    for (key, old) in previous {
        match old {
            Some(v) => unsafe { std::env::set_var(&key, v) },
            None => unsafe { std::env::remove_var(&key) },
        }
    }
    result
}

pub fn line_plain(line: &Line<'_>) -> String {
    line.spans
        .iter()
        .map(|s| s.content.as_ref())
        .collect::<String>()
}

pub fn message_entry(event: ChatEvent) -> ChatEntry {
    ChatEntry::Message(render(&event))
}

pub fn entry_lines_plain(entry: &ChatEntry) -> Vec<String> {
    let theme = TuiTheme::default_dark();
    let mut lines = Vec::new();
    style_chat_entry(entry, &theme, &mut lines);
    lines.iter().map(line_plain).collect()
}

// ── Mock backend ────────────────────────────────────────────────────

#[derive(Default)]
struct MockInner {
    submits: Vec<(Vec<ChatEvent>, Option<String>)>,
    camera_configs: Vec<CameraConfig>,
    stop_calls: usize,
    fail_submit: bool,
    fail_upload: bool,
    chat_tx: Option<mpsc::Sender<StreamSignal>>,
    camera_tx: Option<mpsc::Sender<StreamSignal>>,
    recording_tx: Option<mpsc::Sender<StreamSignal>>,
}

/// Records every call; streams are fed by the test through the stored
/// senders.
#[derive(Default)]
pub struct MockBackend {
    inner: Mutex<MockInner>,
}

impl MockBackend {
    fn with<T>(&self, f: impl FnOnce(&mut MockInner) -> T) -> T {
        f(&mut self.inner.lock().expect("mock lock poisoned"))
    }

    pub fn fail_submit(&self) {
        self.with(|i| i.fail_submit = true);
    }

    pub fn fail_upload(&self) {
        self.with(|i| i.fail_upload = true);
    }

    pub fn submits(&self) -> Vec<(Vec<ChatEvent>, Option<String>)> {
        self.with(|i| i.submits.clone())
    }

    pub fn camera_configs(&self) -> Vec<CameraConfig> {
        self.with(|i| i.camera_configs.clone())
    }

    pub fn stop_calls(&self) -> usize {
        self.with(|i| i.stop_calls)
    }

    pub fn chat_sender(&self) -> mpsc::Sender<StreamSignal> {
        self.with(|i| i.chat_tx.clone().expect("chat stream not opened"))
    }

    pub fn camera_sender(&self) -> mpsc::Sender<StreamSignal> {
        self.with(|i| i.camera_tx.clone().expect("camera feed not opened"))
    }

    pub fn recording_sender(&self) -> mpsc::Sender<StreamSignal> {
        self.with(|i| i.recording_tx.clone().expect("recording not opened"))
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    fn server_label(&self) -> String {
        "http://test".to_string()
    }

    async fn submit(&self, events: Vec<ChatEvent>, model: Option<String>) -> anyhow::Result<()> {
        self.with(|i| {
            i.submits.push((events, model));
            if i.fail_submit {
                anyhow::bail!("500 Internal Server Error");
            }
            Ok(())
        })
    }

    fn open_event_stream(&self) -> EventStream {
        let (tx, stream) = EventStream::channel("chat");
        self.with(|i| i.chat_tx = Some(tx));
        stream
    }

    async fn upload_media(&self, path: &Path) -> anyhow::Result<Media> {
        if self.with(|i| i.fail_upload) {
            anyhow::bail!("413 Payload Too Large");
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Media::new(
            format!("uploads/{}", name),
            format!("http://test/uploads/{}", name),
        ))
    }

    async fn set_camera_config(&self, config: &CameraConfig) -> anyhow::Result<()> {
        self.with(|i| i.camera_configs.push(config.clone()));
        Ok(())
    }

    fn open_camera_feed(&self) -> EventStream {
        let (tx, stream) = EventStream::channel("camera");
        self.with(|i| i.camera_tx = Some(tx));
        stream
    }

    fn open_recording(&self) -> EventStream {
        let (tx, stream) = EventStream::channel("recording");
        self.with(|i| i.recording_tx = Some(tx));
        stream
    }

    async fn stop_recording(&self) -> anyhow::Result<Option<String>> {
        self.with(|i| i.stop_calls += 1);
        Ok(Some("recording_stopped".to_string()))
    }
}

/// A session over a fresh mock backend with the chat stream opened.
pub fn connected_session() -> (Arc<MockBackend>, ChatSession) {
    let backend = Arc::new(MockBackend::default());
    let dyn_backend: DynChatBackend = backend.clone();
    let mut session = ChatSession::new(
        dyn_backend,
        ChatViewState::from_config(&VchatConfig::default()),
    );
    session.connect();
    (backend, session)
}

/// Let spawned backend calls finish, then apply their notices.
pub async fn settle(session: &mut ChatSession) {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    session.tick();
}
