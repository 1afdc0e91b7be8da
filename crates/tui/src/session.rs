//! Chat session - owns the transcript and every open stream, and applies
//! input, slash commands and backend notices to them.
//!
//! Nothing here touches the terminal, so the whole flow is testable with a
//! fake backend.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use vchat_core::{
    CameraFeedStatus, ChatEvent, ConnectionState, EventStream, RecordingUpdate, StreamIngest,
    Transcript, compose_outbound, render,
};

use crate::{
    BackendNotice, ChatEntry, ChatViewState, DynChatBackend, SlashCommand, attachment_name,
    entries_to_plain_text, help_lines, parse_slash_command, push_chat_entry, push_message_entry,
    push_text_entry, set_all_observations,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Continue,
    Quit,
}

pub struct ChatSession {
    backend: DynChatBackend,
    transcript: Transcript,
    entries: Vec<ChatEntry>,
    /// Transcript length already turned into entries.
    rendered_upto: usize,
    pub state: ChatViewState,
    ingest: Option<StreamIngest>,
    camera_feed: Option<EventStream>,
    recording_stream: Option<EventStream>,
    notice_tx: mpsc::UnboundedSender<BackendNotice>,
    notice_rx: mpsc::UnboundedReceiver<BackendNotice>,
}

impl ChatSession {
    pub fn new(backend: DynChatBackend, state: ChatViewState) -> Self {
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            transcript: Transcript::new(),
            entries: Vec::new(),
            rendered_upto: 0,
            state,
            ingest: None,
            camera_feed: None,
            recording_stream: None,
            notice_tx,
            notice_rx,
        }
    }

    pub fn server_label(&self) -> String {
        self.backend.server_label()
    }

    /// Open the chat event stream. Must run inside a tokio runtime.
    pub fn connect(&mut self) {
        if let Some(mut previous) = self.ingest.take() {
            previous.close();
        }
        self.ingest = Some(StreamIngest::new(self.backend.open_event_stream()));
        self.state.chat_stream = ConnectionState::Connecting;
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn note(&mut self, text: &str) {
        push_text_entry(&mut self.entries, text);
    }

    /// Drain every stream and notice channel. Returns true when anything
    /// visible changed.
    pub fn tick(&mut self) -> bool {
        let mut changed = self.pump_chat_stream();
        changed |= self.pump_camera_feed();
        changed |= self.pump_recording();
        while let Ok(notice) = self.notice_rx.try_recv() {
            self.apply_notice(notice);
            changed = true;
        }
        changed |= self.sync_entries();
        changed
    }

    fn pump_chat_stream(&mut self) -> bool {
        let Some(ingest) = self.ingest.as_mut() else {
            return false;
        };
        let mut results = Vec::new();
        let mut viewer = |url: &str| results.push(url.to_string());
        let appended = ingest.pump(&mut self.transcript, &mut viewer);
        let state = ingest.stream().state();

        let mut changed = appended > 0;
        // Entries for the events go in before any result note they produced.
        self.sync_entries();
        for url in results {
            info!(url = %url, "final result available");
            push_chat_entry(&mut self.entries, ChatEntry::ResultNote(url));
            changed = true;
        }
        if state != self.state.chat_stream {
            if state == ConnectionState::Closed {
                self.note("[Warning] chat stream closed; restart vchat to reconnect");
            }
            self.state.chat_stream = state;
            changed = true;
        }
        changed
    }

    fn pump_camera_feed(&mut self) -> bool {
        let Some(feed) = self.camera_feed.as_mut() else {
            return false;
        };
        let mut changed = false;
        while let Some(frame) = feed.try_next() {
            self.state.camera.feed.apply_frame(&frame);
            changed = true;
        }
        if feed.is_closed() {
            self.camera_feed = None;
            if !matches!(self.state.camera.feed.status(), CameraFeedStatus::Failed(_)) {
                self.state.camera.feed.disconnect();
            }
            changed = true;
        }
        changed
    }

    fn pump_recording(&mut self) -> bool {
        let Some(stream) = self.recording_stream.as_mut() else {
            return false;
        };
        let mut updates = Vec::new();
        while let Some(frame) = stream.try_next() {
            updates.push(self.state.camera.recording.apply_status_text(&frame));
        }
        let closed = stream.is_closed();
        let changed = !updates.is_empty() || closed;

        for update in updates {
            match update {
                RecordingUpdate::Started { file } => {
                    info!(file = ?file, "recording started");
                    self.state.camera.last_error = None;
                }
                RecordingUpdate::Failed(error) => {
                    warn!(error = %error, "recording failed");
                    self.note(&format!("[Error] recording failed: {}", error));
                    self.state.camera.last_error = Some(error);
                    self.close_recording_stream();
                    return true;
                }
                RecordingUpdate::Progress | RecordingUpdate::Ignored => {}
            }
        }
        if closed {
            self.recording_stream = None;
            if self.state.camera.recording.is_active() {
                self.remember_recording_file();
                self.state.camera.recording.stop();
                self.note("[Warning] recording stream closed");
            }
        }
        changed
    }

    /// Turn newly appended visible events into entries.
    fn sync_entries(&mut self) -> bool {
        if self.rendered_upto == self.transcript.len() {
            return false;
        }
        let expand = self.state.expand_observations;
        for event in self.transcript.visible_since(self.rendered_upto) {
            push_message_entry(&mut self.entries, render(event), expand);
        }
        self.rendered_upto = self.transcript.len();
        true
    }

    fn apply_notice(&mut self, notice: BackendNotice) {
        match notice {
            BackendNotice::Submitted => {
                self.state.submits_in_flight = self.state.submits_in_flight.saturating_sub(1);
            }
            BackendNotice::SubmitFailed(error) => {
                self.state.submits_in_flight = self.state.submits_in_flight.saturating_sub(1);
                warn!(error = %error, "chat submission failed");
                self.transcript.append(ChatEvent::submission_failed());
            }
            BackendNotice::Uploaded(media) => {
                self.state.upload_in_flight = None;
                let name = attachment_name(&media.file_path, &media.file_url).to_string();
                self.note(&format!("Attached {} (sent with your next message)", name));
                self.state.pending_media = Some(media);
            }
            BackendNotice::UploadFailed(error) => {
                self.state.upload_in_flight = None;
                warn!(error = %error, "media upload failed");
                self.note(&format!("[Warning] upload failed: {}", error));
            }
            BackendNotice::CameraConfigured => {
                self.state.camera.configuring = false;
                self.note("Camera configured, connecting to feed...");
                if let Some(mut previous) = self.camera_feed.take() {
                    previous.close();
                }
                self.camera_feed = Some(self.backend.open_camera_feed());
                self.state.camera.feed.connecting();
            }
            BackendNotice::CameraConfigFailed(error) => {
                self.state.camera.configuring = false;
                warn!(error = %error, "camera configuration failed");
                self.note(&format!("[Error] camera configuration failed: {}", error));
                self.state.camera.last_error = Some(error);
            }
            BackendNotice::RecordingStopped(status) => {
                self.note(&format!(
                    "Recording stopped{}",
                    status.map(|s| format!(" ({})", s)).unwrap_or_default()
                ));
            }
            BackendNotice::RecordingStopFailed(error) => {
                warn!(error = %error, "stop recording failed");
                self.note(&format!("[Warning] stop recording failed: {}", error));
            }
        }
    }

    // ── Input ───────────────────────────────────────────────────────

    /// Handle one composer line: a slash command or a chat message.
    pub fn handle_line(&mut self, line: &str) -> CommandOutcome {
        if line.trim_start().starts_with('/') {
            return match parse_slash_command(line) {
                Ok(command) => self.handle_command(command),
                Err(usage) => {
                    self.note(&format!("[Warning] {}", usage));
                    CommandOutcome::Continue
                }
            };
        }
        self.submit(line);
        CommandOutcome::Continue
    }

    /// Append the outbound event and send the whole transcript. Returns
    /// false when there was nothing to send. The pending attachment is
    /// consumed either way.
    pub fn submit(&mut self, input: &str) -> bool {
        let pending = self.state.pending_media.take();
        let Some(event) = compose_outbound(&self.transcript, input, pending) else {
            return false;
        };
        self.transcript.append(event);
        self.sync_entries();

        let snapshot = self.transcript.events().to_vec();
        let model = self.state.model.clone();
        let backend = self.backend.clone();
        let tx = self.notice_tx.clone();
        self.state.submits_in_flight += 1;
        tokio::spawn(async move {
            let notice = match backend.submit(snapshot, model).await {
                Ok(()) => BackendNotice::Submitted,
                Err(e) => BackendNotice::SubmitFailed(format!("{:#}", e)),
            };
            let _ = tx.send(notice);
        });
        true
    }

    pub fn handle_command(&mut self, command: SlashCommand) -> CommandOutcome {
        match command {
            SlashCommand::Help => {
                for line in help_lines() {
                    push_chat_entry(&mut self.entries, ChatEntry::SystemNote(line));
                }
            }
            SlashCommand::Upload(path) => self.start_upload(path),
            SlashCommand::Camera(config) => {
                if let Err(e) = config.validate() {
                    warn!(error = %e, "camera configuration rejected");
                    self.note(&format!("[Warning] {}", e));
                    self.state.camera.last_error = Some(e.to_string());
                    return CommandOutcome::Continue;
                }
                let config = config.trimmed();
                self.state.camera.config = Some(config.clone());
                self.state.camera.configuring = true;
                self.state.camera.last_error = None;
                let backend = self.backend.clone();
                let tx = self.notice_tx.clone();
                tokio::spawn(async move {
                    let notice = match backend.set_camera_config(&config).await {
                        Ok(()) => BackendNotice::CameraConfigured,
                        Err(e) => BackendNotice::CameraConfigFailed(format!("{:#}", e)),
                    };
                    let _ = tx.send(notice);
                });
            }
            SlashCommand::Record => {
                if !self.state.camera.recording.start(Utc::now()) {
                    self.note("[Tip] already recording; /stop to finish");
                    return CommandOutcome::Continue;
                }
                self.state.camera.last_error = None;
                self.recording_stream = Some(self.backend.open_recording());
                self.note("Recording requested");
            }
            SlashCommand::Stop => {
                if !self.state.camera.recording.is_active() {
                    self.note("[Tip] not recording");
                    return CommandOutcome::Continue;
                }
                self.remember_recording_file();
                self.close_recording_stream();
                let backend = self.backend.clone();
                let tx = self.notice_tx.clone();
                tokio::spawn(async move {
                    let notice = match backend.stop_recording().await {
                        Ok(status) => BackendNotice::RecordingStopped(status),
                        Err(e) => BackendNotice::RecordingStopFailed(format!("{:#}", e)),
                    };
                    let _ = tx.send(notice);
                });
            }
            SlashCommand::Model(None) => {
                let current = self
                    .state
                    .model
                    .clone()
                    .unwrap_or_else(|| "server default".to_string());
                self.note(&format!("Model: {} (usage: /model <name>)", current));
            }
            SlashCommand::Model(Some(model)) => {
                self.note(&format!("Model set to {}", model));
                self.state.model = Some(model);
            }
            SlashCommand::Observations(expand) => {
                let expand = expand.unwrap_or(!self.state.expand_observations);
                self.set_observations(expand);
            }
            SlashCommand::Copy => self.copy_to_file(&std::env::temp_dir()),
            SlashCommand::Quit => return CommandOutcome::Quit,
        }
        CommandOutcome::Continue
    }

    pub fn toggle_observations(&mut self) {
        self.set_observations(!self.state.expand_observations);
    }

    fn set_observations(&mut self, expand: bool) {
        self.state.expand_observations = expand;
        set_all_observations(&mut self.entries, expand);
    }

    fn start_upload(&mut self, path: PathBuf) {
        if let Some(name) = self.state.upload_in_flight.as_deref() {
            let text = format!("[Tip] still uploading {}", name);
            self.note(&text);
            return;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.state.upload_in_flight = Some(name);
        let backend = self.backend.clone();
        let tx = self.notice_tx.clone();
        tokio::spawn(async move {
            let notice = match backend.upload_media(&path).await {
                Ok(media) => BackendNotice::Uploaded(media),
                Err(e) => BackendNotice::UploadFailed(format!("{:#}", e)),
            };
            let _ = tx.send(notice);
        });
    }

    /// Write the conversation as plain text into `dir`.
    pub fn copy_to_file(&mut self, dir: &Path) {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("vchat-session-{}.txt", timestamp));
        match std::fs::write(&path, entries_to_plain_text(&self.entries)) {
            Ok(()) => self.note(&format!("[OK] Conversation saved to: {}", path.display())),
            Err(e) => self.note(&format!("[Error] Failed to save conversation: {}", e)),
        }
    }

    fn remember_recording_file(&mut self) {
        if let Some(file) = self.state.camera.recording.file() {
            self.state.camera.last_recording_file = Some(file.to_string());
        }
    }

    fn close_recording_stream(&mut self) {
        if let Some(mut stream) = self.recording_stream.take() {
            stream.close();
        }
        self.state.camera.recording.stop();
    }

    /// Close every stream. Already appended events stay.
    pub fn close(&mut self) {
        if let Some(ingest) = self.ingest.as_mut() {
            ingest.close();
        }
        if let Some(mut feed) = self.camera_feed.take() {
            feed.close();
        }
        if let Some(mut stream) = self.recording_stream.take() {
            stream.close();
        }
        self.state.chat_stream = ConnectionState::Closed;
    }
}
