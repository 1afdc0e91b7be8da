//! Recording state and clock.

use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RecordingState {
    #[default]
    Idle,
    /// Stream requested; the clock already runs.
    Starting { started_at: DateTime<Utc> },
    Recording {
        started_at: DateTime<Utc>,
        file: Option<String>,
    },
}

/// A status frame from the recording stream.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordingStatusFrame {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Result of applying a recording status frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingUpdate {
    Started { file: Option<String> },
    Progress,
    Failed(String),
    Ignored,
}

impl RecordingState {
    pub fn is_active(&self) -> bool {
        !matches!(self, RecordingState::Idle)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        match self {
            RecordingState::Idle => None,
            RecordingState::Starting { started_at }
            | RecordingState::Recording { started_at, .. } => Some(*started_at),
        }
    }

    pub fn file(&self) -> Option<&str> {
        match self {
            RecordingState::Recording { file, .. } => file.as_deref(),
            _ => None,
        }
    }

    /// Begin recording. A no-op while already active.
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_active() {
            return false;
        }
        *self = RecordingState::Starting { started_at: now };
        true
    }

    pub fn stop(&mut self) -> bool {
        let was_active = self.is_active();
        *self = RecordingState::Idle;
        was_active
    }

    /// Apply one frame from the recording stream. Unparseable frames are
    /// ignored.
    pub fn apply_status_text(&mut self, text: &str) -> RecordingUpdate {
        let Ok(frame) = serde_json::from_str::<RecordingStatusFrame>(text) else {
            return RecordingUpdate::Ignored;
        };
        self.apply_status(frame)
    }

    pub fn apply_status(&mut self, frame: RecordingStatusFrame) -> RecordingUpdate {
        if let Some(error) = frame.error {
            *self = RecordingState::Idle;
            return RecordingUpdate::Failed(error);
        }
        let Some(started_at) = self.started_at() else {
            return RecordingUpdate::Ignored;
        };
        match frame.status.as_deref() {
            Some("recording_started") => {
                *self = RecordingState::Recording {
                    started_at,
                    file: frame.file.clone(),
                };
                RecordingUpdate::Started { file: frame.file }
            }
            Some("recording") => {
                if let RecordingState::Starting { .. } = self {
                    *self = RecordingState::Recording {
                        started_at,
                        file: None,
                    };
                }
                RecordingUpdate::Progress
            }
            _ => RecordingUpdate::Ignored,
        }
    }

    /// Whole seconds since start, zero when idle.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        self.started_at()
            .map(|start| (now - start).num_seconds().max(0) as u64)
            .unwrap_or(0)
    }
}

/// `MM:SS`; minutes keep counting past an hour.
pub fn format_duration(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "00:00");
        assert_eq!(format_duration(75), "01:15");
        assert_eq!(format_duration(3600), "60:00");
    }

    #[test]
    fn test_start_then_started_frame_records_file() {
        let now = Utc::now();
        let mut state = RecordingState::default();
        assert!(state.start(now));
        assert!(!state.start(now));

        let update =
            state.apply_status_text(r#"{"status":"recording_started","file":"rec_001.mp4"}"#);
        assert_eq!(
            update,
            RecordingUpdate::Started {
                file: Some("rec_001.mp4".to_string())
            }
        );
        assert_eq!(state.file(), Some("rec_001.mp4"));
        assert_eq!(state.elapsed_secs(now + Duration::seconds(75)), 75);
        assert_eq!(state.apply_status_text(r#"{"status":"recording"}"#), RecordingUpdate::Progress);
        assert_eq!(state.file(), Some("rec_001.mp4"));
    }

    #[test]
    fn test_error_frame_returns_to_idle() {
        let mut state = RecordingState::default();
        state.start(Utc::now());
        let update = state.apply_status_text(r#"{"error":"camera not configured"}"#);
        assert_eq!(
            update,
            RecordingUpdate::Failed("camera not configured".to_string())
        );
        assert_eq!(state, RecordingState::Idle);
        assert_eq!(state.elapsed_secs(Utc::now()), 0);
    }

    #[test]
    fn test_frames_while_idle_are_ignored() {
        let mut state = RecordingState::default();
        assert_eq!(
            state.apply_status_text(r#"{"status":"recording"}"#),
            RecordingUpdate::Ignored
        );
        assert_eq!(state.apply_status_text("garbage"), RecordingUpdate::Ignored);
        assert!(!state.stop());
    }
}
