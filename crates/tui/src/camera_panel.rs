//! Camera panel - feed status, connection settings and the recording clock.

use chrono::{DateTime, Utc};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use vchat_core::{CameraConfig, CameraFeedState, CameraFeedStatus, RecordingState, format_duration};

use crate::TuiTheme;

/// Everything the camera pane shows.
#[derive(Debug, Clone, Default)]
pub struct CameraPanelState {
    /// Last configuration pushed to the server.
    pub config: Option<CameraConfig>,
    /// Configuration request in flight.
    pub configuring: bool,
    pub feed: CameraFeedState,
    pub recording: RecordingState,
    /// Output file reported by the last recording.
    pub last_recording_file: Option<String>,
    pub last_error: Option<String>,
}

fn feed_style(status: &CameraFeedStatus, theme: &TuiTheme) -> Style {
    match status {
        CameraFeedStatus::Streaming => Style::default().fg(theme.success),
        CameraFeedStatus::Connecting => Style::default().fg(theme.warning),
        CameraFeedStatus::Failed(_) => Style::default().fg(theme.danger),
        CameraFeedStatus::Disconnected => Style::default().fg(theme.text_muted),
    }
}

fn masked(secret: &str) -> String {
    "•".repeat(secret.chars().count().min(8))
}

/// Panel content as lines.
pub fn camera_panel_lines(
    state: &CameraPanelState,
    now: DateTime<Utc>,
    theme: &TuiTheme,
) -> Vec<Line<'static>> {
    let label = Style::default().fg(theme.text_muted);
    let value = Style::default().fg(theme.text_base);
    let mut lines = vec![Line::from(vec![
        Span::styled("● ", feed_style(state.feed.status(), theme)),
        Span::styled(
            state.feed.status_text(),
            feed_style(state.feed.status(), theme).add_modifier(Modifier::BOLD),
        ),
    ])];
    if state.feed.frames() > 0 {
        lines.push(Line::from(vec![
            Span::styled("  frames ", label),
            Span::styled(
                format!("{} (last {} B)", state.feed.frames(), state.feed.last_frame_bytes()),
                value,
            ),
        ]));
    }

    lines.push(Line::default());
    match &state.config {
        Some(config) => {
            let rows = [
                ("  user     ", config.username.clone()),
                ("  password ", masked(&config.password)),
                ("  ip       ", config.ip.clone()),
                ("  channel  ", config.channel.clone()),
                ("  subtype  ", config.subtype.clone()),
            ];
            for (name, text) in rows {
                lines.push(Line::from(vec![
                    Span::styled(name, label),
                    Span::styled(text, value),
                ]));
            }
        }
        None => lines.push(Line::from(Span::styled(
            if state.configuring {
                "  applying camera settings..."
            } else {
                "  not configured (/camera)"
            },
            label,
        ))),
    }

    lines.push(Line::default());
    match &state.recording {
        RecordingState::Idle => {
            lines.push(Line::from(vec![
                Span::styled("○ ", label),
                Span::styled("Not recording (/record)", label),
            ]));
            if let Some(file) = state.last_recording_file.as_deref() {
                lines.push(Line::from(vec![
                    Span::styled("  last file ", label),
                    Span::styled(file.to_string(), value),
                ]));
            }
        }
        active => {
            let elapsed = format_duration(active.elapsed_secs(now));
            let rec = Style::default()
                .fg(theme.danger)
                .add_modifier(Modifier::BOLD);
            let phase = match active {
                RecordingState::Starting { .. } => "Starting",
                _ => "REC",
            };
            lines.push(Line::from(vec![
                Span::styled("● ", rec),
                Span::styled(format!("{} {}", phase, elapsed), rec),
                Span::styled("  (/stop)", label),
            ]));
            if let Some(file) = active.file() {
                lines.push(Line::from(vec![
                    Span::styled("  file ", label),
                    Span::styled(file.to_string(), value),
                ]));
            }
        }
    }

    if let Some(error) = state.last_error.as_deref() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            format!("✗ {}", error),
            Style::default().fg(theme.danger),
        )));
    }
    lines
}

/// Render the camera panel into the given area.
pub fn render_camera_panel(
    frame: &mut Frame,
    area: Rect,
    state: &CameraPanelState,
    now: DateTime<Utc>,
    theme: &TuiTheme,
) {
    let block = Block::default()
        .title(Span::styled(
            " Camera ",
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_normal));
    let paragraph = Paragraph::new(camera_panel_lines(state, now, theme))
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
