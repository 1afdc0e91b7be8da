//! Layout Manager - pane split, title bar, status/hint bar, scroll math.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use vchat_core::ConnectionState;

use super::{
    ChatViewState, CommandCompletionState, TuiTheme, canonical_slash_command,
    matching_slash_commands, parse_slash_tokens, slash_argument_options,
};

pub const TUI_SCROLL_STEP: usize = 3;
/// Below this width the camera pane is hidden.
pub const CAMERA_PANE_MIN_WIDTH: u16 = 80;
/// Share of the body width given to the chat pane.
pub const CHAT_PANE_PERCENT: u16 = 60;

#[derive(Debug, Clone)]
pub struct TuiSessionViewState {
    pub scroll_offset: usize,
    pub auto_follow: bool,
    pub body_height: usize,
}

impl Default for TuiSessionViewState {
    fn default() -> Self {
        Self {
            scroll_offset: 0,
            auto_follow: true,
            body_height: 1,
        }
    }
}

pub fn stream_state_color(state: ConnectionState, theme: &TuiTheme) -> ratatui::style::Color {
    match state {
        ConnectionState::Connecting => theme.warning,
        ConnectionState::Open => theme.success,
        ConnectionState::Closed => theme.danger,
    }
}

pub fn build_title_bar<'a>(server: &str, state: &ChatViewState, theme: &TuiTheme) -> Line<'a> {
    let model = state.model.as_deref().unwrap_or("default model");
    let activity = if state.submits_in_flight > 0 {
        ("sending...", theme.warning)
    } else if state.upload_in_flight.is_some() {
        ("uploading...", theme.warning)
    } else {
        ("idle", theme.text_muted)
    };

    Line::from(vec![
        Span::styled(
            " vchat ",
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" ", Style::default()),
        Span::styled(server.to_string(), Style::default().fg(theme.primary)),
        Span::styled(
            format!("  chat:{}  ", state.chat_stream.label()),
            Style::default().fg(stream_state_color(state.chat_stream, theme)),
        ),
        Span::styled(format!("{}  ", model), Style::default().fg(theme.success)),
        Span::styled(activity.0.to_string(), Style::default().fg(activity.1)),
    ])
}

pub fn build_status_hint_bar<'a>(
    input: &str,
    completion: Option<&CommandCompletionState>,
    state: &ChatViewState,
    theme: &TuiTheme,
) -> Line<'a> {
    if let Some((_raw, norm, args, trailing_space)) = parse_slash_tokens(input)
        && completion.is_none()
    {
        if args.is_empty() && !trailing_space {
            let matches = matching_slash_commands(&norm);
            let cmds: String = matches
                .iter()
                .map(|s| s.command)
                .collect::<Vec<_>>()
                .join("  ");
            return Line::from(vec![
                Span::styled(" ", Style::default()),
                Span::styled(cmds, Style::default().fg(theme.text_muted)),
                Span::styled("  Tab: complete", Style::default().fg(theme.text_dim)),
            ]);
        }
        if let Some(opts) = slash_argument_options(&norm) {
            return Line::from(vec![
                Span::styled(
                    format!(" {}: ", canonical_slash_command(&norm)),
                    Style::default().fg(theme.primary),
                ),
                Span::styled(opts.join("  "), Style::default().fg(theme.text_muted)),
            ]);
        }
    }

    if let Some(comp) = completion {
        let label = format!(
            " [{}/{}] {} ",
            comp.selected_index + 1,
            comp.suggestions.len(),
            comp.suggestions
                .get(comp.selected_index)
                .map(String::as_str)
                .unwrap_or(""),
        );
        return Line::from(vec![
            Span::styled(label, Style::default().fg(theme.primary)),
            Span::styled(
                "  Tab/Shift+Tab: cycle",
                Style::default().fg(theme.text_dim),
            ),
        ]);
    }

    let sep = Span::styled(" │ ", Style::default().fg(theme.border_dim));
    let mut spans = vec![
        Span::styled(" /help", Style::default().fg(theme.text_muted)),
        sep.clone(),
        Span::styled(
            format!("stream:{}", state.chat_stream.label()),
            Style::default().fg(stream_state_color(state.chat_stream, theme)),
        ),
        sep.clone(),
    ];

    if let Some(name) = state.upload_in_flight.as_deref() {
        spans.push(Span::styled(
            format!("uploading {}", name),
            Style::default().fg(theme.warning),
        ));
        spans.push(sep.clone());
    } else if let Some(media) = state.pending_media.as_ref() {
        spans.push(Span::styled(
            format!("attached {}", attachment_name(&media.file_path, &media.file_url)),
            Style::default().fg(theme.success),
        ));
        spans.push(sep.clone());
    }

    spans.push(Span::styled(
        "Enter send  ↑↓ history  PgUp/Dn scroll  Ctrl+O observations  Esc exit",
        Style::default().fg(theme.text_dim),
    ));
    Line::from(spans)
}

/// Last path segment of an attachment, for status display.
pub fn attachment_name<'a>(file_path: &'a str, file_url: &'a str) -> &'a str {
    let source = if file_path.is_empty() {
        file_url
    } else {
        file_path
    };
    source
        .rsplit(['/', '\\'])
        .find(|s| !s.is_empty())
        .unwrap_or(source)
}

pub fn input_line_count(input: &str) -> u16 {
    let lines = input.chars().filter(|c| *c == '\n').count() as u16 + 1;
    lines.clamp(1, 4)
}

/// Title bar, body, hint bar, input box.
pub fn tui_layout_constraints(input_lines: u16) -> Vec<Constraint> {
    vec![
        Constraint::Length(1),
        Constraint::Min(5),
        Constraint::Length(1),
        Constraint::Length(input_lines + 2),
    ]
}

/// Split the body area horizontally into (chat, camera).
///
/// The camera pane takes the right 40% when `show_camera` is set and the
/// area is at least [`CAMERA_PANE_MIN_WIDTH`] columns wide.
pub fn tui_session_split(area: Rect, show_camera: bool) -> (Rect, Option<Rect>) {
    if !show_camera || area.width < CAMERA_PANE_MIN_WIDTH {
        return (area, None);
    }
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(CHAT_PANE_PERCENT),
            Constraint::Percentage(100 - CHAT_PANE_PERCENT),
        ])
        .split(area);
    (chunks[0], Some(chunks[1]))
}

pub fn calc_log_scroll_usize(log_count: usize, body_height: usize) -> usize {
    log_count.saturating_sub(body_height)
}

pub fn effective_log_scroll(log_count: usize, session_view: &TuiSessionViewState) -> usize {
    let max_scroll = calc_log_scroll_usize(log_count, session_view.body_height);
    if session_view.auto_follow {
        max_scroll
    } else {
        session_view.scroll_offset.min(max_scroll)
    }
}
