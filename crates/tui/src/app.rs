//! TUI application loop - the ratatui event loop for the interactive chat.

use std::io;
use std::time::Duration;

use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::cursor::Show;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
};
use tracing::{info, warn};

use crate::camera_panel::render_camera_panel;

use super::*;

fn apply_tui_shortcut_action(action: TuiShortcutAction, session: &mut ChatSession) {
    match action {
        TuiShortcutAction::ToggleObservations => session.toggle_observations(),
        TuiShortcutAction::ToggleCameraPane => {
            session.state.show_camera_pane = !session.state.show_camera_pane;
        }
    }
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, Show)
}

/// Puts the terminal back into cooked mode when dropped, whichever way the
/// loop exits.
struct TerminalGuard {
    restore: fn() -> io::Result<()>,
    restored: bool,
}

impl TerminalGuard {
    fn new(restore: fn() -> io::Result<()>) -> Self {
        Self {
            restore,
            restored: false,
        }
    }

    fn restore(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        (self.restore)()
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            warn!(error = %e, "failed to restore terminal");
        }
    }
}

/// Run the interactive chat until the operator quits. Opens the chat
/// stream and closes every stream on the way out.
pub async fn run_chat_tui(session: &mut ChatSession, keymap: ChatKeymap) -> io::Result<()> {
    enable_raw_mode()?;
    let mut guard = TerminalGuard::new(restore_terminal);
    execute!(io::stdout(), EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.clear()?;

    let result = chat_loop(&mut terminal, session, keymap).await;
    session.close();
    info!("chat session ended");
    guard.restore()?;
    result
}

async fn chat_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &mut ChatSession,
    keymap: ChatKeymap,
) -> io::Result<()> {
    session.connect();
    session.note("vchat: type a message and press Enter.  /help for commands");
    let server = session.server_label();
    info!(server = %server, "chat session started");

    let mut input = String::new();
    let mut input_history = InputHistory::new(session.state.history_limit);
    let mut completion_state: Option<CommandCompletionState> = None;
    let mut session_view = TuiSessionViewState::default();
    let mut should_quit = false;

    while !should_quit {
        session.tick();
        // Spawned backend calls report through the session's notice channel.
        tokio::task::yield_now().await;

        terminal.draw(|f| {
            let theme = TuiTheme::default_dark();
            let il = input_line_count(&input);
            let areas = Layout::default()
                .direction(Direction::Vertical)
                .constraints(tui_layout_constraints(il))
                .split(f.area());

            // [0] Title bar
            let title_bar = build_title_bar(&server, &session.state, &theme);
            f.render_widget(
                Paragraph::new(title_bar).style(Style::default().bg(Color::Rgb(30, 30, 30))),
                areas[0],
            );

            // [1] Conversation body (with optional camera pane)
            let (chat_area, camera_area) =
                tui_session_split(areas[1], session.state.show_camera_pane);

            let body_block = Block::default()
                .title(Span::styled(
                    " Conversation ",
                    Style::default().fg(theme.primary),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border_normal));
            let inner = body_block.inner(chat_area);
            session_view.body_height = (inner.height as usize).max(1);
            let entries = session.entries();
            let styled_lines = style_chat_entries(entries);
            let display_line_count = styled_lines.len();
            let scroll = effective_chat_scroll(entries, &session_view);
            let body = Paragraph::new(Text::from(styled_lines))
                .block(body_block)
                .wrap(Wrap { trim: false })
                .scroll((scroll as u16, 0));
            f.render_widget(body, chat_area);
            if display_line_count > session_view.body_height {
                let mut scrollbar_state = ScrollbarState::new(display_line_count).position(scroll);
                let scrollbar = Scrollbar::default()
                    .orientation(ScrollbarOrientation::VerticalRight)
                    .thumb_style(Style::default().fg(theme.text_muted));
                f.render_stateful_widget(scrollbar, chat_area, &mut scrollbar_state);
            }

            if let Some(pane) = camera_area {
                render_camera_panel(f, pane, &session.state.camera, Utc::now(), &theme);
            }

            // [2] Status / hint bar
            let hint_line = build_status_hint_bar(
                input.as_str(),
                completion_state.as_ref(),
                &session.state,
                &theme,
            );
            f.render_widget(
                Paragraph::new(hint_line).style(Style::default().bg(Color::Rgb(25, 25, 25))),
                areas[2],
            );

            // [3] Input area (multiline)
            let multiline_hint = if input.contains('\n') {
                " (multiline) "
            } else {
                ""
            };
            let input_block = Block::default()
                .title(Span::styled(
                    format!(" > {}", multiline_hint),
                    Style::default()
                        .fg(theme.primary)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border_active));
            let input_lines: Vec<Line<'_>> = input
                .split('\n')
                .map(|l| Line::from(l.to_string()))
                .collect();
            f.render_widget(
                Paragraph::new(Text::from(input_lines)).block(input_block),
                areas[3],
            );
            // Cursor at end of last line
            let last_line = input.rsplit('\n').next().unwrap_or(&input);
            let cursor_line_offset = input.chars().filter(|c| *c == '\n').count() as u16;
            let x = areas[3].x + 1 + last_line.chars().count() as u16;
            let y = areas[3].y + 1 + cursor_line_offset;
            f.set_cursor_position((x, y));
        })?;

        if !event::poll(Duration::from_millis(20))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                if key.code == KeyCode::Esc
                    || (key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL))
                {
                    should_quit = true;
                    continue;
                }

                if handle_session_scroll_key(
                    &key,
                    &mut session_view,
                    total_display_lines(session.entries()),
                ) {
                    continue;
                }

                if let Some(action) = detect_tui_shortcut(&key, &keymap) {
                    apply_tui_shortcut_action(action, session);
                    continue;
                }

                match key.code {
                    KeyCode::Tab => {
                        apply_slash_completion(&mut input, &mut completion_state, false);
                    }
                    KeyCode::BackTab => {
                        apply_slash_completion(&mut input, &mut completion_state, true);
                    }
                    KeyCode::Up => {
                        if let Some(prev) = input_history.up(&input) {
                            input = prev.to_string();
                        }
                    }
                    KeyCode::Down => {
                        if let Some(next) = input_history.down() {
                            input = next.to_string();
                        }
                    }
                    KeyCode::Enter
                        if key.modifiers.contains(KeyModifiers::SHIFT)
                            || key.modifiers.contains(KeyModifiers::ALT) =>
                    {
                        input.push('\n');
                    }
                    KeyCode::Enter => {
                        let line = std::mem::take(&mut input);
                        completion_state = None;
                        input_history.push(line.trim().to_string());
                        input_history.reset();
                        session_view.auto_follow = true;
                        if session.handle_line(&line) == CommandOutcome::Quit {
                            should_quit = true;
                        }
                    }
                    KeyCode::Backspace => {
                        input.pop();
                        completion_state = None;
                    }
                    KeyCode::Char(ch) => {
                        if !key.modifiers.contains(KeyModifiers::CONTROL) {
                            input.push(ch);
                            completion_state = None;
                        }
                    }
                    _ => {}
                }
            }
            Event::Mouse(mouse) => {
                let _ = handle_session_scroll_mouse(
                    &mouse,
                    &mut session_view,
                    total_display_lines(session.entries()),
                );
            }
            _ => {}
        }
    }

    Ok(())
}
