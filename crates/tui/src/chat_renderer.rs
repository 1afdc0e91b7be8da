//! Chat Renderer - structured chat entry model and rendering.
//!
//! Transcript events arrive here already rendered by `vchat_core::render`;
//! this module only decides how each block node looks in the terminal.

use ratatui::layout::Alignment as LineAlignment;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use vchat_core::{ATTACHMENT_LABEL, Alignment, BlockNode, BubbleTone, RenderedBlock, Role};

use super::TuiSessionViewState;

#[derive(Debug, Clone, Copy)]
pub struct TuiTheme {
    pub text_strong: Color,
    pub text_base: Color,
    pub text_muted: Color,
    pub text_dim: Color,
    pub primary: Color,
    pub success: Color,
    pub warning: Color,
    pub danger: Color,
    pub info: Color,
    pub user_accent: Color,
    pub assistant_accent: Color,
    pub secondary_accent: Color,
    pub observation_accent: Color,
    pub code: Color,
    pub border_normal: Color,
    pub border_active: Color,
    pub border_dim: Color,
}

impl TuiTheme {
    pub fn default_dark() -> Self {
        Self {
            text_strong: Color::White,
            text_base: Color::Gray,
            text_muted: Color::DarkGray,
            text_dim: Color::Rgb(100, 100, 100),
            primary: Color::Cyan,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            info: Color::Blue,
            user_accent: Color::Blue,
            assistant_accent: Color::Cyan,
            secondary_accent: Color::Rgb(150, 150, 150),
            observation_accent: Color::Magenta,
            code: Color::Rgb(180, 200, 140),
            border_normal: Color::DarkGray,
            border_active: Color::Cyan,
            border_dim: Color::Rgb(60, 60, 60),
        }
    }

    pub fn tone_accent(&self, tone: BubbleTone) -> Color {
        match tone {
            BubbleTone::Outbound => self.user_accent,
            BubbleTone::Assistant => self.assistant_accent,
            BubbleTone::Secondary => self.secondary_accent,
        }
    }
}

/// A single structured entry in the conversation pane.
#[derive(Debug, Clone)]
pub enum ChatEntry {
    /// Visual separator (blank line)
    Separator,
    /// One visible transcript event
    Message(RenderedBlock),
    /// Local note (help text, command feedback)
    SystemNote(String),
    /// Final result announced by the server
    ResultNote(String),
    /// Error message
    ErrorNote(String),
    /// Warning message
    WarningNote(String),
}

/// Upper bound on local entries (notes and separators). Transcript
/// messages are never dropped from the view.
pub const TUI_MAX_CHAT_ENTRIES: usize = 3000;

pub fn push_chat_entry(entries: &mut Vec<ChatEntry>, entry: ChatEntry) {
    entries.push(entry);
    if entries.len() <= TUI_MAX_CHAT_ENTRIES {
        return;
    }
    let local = entries
        .iter()
        .filter(|e| !matches!(e, ChatEntry::Message(_)))
        .count();
    if local <= TUI_MAX_CHAT_ENTRIES {
        return;
    }
    if let Some(oldest) = entries
        .iter()
        .position(|e| !matches!(e, ChatEntry::Message(_)))
    {
        entries.remove(oldest);
    }
}

/// Push a transcript block, collapsing or expanding its observation nodes.
pub fn push_message_entry(
    entries: &mut Vec<ChatEntry>,
    mut block: RenderedBlock,
    expand_observations: bool,
) {
    set_block_observations(&mut block, expand_observations);
    push_chat_entry(entries, ChatEntry::Message(block));
}

/// Bridge function: push a plain text string as a typed ChatEntry.
/// Empty text becomes Separator; "[Error]" prefix becomes ErrorNote;
/// "[Warning]" or "[Tip]" becomes WarningNote; everything else SystemNote.
pub fn push_text_entry(entries: &mut Vec<ChatEntry>, text: &str) {
    if text.is_empty() {
        push_chat_entry(entries, ChatEntry::Separator);
    } else if text.starts_with("[Error]") {
        push_chat_entry(entries, ChatEntry::ErrorNote(text.to_string()));
    } else if text.starts_with("[Warning]") || text.starts_with("[Tip]") {
        push_chat_entry(entries, ChatEntry::WarningNote(text.to_string()));
    } else {
        push_chat_entry(entries, ChatEntry::SystemNote(text.to_string()));
    }
}

// ── Block nodes → lines ─────────────────────────────────────────────

/// Lines of a single block node, without the bubble gutter.
fn node_lines(node: &BlockNode, accent: Color, theme: &TuiTheme) -> Vec<Vec<Span<'static>>> {
    let label_style = Style::default().fg(accent).add_modifier(Modifier::BOLD);
    let text_style = Style::default().fg(theme.text_base);
    let mut out = Vec::new();
    match node {
        BlockNode::Labeled { label, text } => {
            let mut rows = text.lines();
            let mut first = vec![Span::styled(label.clone(), label_style)];
            if let Some(row) = rows.next() {
                first.push(Span::raw(" "));
                first.push(Span::styled(row.to_string(), text_style));
            }
            out.push(first);
            for row in rows {
                out.push(vec![Span::styled(row.to_string(), text_style)]);
            }
        }
        BlockNode::Code { label, code } => {
            out.push(vec![Span::styled(label.clone(), label_style)]);
            for row in code.lines() {
                out.push(vec![Span::styled(
                    format!("  {}", row),
                    Style::default().fg(theme.code),
                )]);
            }
        }
        BlockNode::Plan {
            label,
            summary,
            instructions,
        } => {
            out.push(vec![
                Span::styled(label.clone(), label_style),
                Span::raw(" "),
                Span::styled(summary.clone(), Style::default().fg(theme.text_strong)),
            ]);
            for (i, step) in instructions.iter().enumerate() {
                out.push(vec![
                    Span::styled(format!("  {}. ", i + 1), Style::default().fg(accent)),
                    Span::styled(step.clone(), text_style),
                ]);
            }
        }
        BlockNode::FunctionCalls { label, names } => {
            out.push(vec![
                Span::styled(label.clone(), label_style),
                Span::styled(" Function calls:", Style::default().fg(theme.text_strong)),
            ]);
            for name in names {
                out.push(vec![
                    Span::styled("  - ", Style::default().fg(accent)),
                    Span::styled(name.clone(), Style::default().fg(theme.text_strong)),
                ]);
            }
        }
        BlockNode::Collapsible {
            label,
            body,
            collapsed,
        } => {
            let style = Style::default().fg(theme.observation_accent);
            if *collapsed {
                out.push(vec![
                    Span::styled("▸ ", style),
                    Span::styled(format!("{} (collapsed)", label), style),
                ]);
            } else {
                out.push(vec![
                    Span::styled("▾ ", style),
                    Span::styled(label.clone(), style.add_modifier(Modifier::BOLD)),
                ]);
                for row in body.lines() {
                    out.push(vec![Span::styled(
                        format!("  {}", row),
                        Style::default().fg(theme.text_muted),
                    )]);
                }
            }
        }
        BlockNode::Attachment { url } => {
            out.push(vec![
                Span::styled(
                    format!("⧉ {}: ", ATTACHMENT_LABEL),
                    Style::default().fg(theme.info),
                ),
                Span::styled(
                    url.clone(),
                    Style::default()
                        .fg(theme.info)
                        .add_modifier(Modifier::UNDERLINED),
                ),
            ]);
        }
    }
    out
}

fn bubble_title(role: &Role) -> String {
    match role {
        Role::User => "You".to_string(),
        Role::InteractionResponse => "You (reply)".to_string(),
        other => other.label(),
    }
}

fn message_body(block: &RenderedBlock, theme: &TuiTheme) -> Vec<Vec<Span<'static>>> {
    let accent = theme.tone_accent(block.tone);
    block
        .nodes
        .iter()
        .flat_map(|node| node_lines(node, accent, theme))
        .collect()
}

fn spans_plain(spans: &[Span<'_>]) -> String {
    spans.iter().map(|s| s.content.as_ref()).collect()
}

// ── Entry rendering ─────────────────────────────────────────────────

/// Count the number of rendered display lines a single ChatEntry will produce.
pub fn chat_entry_display_lines(entry: &ChatEntry) -> usize {
    match entry {
        ChatEntry::Message(block) => {
            // header + body + footer
            let theme = TuiTheme::default_dark();
            2 + message_body(block, &theme).len().max(1)
        }
        ChatEntry::Separator
        | ChatEntry::SystemNote(_)
        | ChatEntry::ResultNote(_)
        | ChatEntry::ErrorNote(_)
        | ChatEntry::WarningNote(_) => 1,
    }
}

/// Total rendered display lines for a slice of entries.
pub fn total_display_lines(entries: &[ChatEntry]) -> usize {
    entries.iter().map(chat_entry_display_lines).sum()
}

/// Render structured chat entries to styled ratatui Lines.
pub fn style_chat_entries(entries: &[ChatEntry]) -> Vec<Line<'static>> {
    let theme = TuiTheme::default_dark();
    let mut lines = Vec::new();
    for entry in entries {
        style_chat_entry(entry, &theme, &mut lines);
    }
    lines
}

/// Render a single ChatEntry into styled Lines.
pub fn style_chat_entry(entry: &ChatEntry, theme: &TuiTheme, lines: &mut Vec<Line<'static>>) {
    match entry {
        ChatEntry::Separator => {
            lines.push(Line::default());
        }
        ChatEntry::Message(block) => style_message(block, theme, lines),
        ChatEntry::SystemNote(text) => {
            lines.push(Line::from(vec![
                Span::styled("  ◆ ", Style::default().fg(theme.primary)),
                Span::styled(text.clone(), Style::default().fg(theme.text_base)),
            ]));
        }
        ChatEntry::ResultNote(url) => {
            lines.push(Line::from(vec![
                Span::styled(
                    "  ★ ",
                    Style::default()
                        .fg(theme.success)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled("Final result: ", Style::default().fg(theme.success)),
                Span::styled(
                    url.clone(),
                    Style::default()
                        .fg(theme.info)
                        .add_modifier(Modifier::UNDERLINED),
                ),
            ]));
        }
        ChatEntry::ErrorNote(text) => {
            lines.push(Line::from(vec![
                Span::styled(
                    "  ✗ ",
                    Style::default()
                        .fg(theme.danger)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(text.clone(), Style::default().fg(theme.danger)),
            ]));
        }
        ChatEntry::WarningNote(text) => {
            lines.push(Line::from(vec![
                Span::styled(
                    "  ⚠ ",
                    Style::default()
                        .fg(theme.warning)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(text.clone(), Style::default().fg(theme.warning)),
            ]));
        }
    }
}

fn style_message(block: &RenderedBlock, theme: &TuiTheme, lines: &mut Vec<Line<'static>>) {
    let accent = theme.tone_accent(block.tone);
    let gutter = Style::default().fg(accent);
    let title = Span::styled(
        bubble_title(&block.role),
        Style::default().fg(accent).add_modifier(Modifier::BOLD),
    );
    let mut body = message_body(block, theme);
    if body.is_empty() {
        body.push(vec![Span::raw("")]);
    }

    match block.alignment {
        Alignment::Left => {
            lines.push(Line::from(vec![Span::styled("▌ ", gutter), title]));
            for spans in body {
                let mut row = vec![Span::styled("│ ", gutter)];
                row.extend(spans);
                lines.push(Line::from(row));
            }
            lines.push(Line::from(Span::styled("└─", gutter)));
        }
        Alignment::Right => {
            lines.push(Line::from(vec![title, Span::styled(" ▐", gutter)]).alignment(LineAlignment::Right));
            for mut spans in body {
                spans.push(Span::styled(" │", gutter));
                lines.push(Line::from(spans).alignment(LineAlignment::Right));
            }
            lines.push(Line::from(Span::styled("─┘", gutter)).alignment(LineAlignment::Right));
        }
    }
}

/// Compute effective scroll offset for chat entries (display-line based).
pub fn effective_chat_scroll(entries: &[ChatEntry], view: &TuiSessionViewState) -> usize {
    let total = total_display_lines(entries);
    if view.auto_follow || total <= view.body_height {
        total.saturating_sub(view.body_height)
    } else {
        view.scroll_offset
            .min(total.saturating_sub(view.body_height))
    }
}

fn set_block_observations(block: &mut RenderedBlock, expanded: bool) {
    for node in block.nodes.iter_mut() {
        if let BlockNode::Collapsible { collapsed, .. } = node {
            *collapsed = !expanded;
        }
    }
}

/// Expand or collapse every observation block in entries.
pub fn set_all_observations(entries: &mut [ChatEntry], expanded: bool) {
    for entry in entries.iter_mut() {
        if let ChatEntry::Message(block) = entry {
            set_block_observations(block, expanded);
        }
    }
}

/// Convert ChatEntry list to plain text for export (/copy command).
pub fn entries_to_plain_text(entries: &[ChatEntry]) -> String {
    let theme = TuiTheme::default_dark();
    let mut lines = Vec::new();
    for entry in entries {
        match entry {
            ChatEntry::Separator => lines.push(String::new()),
            ChatEntry::Message(block) => {
                lines.push(format!("{}:", bubble_title(&block.role)));
                for spans in message_body(block, &theme) {
                    lines.push(format!("  {}", spans_plain(&spans)));
                }
            }
            ChatEntry::ResultNote(url) => lines.push(format!("Final result: {}", url)),
            ChatEntry::SystemNote(text)
            | ChatEntry::ErrorNote(text)
            | ChatEntry::WarningNote(text) => {
                lines.push(text.clone());
            }
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use vchat_core::{ChatEvent, Media, render};

    #[test]
    fn test_user_message_is_right_aligned() {
        let entry = message_entry(ChatEvent::user("hello world"));
        let theme = TuiTheme::default_dark();
        let mut lines = Vec::new();
        style_chat_entry(&entry, &theme, &mut lines);
        assert_eq!(lines.len(), 3); // header + content + footer
        assert!(
            lines
                .iter()
                .all(|l| l.alignment == Some(LineAlignment::Right))
        );
        let rendered: Vec<String> = lines.iter().map(line_plain).collect();
        assert!(rendered[0].starts_with("You"));
        assert_eq!(rendered[1], "[USER] hello world │");
        assert_eq!(rendered[2], "─┘");
    }

    #[test]
    fn test_response_message_rendering() {
        let entry = message_entry(ChatEvent::assistant("<response>Hi there</response>"));
        let rendered = entry_lines_plain(&entry);
        assert_eq!(
            rendered,
            vec![
                "▌ ASSISTANT".to_string(),
                "│ [RESPONSE] Hi there".to_string(),
                "└─".to_string(),
            ]
        );
    }

    #[test]
    fn test_plan_and_function_calls_rendering() {
        let content = concat!(
            r#"<json>{"plan":"Step A","instructions":["do X","do Y"]}</json>"#,
            r#"<interaction>[{"request":{"function_name":"pick_region"}}]</interaction>"#,
        );
        let entry = message_entry(ChatEvent::new(Role::Planner, content));
        let rendered = entry_lines_plain(&entry);
        assert_eq!(rendered[1], "│ [PLANNER] Step A");
        assert_eq!(rendered[2], "│   1. do X");
        assert_eq!(rendered[3], "│   2. do Y");
        assert_eq!(rendered[4], "│ [PLANNER] Function calls:");
        assert_eq!(rendered[5], "│   - pick_region");
        assert_eq!(chat_entry_display_lines(&entry), rendered.len());
    }

    #[test]
    fn test_observation_collapsed_then_expanded() {
        let mut entries = vec![message_entry(ChatEvent::new(
            Role::Observation,
            "line one\nline two",
        ))];
        let collapsed = entry_lines_plain(&entries[0]);
        assert_eq!(collapsed[1], "│ ▸ Observation (collapsed)");
        assert_eq!(total_display_lines(&entries), 3);

        set_all_observations(&mut entries, true);
        let expanded = entry_lines_plain(&entries[0]);
        assert_eq!(expanded[1], "│ ▾ Observation");
        assert_eq!(expanded[2], "│   line one");
        assert_eq!(expanded[3], "│   line two");
        assert_eq!(total_display_lines(&entries), 5);
    }

    #[test]
    fn test_push_message_entry_respects_expand_flag() {
        let mut entries = Vec::new();
        let block = render(&ChatEvent::new(Role::Observation, "raw"));
        push_message_entry(&mut entries, block, true);
        let rendered = entry_lines_plain(&entries[0]);
        assert_eq!(rendered[1], "│ ▾ Observation");
    }

    #[test]
    fn test_media_links_follow_body() {
        let event = ChatEvent::new(Role::Coder, "<execute_python>\nplot()\n</execute_python>")
            .with_media(vec![Media::new("a", "http://h/a.png")]);
        let rendered = entry_lines_plain(&message_entry(event));
        assert_eq!(rendered[1], "│ [EXECUTE PYTHON]");
        assert_eq!(rendered[2], "│   plot()");
        assert_eq!(rendered[3], "│ ⧉ View Media: http://h/a.png");
    }

    #[test]
    fn test_push_chat_entry_cap() {
        let mut entries = Vec::new();
        for i in 0..(TUI_MAX_CHAT_ENTRIES + 5) {
            push_chat_entry(&mut entries, ChatEntry::SystemNote(format!("note-{}", i)));
        }
        assert_eq!(entries.len(), TUI_MAX_CHAT_ENTRIES);
        if let ChatEntry::SystemNote(text) = &entries[0] {
            assert_eq!(text, "note-5");
        } else {
            panic!("expected SystemNote");
        }
    }

    #[test]
    fn test_push_chat_entry_keeps_every_message() {
        let mut entries = Vec::new();
        push_text_entry(&mut entries, "welcome");
        for i in 0..(TUI_MAX_CHAT_ENTRIES + 10) {
            let event = ChatEvent::new(Role::User, format!("m{}", i));
            push_message_entry(&mut entries, render(&event), false);
        }
        assert_eq!(entries.len(), TUI_MAX_CHAT_ENTRIES + 11);
        assert!(matches!(&entries[0], ChatEntry::SystemNote(text) if text == "welcome"));

        for i in 0..(TUI_MAX_CHAT_ENTRIES + 1) {
            push_text_entry(&mut entries, &format!("note-{}", i));
        }
        let messages = entries
            .iter()
            .filter(|e| matches!(e, ChatEntry::Message(_)))
            .count();
        assert_eq!(messages, TUI_MAX_CHAT_ENTRIES + 10);
        assert_eq!(entries.len() - messages, TUI_MAX_CHAT_ENTRIES);
        assert!(matches!(&entries[0], ChatEntry::Message(_)));
    }

    #[test]
    fn test_push_text_entry_classifies_prefixes() {
        let mut entries = Vec::new();
        push_text_entry(&mut entries, "[Error] boom");
        push_text_entry(&mut entries, "[Warning] careful");
        push_text_entry(&mut entries, "");
        push_text_entry(&mut entries, "plain");
        assert!(matches!(entries[0], ChatEntry::ErrorNote(_)));
        assert!(matches!(entries[1], ChatEntry::WarningNote(_)));
        assert!(matches!(entries[2], ChatEntry::Separator));
        assert!(matches!(entries[3], ChatEntry::SystemNote(_)));
    }

    #[test]
    fn test_effective_chat_scroll_auto_follow() {
        let entries = vec![
            message_entry(ChatEvent::user("hi")),
            message_entry(ChatEvent::assistant("hello there\nline2\nline3")),
        ];
        // total display lines = 3 + 5 = 8
        let view = TuiSessionViewState {
            scroll_offset: 0,
            auto_follow: true,
            body_height: 5,
        };
        assert_eq!(effective_chat_scroll(&entries, &view), 3);
    }

    #[test]
    fn test_effective_chat_scroll_manual() {
        let entries: Vec<ChatEntry> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|s| ChatEntry::SystemNote(s.to_string()))
            .collect();
        let view = TuiSessionViewState {
            scroll_offset: 2,
            auto_follow: false,
            body_height: 3,
        };
        assert_eq!(effective_chat_scroll(&entries, &view), 2);
    }

    #[test]
    fn test_entries_to_plain_text() {
        let entries = vec![
            message_entry(ChatEvent::user("Hello")),
            message_entry(ChatEvent::assistant("<response>Hi there</response>")),
            ChatEntry::ResultNote("https://x/2.png".to_string()),
        ];
        let text = entries_to_plain_text(&entries);
        assert_eq!(
            text,
            "You:\n  [USER] Hello\nASSISTANT:\n  [RESPONSE] Hi there\nFinal result: https://x/2.png"
        );
    }
}
