//! Input Handler - input history, keymap, slash command completion, scrolling.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use super::{TUI_SCROLL_STEP, TuiSessionViewState, calc_log_scroll_usize, effective_log_scroll};

#[derive(Debug, Clone)]
pub struct InputHistory {
    pub entries: Vec<String>,
    pub cursor: Option<usize>,
    pub draft: String,
    pub max_entries: usize,
}

impl InputHistory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            draft: String::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Record a submitted line; duplicates move to the end.
    pub fn push(&mut self, entry: String) {
        if entry.trim().is_empty() {
            return;
        }
        self.entries.retain(|e| e != &entry);
        self.entries.push(entry);
        if self.entries.len() > self.max_entries {
            self.entries.remove(0);
        }
        self.reset();
    }

    pub fn up(&mut self, current_input: &str) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        let next = match self.cursor {
            None => {
                self.draft = current_input.to_string();
                self.entries.len() - 1
            }
            Some(i) => i.saturating_sub(1),
        };
        self.cursor = Some(next);
        Some(self.entries[next].as_str())
    }

    /// Walk forward; past the newest entry the saved draft comes back.
    pub fn down(&mut self) -> Option<&str> {
        let i = self.cursor?;
        if i + 1 >= self.entries.len() {
            self.cursor = None;
            return Some(self.draft.as_str());
        }
        self.cursor = Some(i + 1);
        Some(self.entries[i + 1].as_str())
    }

    pub fn reset(&mut self) {
        self.cursor = None;
        self.draft.clear();
    }
}

#[derive(Debug, Clone)]
pub struct ChatKeymap {
    pub toggle_observations: char,
    pub toggle_camera_pane: char,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuiShortcutAction {
    ToggleObservations,
    ToggleCameraPane,
}

impl ChatKeymap {
    pub fn from_env() -> Self {
        Self {
            toggle_observations: env_char("VCHAT_KEY_TOGGLE_OBSERVATIONS", 'o'),
            toggle_camera_pane: env_char("VCHAT_KEY_TOGGLE_CAMERA", 'k'),
        }
    }
}

pub fn env_char(key: &str, default: char) -> char {
    std::env::var(key)
        .ok()
        .and_then(|v| v.chars().next())
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| c.is_ascii_alphanumeric())
        .unwrap_or(default)
}

pub fn key_is_ctrl_char(key: &KeyEvent, ch: char) -> bool {
    if !key.modifiers.contains(KeyModifiers::CONTROL) {
        return false;
    }
    match key.code {
        KeyCode::Char(c) => c.eq_ignore_ascii_case(&ch),
        _ => false,
    }
}

pub fn detect_tui_shortcut(key: &KeyEvent, keymap: &ChatKeymap) -> Option<TuiShortcutAction> {
    if key_is_ctrl_char(key, keymap.toggle_observations) {
        return Some(TuiShortcutAction::ToggleObservations);
    }
    if key_is_ctrl_char(key, keymap.toggle_camera_pane) {
        return Some(TuiShortcutAction::ToggleCameraPane);
    }
    None
}

// ── Slash commands ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CommandCompletionState {
    pub suggestions: Vec<String>,
    pub selected_index: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct SlashCommandSpec {
    pub command: &'static str,
    pub usage: &'static str,
    pub summary: &'static str,
}

pub const SLASH_COMMAND_SPECS: &[SlashCommandSpec] = &[
    SlashCommandSpec {
        command: "/help",
        usage: "/help",
        summary: "show help",
    },
    SlashCommandSpec {
        command: "/upload",
        usage: "/upload <path>",
        summary: "attach a file to the next message",
    },
    SlashCommandSpec {
        command: "/camera",
        usage: "/camera <user> <password> <ip> <channel> <subtype>",
        summary: "configure and connect the camera",
    },
    SlashCommandSpec {
        command: "/record",
        usage: "/record",
        summary: "start recording",
    },
    SlashCommandSpec {
        command: "/stop",
        usage: "/stop",
        summary: "stop recording",
    },
    SlashCommandSpec {
        command: "/model",
        usage: "/model [name]",
        summary: "show or set the model sent with each message",
    },
    SlashCommandSpec {
        command: "/observations",
        usage: "/observations [expand|collapse]",
        summary: "expand or collapse observation blocks",
    },
    SlashCommandSpec {
        command: "/copy",
        usage: "/copy",
        summary: "save the conversation to a text file",
    },
    SlashCommandSpec {
        command: "/quit",
        usage: "/quit",
        summary: "exit",
    },
];

pub fn canonical_slash_command(command: &str) -> &str {
    match command {
        "/help" | "/h" => "/help",
        "/upload" | "/u" | "/attach" => "/upload",
        "/camera" | "/cam" => "/camera",
        "/record" | "/rec" => "/record",
        "/stop" => "/stop",
        "/model" | "/m" => "/model",
        "/observations" | "/obs" | "/o" => "/observations",
        "/quit" | "/exit" | "/q" => "/quit",
        _ => command,
    }
}

pub fn slash_argument_options(command: &str) -> Option<&'static [&'static str]> {
    match canonical_slash_command(command) {
        "/observations" => Some(&["expand", "collapse"]),
        _ => None,
    }
}

pub fn parse_slash_tokens(input: &str) -> Option<(String, String, Vec<String>, bool)> {
    let raw = input.trim_start();
    if !raw.starts_with('/') {
        return None;
    }
    let trailing_space = raw.ends_with(' ');
    let mut iter = raw.split_whitespace();
    let command_raw = iter.next().unwrap_or("/").to_string();
    let command_norm = command_raw.to_ascii_lowercase();
    let args = iter.map(|value| value.to_string()).collect::<Vec<_>>();
    Some((command_raw, command_norm, args, trailing_space))
}

pub fn matching_slash_commands(prefix: &str) -> Vec<SlashCommandSpec> {
    let normalized = prefix.trim();
    if normalized.is_empty() || normalized == "/" {
        return SLASH_COMMAND_SPECS.to_vec();
    }
    SLASH_COMMAND_SPECS
        .iter()
        .copied()
        .filter(|spec| spec.command.starts_with(normalized))
        .collect()
}

pub fn completion_suggestions_for_input(input: &str) -> Vec<String> {
    let Some((command_raw, command_norm, args, trailing_space)) = parse_slash_tokens(input) else {
        return Vec::new();
    };
    if args.is_empty() && !trailing_space {
        return matching_slash_commands(command_norm.as_str())
            .into_iter()
            .map(|spec| spec.command.to_string())
            .collect();
    }
    if args.len() > 1 {
        return Vec::new();
    }
    let arg_prefix = args
        .first()
        .map(|a| a.to_ascii_lowercase())
        .unwrap_or_default();
    slash_argument_options(command_norm.as_str())
        .unwrap_or(&[])
        .iter()
        .filter(|option| option.starts_with(arg_prefix.as_str()))
        .map(|option| format!("{} {}", command_raw, option))
        .collect()
}

pub fn apply_slash_completion(
    input: &mut String,
    completion: &mut Option<CommandCompletionState>,
    reverse: bool,
) -> bool {
    if let Some(state) = completion.as_mut()
        && !state.suggestions.is_empty()
        && state.selected_index < state.suggestions.len()
        && input.trim() == state.suggestions[state.selected_index]
    {
        let len = state.suggestions.len();
        state.selected_index = if reverse {
            (state.selected_index + len - 1) % len
        } else {
            (state.selected_index + 1) % len
        };
        *input = state.suggestions[state.selected_index].clone();
        return true;
    }

    let suggestions = completion_suggestions_for_input(input);
    if suggestions.is_empty() {
        *completion = None;
        return false;
    }
    let selected_index = if reverse { suggestions.len() - 1 } else { 0 };
    *input = suggestions[selected_index].clone();
    *completion = Some(CommandCompletionState {
        suggestions,
        selected_index,
    });
    true
}

// ── Scrolling ───────────────────────────────────────────────────────

pub fn move_session_scroll(session_view: &mut TuiSessionViewState, log_count: usize, delta: isize) {
    let max_scroll = calc_log_scroll_usize(log_count, session_view.body_height);
    let current = effective_log_scroll(log_count, session_view) as isize;
    let next = (current + delta).clamp(0, max_scroll as isize) as usize;
    session_view.scroll_offset = next;
    session_view.auto_follow = next >= max_scroll;
}

pub fn handle_session_scroll_key(
    key: &KeyEvent,
    session_view: &mut TuiSessionViewState,
    log_count: usize,
) -> bool {
    let page = (session_view.body_height / 2).max(1) as isize;
    match key.code {
        KeyCode::Up if key.modifiers.contains(KeyModifiers::CONTROL) => {
            move_session_scroll(session_view, log_count, -1);
            true
        }
        KeyCode::Down if key.modifiers.contains(KeyModifiers::CONTROL) => {
            move_session_scroll(session_view, log_count, 1);
            true
        }
        KeyCode::PageUp => {
            move_session_scroll(session_view, log_count, -page);
            true
        }
        KeyCode::PageDown => {
            move_session_scroll(session_view, log_count, page);
            true
        }
        KeyCode::Home => {
            session_view.scroll_offset = 0;
            session_view.auto_follow = false;
            true
        }
        KeyCode::End => {
            session_view.scroll_offset = calc_log_scroll_usize(log_count, session_view.body_height);
            session_view.auto_follow = true;
            true
        }
        _ => false,
    }
}

pub fn handle_session_scroll_mouse(
    mouse: &MouseEvent,
    session_view: &mut TuiSessionViewState,
    log_count: usize,
) -> bool {
    match mouse.kind {
        MouseEventKind::ScrollUp => {
            move_session_scroll(session_view, log_count, -(TUI_SCROLL_STEP as isize));
            true
        }
        MouseEventKind::ScrollDown => {
            move_session_scroll(session_view, log_count, TUI_SCROLL_STEP as isize);
            true
        }
        _ => false,
    }
}
