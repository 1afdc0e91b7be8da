//! Slash command parsing and help text.

use std::path::PathBuf;

use vchat_core::CameraConfig;

use super::{SLASH_COMMAND_SPECS, canonical_slash_command, parse_slash_tokens};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Upload(PathBuf),
    Camera(CameraConfig),
    Record,
    Stop,
    /// `None` shows the current model.
    Model(Option<String>),
    /// `None` toggles.
    Observations(Option<bool>),
    Copy,
    Quit,
}

/// Parse a `/command args...` line. `Err` carries a usage message.
pub fn parse_slash_command(input: &str) -> Result<SlashCommand, String> {
    let Some((raw, norm, args, _)) = parse_slash_tokens(input) else {
        return Err("commands start with '/'".to_string());
    };
    match canonical_slash_command(&norm) {
        "/help" => Ok(SlashCommand::Help),
        "/upload" => {
            // Paths may contain spaces: take everything after the command.
            let rest = input.trim_start()[raw.len()..].trim();
            if rest.is_empty() {
                Err("Usage: /upload <path>".to_string())
            } else {
                Ok(SlashCommand::Upload(PathBuf::from(rest)))
            }
        }
        "/camera" => match args.as_slice() {
            [username, password, ip, channel, subtype] => Ok(SlashCommand::Camera(
                CameraConfig::new(username, password, ip, channel, subtype),
            )),
            _ => Err("Usage: /camera <user> <password> <ip> <channel> <subtype>".to_string()),
        },
        "/record" => Ok(SlashCommand::Record),
        "/stop" => Ok(SlashCommand::Stop),
        "/model" => Ok(SlashCommand::Model(args.first().cloned())),
        "/observations" => match args.first().map(|a| a.to_ascii_lowercase()).as_deref() {
            None => Ok(SlashCommand::Observations(None)),
            Some("expand" | "on" | "show") => Ok(SlashCommand::Observations(Some(true))),
            Some("collapse" | "off" | "hide") => Ok(SlashCommand::Observations(Some(false))),
            Some(_) => Err("Usage: /observations [expand|collapse]".to_string()),
        },
        "/copy" => Ok(SlashCommand::Copy),
        "/quit" => Ok(SlashCommand::Quit),
        other => Err(format!("Unknown command: {} (try /help)", other)),
    }
}

pub fn help_lines() -> Vec<String> {
    let width = SLASH_COMMAND_SPECS
        .iter()
        .map(|s| s.usage.len())
        .max()
        .unwrap_or(0);
    let mut lines = vec!["Commands:".to_string()];
    lines.extend(
        SLASH_COMMAND_SPECS
            .iter()
            .map(|spec| format!("  {:<width$}  {}", spec.usage, spec.summary)),
    );
    lines.push("Keys: Enter send, ↑↓ history, PgUp/PgDn scroll, Ctrl+O observations, Esc quit".to_string());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_commands() {
        assert_eq!(parse_slash_command("/help"), Ok(SlashCommand::Help));
        assert_eq!(parse_slash_command("  /REC"), Ok(SlashCommand::Record));
        assert_eq!(parse_slash_command("/stop"), Ok(SlashCommand::Stop));
        assert_eq!(parse_slash_command("/q"), Ok(SlashCommand::Quit));
        assert_eq!(parse_slash_command("/copy"), Ok(SlashCommand::Copy));
    }

    #[test]
    fn test_parse_upload_keeps_spaces_in_path() {
        assert_eq!(
            parse_slash_command("/upload ./my photos/cat.png "),
            Ok(SlashCommand::Upload(PathBuf::from("./my photos/cat.png")))
        );
        assert!(parse_slash_command("/upload").is_err());
    }

    #[test]
    fn test_parse_camera_requires_five_fields() {
        assert_eq!(
            parse_slash_command("/camera admin pw 10.0.0.5 1 0"),
            Ok(SlashCommand::Camera(CameraConfig::new(
                "admin", "pw", "10.0.0.5", "1", "0"
            )))
        );
        let err = parse_slash_command("/camera admin pw").unwrap_err();
        assert!(err.starts_with("Usage: /camera"));
    }

    #[test]
    fn test_parse_model_and_observations() {
        assert_eq!(parse_slash_command("/model"), Ok(SlashCommand::Model(None)));
        assert_eq!(
            parse_slash_command("/model llava"),
            Ok(SlashCommand::Model(Some("llava".to_string())))
        );
        assert_eq!(
            parse_slash_command("/obs expand"),
            Ok(SlashCommand::Observations(Some(true)))
        );
        assert_eq!(
            parse_slash_command("/observations"),
            Ok(SlashCommand::Observations(None))
        );
        assert!(parse_slash_command("/observations sideways").is_err());
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            parse_slash_command("/dance"),
            Err("Unknown command: /dance (try /help)".to_string())
        );
    }

    #[test]
    fn test_help_lists_every_command() {
        let help = help_lines().join("\n");
        for spec in SLASH_COMMAND_SPECS {
            assert!(help.contains(spec.usage));
        }
    }
}
