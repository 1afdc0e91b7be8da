//! CLI Tests

#[cfg(test)]
mod tests {
    use crate::cli::{Cli, CliError, Commands, load_config, render_jsonl};
    use clap::Parser;
    use std::error::Error;
    use std::io::Write;
    use std::path::PathBuf;

    /// Test CliError display implementations
    #[test]
    fn test_cli_error_display() {
        let error = CliError::InvalidInput("nothing to send".to_string());
        assert_eq!(format!("{}", error), "Invalid input: nothing to send");

        let error = CliError::RequestFailed("/chat returned 500: boom".to_string());
        assert_eq!(
            format!("{}", error),
            "Request failed: /chat returned 500: boom"
        );
        assert!(error.source().is_none());
    }

    #[test]
    fn test_no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["vchat"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "vchat",
            "send",
            "-m",
            "what is on the table?",
            "--media",
            "./cat.png",
            "--server",
            "http://cam-box:8000",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.server.as_deref(), Some("http://cam-box:8000"));
        match cli.command {
            Some(Commands::Send(args)) => {
                assert_eq!(args.message, "what is on the table?");
                assert_eq!(args.media, Some(PathBuf::from("./cat.png")));
                assert!(args.model.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_camera_flags() {
        let cli = Cli::try_parse_from([
            "vchat",
            "camera",
            "--username",
            "admin",
            "--ip",
            "10.0.0.5",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Camera(args)) => {
                assert_eq!(args.username, "admin");
                assert_eq!(args.password, "");
                assert_eq!(args.ip, "10.0.0.5");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_send_requires_message() {
        assert!(Cli::try_parse_from(["vchat", "send"]).is_err());
    }

    #[test]
    fn test_server_flag_overrides_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  base_url: http://from-file:8000").unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let cli = Cli::try_parse_from(["vchat", "--config", &path]).unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.server.base_url, "http://from-file:8000");

        let cli = Cli::try_parse_from([
            "vchat",
            "--config",
            &path,
            "--server",
            "https://flag:9000",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.server.ws_base(), "wss://flag:9000");
    }

    #[test]
    fn test_bad_server_flag_is_config_error() {
        let cli = Cli::try_parse_from(["vchat", "--server", "localhost:8000"]).unwrap();
        assert!(matches!(load_config(&cli), Err(CliError::ConfigFailed(_))));
    }

    #[test]
    fn test_render_jsonl_scenario() {
        let text = concat!(
            r#"{"role":"user","content":"Hello"}"#,
            "\n",
            r#"{"content":"<response>Hi there</response>"}"#,
            "\n\n",
            r#"{"content":"<final_code>print(1)</final_code>","media":[{"fileUrl":"https://x/1.png"},{"fileUrl":"https://x/2.png"}]}"#,
            "\n",
        );
        let (output, skipped) = render_jsonl(text, false);
        assert_eq!(skipped, 0);
        assert_eq!(
            output,
            "You:\n  [USER] Hello\nASSISTANT:\n  [RESPONSE] Hi there\nFinal result: https://x/2.png"
        );
    }

    #[test]
    fn test_render_jsonl_matches_transcript_visibility() {
        let text = concat!(
            r#"{"role":"planner","content":"<finalize_plan>done</finalize_plan>"}"#,
            "\n",
            r#"{"role":"coder","content":"plot"}"#,
            "\n",
            r#"{"role":"coder","content":"<final_code>x</final_code>"}"#,
            "\n",
        );
        let (output, skipped) = render_jsonl(text, false);
        assert_eq!(skipped, 0);
        assert_eq!(output, "CODER:\n  [CODER] plot");
    }

    #[test]
    fn test_render_jsonl_skips_malformed_lines() {
        let text = "not json\n{\"role\":\"coder\",\"content\":\"no tags here\"}\n{\"role\":\"user\"}\n";
        let (output, skipped) = render_jsonl(text, false);
        assert_eq!(skipped, 2);
        assert_eq!(output, "CODER:\n  [CODER] no tags here");
    }

    #[test]
    fn test_render_jsonl_observation_expansion() {
        let text = r#"{"role":"observation","content":"line one\nline two"}"#;
        let (collapsed, _) = render_jsonl(text, false);
        assert_eq!(collapsed, "OBSERVATION:\n  ▸ Observation (collapsed)");
        let (expanded, _) = render_jsonl(text, true);
        assert_eq!(
            expanded,
            "OBSERVATION:\n  ▾ Observation\n    line one\n    line two"
        );
    }
}
