//! CLI - Command Line Interface
//!
//! Available Commands:
//! - vchat [tui]                 - Interactive chat with camera pane (default)
//! - vchat render <file>         - Print the visible transcript of a JSON-lines capture
//! - vchat send -m "message"     - Submit a one-message transcript
//! - vchat camera --username ... - Push a camera configuration

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use vchat_core::{
    CameraConfig, Media, Transcript, VchatConfig, compose_outbound, ingest_frame, render,
};
use vchat_tui::{
    ChatEntry, ChatKeymap, ChatSession, ChatViewState, entries_to_plain_text, push_chat_entry,
    push_message_entry, run_chat_tui,
};

use crate::backend::ServerBackend;
use crate::logging::{LogTarget, init_logging};
use crate::transport::BackendClient;

/// CLI Errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    ConfigFailed(String),

    #[error("Logging setup failed: {0}")]
    LoggingFailed(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    IoFailed(String),

    #[error("Terminal error: {0}")]
    TerminalFailed(String),
}

/// vchat CLI
#[derive(Parser, Debug)]
#[command(name = "vchat")]
#[command(author, version, about = "Terminal chat for a vision agent, with camera control", long_about = None)]
pub(crate) struct Cli {
    /// Config file (defaults to ./vchat.yaml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Server base URL, e.g. http://localhost:8000
    #[arg(short, long, global = true)]
    pub server: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Interactive terminal UI
    Tui(TuiArgs),

    /// Print the visible transcript of a JSON-lines file of inbound payloads
    Render(RenderArgs),

    /// Submit a single message
    Send(SendArgs),

    /// Push a camera configuration
    Camera(CameraArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct TuiArgs {
    /// Model requested from the server
    #[arg(short = 'M', long)]
    pub model: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct RenderArgs {
    /// JSON-lines file, one inbound payload per line
    pub file: PathBuf,

    /// Show observation bodies instead of collapsing them
    #[arg(long)]
    pub expand_observations: bool,
}

#[derive(Args, Debug)]
pub(crate) struct SendArgs {
    /// Message text
    #[arg(short = 'm', long)]
    pub message: String,

    /// Media file uploaded and attached to the message
    #[arg(long)]
    pub media: Option<PathBuf>,

    /// Model requested from the server
    #[arg(short = 'M', long)]
    pub model: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct CameraArgs {
    #[arg(long, default_value = "")]
    pub username: String,
    #[arg(long, default_value = "")]
    pub password: String,
    #[arg(long, default_value = "")]
    pub ip: String,
    #[arg(long, default_value = "")]
    pub channel: String,
    #[arg(long, default_value = "")]
    pub subtype: String,
}

/// Parse CLI arguments and execute commands
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();
    let mut config = load_config(&cli)?;

    let interactive = matches!(cli.command, None | Some(Commands::Tui(_)));
    let target = LogTarget::for_command(interactive, cli.verbose, &config.logging.directory);
    init_logging(&target, cli.verbose)?;

    match cli.command {
        None => cmd_tui(TuiArgs::default(), &mut config).await,
        Some(Commands::Tui(args)) => cmd_tui(args, &mut config).await,
        Some(Commands::Render(args)) => cmd_render(args, &config),
        Some(Commands::Send(args)) => cmd_send(args, &mut config).await,
        Some(Commands::Camera(args)) => cmd_camera(args, &config).await,
    }
}

/// Defaults, then file, then environment, then command-line flags.
pub(crate) fn load_config(cli: &Cli) -> Result<VchatConfig, CliError> {
    let mut config = VchatConfig::load(cli.config.as_deref())
        .map_err(|e| CliError::ConfigFailed(e.to_string()))?;
    if let Some(server) = cli.server.as_ref() {
        config.server.base_url = server.clone();
    }
    config
        .validate()
        .map_err(|e| CliError::ConfigFailed(e.to_string()))?;
    Ok(config)
}

async fn cmd_tui(args: TuiArgs, config: &mut VchatConfig) -> Result<(), CliError> {
    if args.model.is_some() {
        config.chat.model = args.model;
    }
    let backend = ServerBackend::new(&config.server)
        .map_err(|e| CliError::RequestFailed(e.to_string()))?;
    info!(server = %config.server.http_base(), "starting TUI");

    let mut session = ChatSession::new(Arc::new(backend), ChatViewState::from_config(config));
    run_chat_tui(&mut session, ChatKeymap::from_env())
        .await
        .map_err(|e| CliError::TerminalFailed(e.to_string()))
}

/// Ingest JSON-lines text and render the visible transcript as plain text.
/// Returns the text and the number of skipped lines.
pub fn render_jsonl(text: &str, expand_observations: bool) -> (String, usize) {
    let mut transcript = Transcript::new();
    let mut entries = Vec::new();
    let mut skipped = 0usize;

    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut results = Vec::new();
        let mut viewer = |url: &str| results.push(url.to_string());
        let before = transcript.len();
        match ingest_frame(line, &mut transcript, &mut viewer) {
            // Hidden events only contribute their result link.
            Ok(_) => {
                for event in transcript.visible_since(before) {
                    push_message_entry(&mut entries, render(event), expand_observations);
                }
            }
            Err(e) => {
                warn!(line = index + 1, error = %e, "skipping malformed line");
                skipped += 1;
            }
        }
        for url in results {
            push_chat_entry(&mut entries, ChatEntry::ResultNote(url));
        }
    }
    (entries_to_plain_text(&entries), skipped)
}

fn cmd_render(args: RenderArgs, config: &VchatConfig) -> Result<(), CliError> {
    let text = std::fs::read_to_string(&args.file)
        .map_err(|e| CliError::IoFailed(format!("{}: {}", args.file.display(), e)))?;
    let expand = args.expand_observations || config.ui.expand_observations;
    let (output, skipped) = render_jsonl(&text, expand);
    if !output.is_empty() {
        println!("{}", output);
    }
    if skipped > 0 {
        eprintln!("skipped {} malformed line(s)", skipped);
    }
    Ok(())
}

async fn cmd_send(args: SendArgs, config: &mut VchatConfig) -> Result<(), CliError> {
    if args.model.is_some() {
        config.chat.model = args.model;
    }
    let client = BackendClient::new(&config.server)
        .map_err(|e| CliError::RequestFailed(e.to_string()))?;

    let media = match args.media.as_deref() {
        Some(path) => Some(upload(&client, path).await?),
        None => None,
    };
    let Some(event) = compose_outbound(&Transcript::new(), &args.message, media) else {
        return Err(CliError::InvalidInput("nothing to send".to_string()));
    };

    let ack = client
        .submit_chat(std::slice::from_ref(&event), config.chat.model.as_deref())
        .await
        .map_err(|e| CliError::RequestFailed(e.to_string()))?;
    println!("{}", ack.summary());
    Ok(())
}

async fn upload(client: &BackendClient, path: &Path) -> Result<Media, CliError> {
    let media = client
        .upload_media(path)
        .await
        .map_err(|e| CliError::RequestFailed(e.to_string()))?;
    println!("Uploaded: {}", media.file_url);
    Ok(media)
}

async fn cmd_camera(args: CameraArgs, config: &VchatConfig) -> Result<(), CliError> {
    let camera = CameraConfig::new(
        args.username,
        args.password,
        args.ip,
        args.channel,
        args.subtype,
    );
    camera
        .validate()
        .map_err(|e| CliError::InvalidInput(e.to_string()))?;
    let camera = camera.trimmed();

    let client = BackendClient::new(&config.server)
        .map_err(|e| CliError::RequestFailed(e.to_string()))?;
    client
        .set_camera_config(&camera)
        .await
        .map_err(|e| CliError::RequestFailed(e.to_string()))?;
    println!(
        "Camera configured: {} channel {} subtype {}",
        camera.ip, camera.channel, camera.subtype
    );
    Ok(())
}
