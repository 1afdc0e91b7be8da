//! tracing-subscriber setup.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::cli::CliError;

pub const LOG_FILE_NAME: &str = "vchat.log";

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Nothing is installed.
    Off,
    Stderr,
    /// Appended to a file; the TUI owns the terminal.
    File(PathBuf),
}

impl LogTarget {
    pub fn for_command(interactive: bool, verbose: bool, directory: &Path) -> Self {
        if interactive {
            LogTarget::File(directory.join(LOG_FILE_NAME))
        } else if verbose {
            LogTarget::Stderr
        } else {
            LogTarget::Off
        }
    }
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`.
pub fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }))
}

pub fn init_logging(target: &LogTarget, verbose: bool) -> Result<(), CliError> {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter(verbose));
    let result = match target {
        LogTarget::Off => return Ok(()),
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CliError::LoggingFailed(format!("{}: {}", parent.display(), e)))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| CliError::LoggingFailed(format!("{}: {}", path.display(), e)))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };
    result.map_err(|e| CliError::LoggingFailed(e.to_string()))
}
