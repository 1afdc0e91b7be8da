//! Error types shared by the core modules.

use thiserror::Error;

/// Failure to interpret the structured body of a tagged segment.
///
/// These never reach the user: the renderer treats an `Err` as "tag absent".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Camera connection parameters that cannot be sent yet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraConfigError {
    #[error("camera configuration incomplete, missing: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

/// An inbound stream frame that could not become a ChatEvent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("stream is closed")]
    StreamClosed,
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
