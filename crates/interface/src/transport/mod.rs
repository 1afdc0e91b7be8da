//! Transport - 与服务端的 HTTP / WebSocket 通信
//!
//! - http: 提交会话、上传媒体、摄像头配置、停止录制 (reqwest)
//! - ws: 推送事件流、摄像头画面、录制状态 (tokio-tungstenite)

mod http;
mod ws;

pub use http::*;
pub use ws::*;

use thiserror::Error;

/// Transport failures. None of them are retried.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("server reported an error: {0}")]
    Server(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("websocket error: {0}")]
    WebSocket(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        TransportError::WebSocket(e.to_string())
    }
}
