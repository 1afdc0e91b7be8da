//! vchat Interface - 交互层
//!
//! 职责：
//! - CLI 命令行工具
//! - 服务端传输 (HTTP / WebSocket)
//! - ChatBackend 实现，供 TUI 使用
//!
//! 架构：
//! - cli: 命令行接口
//! - transport: reqwest / tokio-tungstenite 客户端
//! - backend: ChatBackend 实现
//! - logging: tracing-subscriber 初始化

pub mod backend;
pub mod cli;
pub mod logging;
pub mod transport;

#[cfg(test)]
mod cli_tests;

pub use backend::ServerBackend;
pub use cli::{CliError, render_jsonl, run_cli};
pub use transport::{BackendClient, ChatAck, TransportError, open_ws_stream};
