//! vchat Core - 核心数据模型
//!
//! 包含：
//! - Role / ChatEvent: 会话事件模型
//! - Tags: 标签片段提取（response / thinking / json plan ...）
//! - Render: 按角色生成显示结构
//! - Transcript: 只追加的会话记录
//! - Ingest / Stream: 推送事件流接入与连接状态机
//! - Camera / Recording: 摄像头配置与录制状态

mod camera;
mod compose;
mod config;
mod error;
mod ingest;
mod message;
mod recording;
mod render;
mod role;
mod stream;
mod tags;
mod transcript;

pub use camera::*;
pub use compose::*;
pub use config::*;
pub use error::*;
pub use ingest::*;
pub use message::*;
pub use recording::*;
pub use render::*;
pub use role::*;
pub use stream::*;
pub use tags::*;
pub use transcript::*;
