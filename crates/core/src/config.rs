//! vchat 配置系统
//!
//! 加载顺序：默认值 → YAML 配置文件 → 环境变量 → 命令行参数

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ConfigError;

/// 默认配置文件名（当前目录）
pub const DEFAULT_CONFIG_FILE: &str = "vchat.yaml";

/// vchat 主配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VchatConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub ui: UiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 服务端地址配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP 基础 URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// WebSocket 基础 URL；缺省时由 base_url 推导
    #[serde(default)]
    pub ws_url: Option<String>,

    /// 请求超时 (秒)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            ws_url: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ServerConfig {
    pub fn http_base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// http → ws, https → wss
    pub fn ws_base(&self) -> String {
        if let Some(ws) = self.ws_url.as_deref().filter(|s| !s.trim().is_empty()) {
            return ws.trim_end_matches('/').to_string();
        }
        let base = self.http_base();
        if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        }
    }
}

/// 会话配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// 提交时附带的模型名
    #[serde(default)]
    pub model: Option<String>,

    /// 输入历史条数
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_history_limit() -> usize {
    100
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: None,
            history_limit: default_history_limit(),
        }
    }
}

/// 界面配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Observation 默认展开
    #[serde(default)]
    pub expand_observations: bool,

    /// 显示摄像头面板
    #[serde(default = "default_true")]
    pub show_camera_pane: bool,
}

fn default_true() -> bool {
    true
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            expand_observations: false,
            show_camera_pane: default_true(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// TUI 模式下日志文件目录
    #[serde(default = "default_log_dir")]
    pub directory: PathBuf,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_log_dir(),
        }
    }
}

impl VchatConfig {
    /// 从 YAML 字符串解析
    pub fn from_yaml(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 读取指定文件
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_yaml(&text, &display)
    }

    /// 默认值 → 配置文件 → 环境变量
    ///
    /// 显式给出的路径必须存在；未给出时仅在当前目录存在 vchat.yaml 才读取。
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.is_file() {
                    Self::from_file(local)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// 按变量名查询覆盖值
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("VCHAT_SERVER_URL") {
            self.server.base_url = url.trim().to_string();
        }
        if let Some(url) = get("VCHAT_WS_URL") {
            self.server.ws_url = Some(url.trim().to_string());
        }
        if let Some(model) = get("VCHAT_MODEL") {
            self.chat.model = Some(model.trim().to_string());
        }
        if let Some(flag) = get("VCHAT_EXPAND_OBSERVATIONS").and_then(|v| parse_bool(&v)) {
            self.ui.expand_observations = flag;
        }
        if let Some(flag) = get("VCHAT_SHOW_CAMERA").and_then(|v| parse_bool(&v)) {
            self.ui.show_camera_pane = flag;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.server.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "server.base_url must start with http:// or https://, got '{base}'"
            )));
        }
        if let Some(ws) = self.server.ws_url.as_deref() {
            let ws = ws.trim();
            if !ws.is_empty() && !(ws.starts_with("ws://") || ws.starts_with("wss://")) {
                return Err(ConfigError::Invalid(format!(
                    "server.ws_url must start with ws:// or wss://, got '{ws}'"
                )));
            }
        }
        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "server.request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
