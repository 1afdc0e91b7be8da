use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};
use vchat_core::{CameraConfig, ChatEvent, Media, ServerConfig};

use super::TransportError;

/// Acknowledgement body returned by `POST /chat`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatAck {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ChatAck {
    pub fn summary(&self) -> String {
        match (&self.status, &self.message) {
            (Some(status), Some(message)) => format!("{}: {}", status, message),
            (Some(text), None) | (None, Some(text)) => text.clone(),
            (None, None) => "accepted".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    file_path: Option<String>,
    #[serde(default)]
    file_url: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    status: Option<String>,
}

/// HTTP client for the chat server.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    http_base: String,
    ws_base: String,
}

impl BackendClient {
    pub fn new(config: &ServerConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            http_base: config.http_base().trim_end_matches('/').to_string(),
            ws_base: config.ws_base().trim_end_matches('/').to_string(),
        })
    }

    pub fn http_base(&self) -> &str {
        &self.http_base
    }

    pub fn ws_base(&self) -> &str {
        &self.ws_base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.http_base, path)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("{}{}", self.ws_base, path)
    }

    /// `POST /chat` with the whole transcript.
    pub async fn submit_chat(
        &self,
        events: &[ChatEvent],
        model: Option<&str>,
    ) -> Result<ChatAck, TransportError> {
        let mut request = self.http.post(self.url("/chat")).json(events);
        if let Some(model) = model {
            request = request.query(&[("model", model)]);
        }
        debug!(events = events.len(), model = ?model, "submitting transcript");
        let resp = check_status("/chat", request.send().await?).await?;
        // The body is informational only.
        let ack = resp.json::<ChatAck>().await.unwrap_or_default();
        info!(ack = %ack.summary(), "chat submission accepted");
        Ok(ack)
    }

    /// `POST /upload-media` as multipart field `file`.
    pub async fn upload_media(&self, path: &Path) -> Result<Media, TransportError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| TransportError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let size = bytes.len();
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str(mime.essence_str())?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let resp = self
            .http
            .post(self.url("/upload-media"))
            .multipart(form)
            .send()
            .await?;
        let body: UploadResponse = check_status("/upload-media", resp).await?.json().await?;
        if body.status.as_deref() == Some("error") {
            let message = body.message.unwrap_or_else(|| "upload rejected".to_string());
            warn!(file = %file_name, error = %message, "upload rejected by server");
            return Err(TransportError::Server(message));
        }
        let Some(file_url) = body.file_url else {
            return Err(TransportError::Server(
                "upload response has no fileUrl".to_string(),
            ));
        };
        info!(file = %file_name, bytes = size, url = %file_url, "media uploaded");
        Ok(Media::new(body.file_path.unwrap_or_default(), file_url))
    }

    /// `POST /set-camera-config`. The caller validates first.
    pub async fn set_camera_config(&self, config: &CameraConfig) -> Result<(), TransportError> {
        let resp = self
            .http
            .post(self.url("/set-camera-config"))
            .json(config)
            .send()
            .await?;
        check_status("/set-camera-config", resp).await?;
        info!(ip = %config.ip, channel = %config.channel, "camera configured");
        Ok(())
    }

    /// `POST /stop-recording`; returns the reported status.
    pub async fn stop_recording(&self) -> Result<Option<String>, TransportError> {
        let resp = self.http.post(self.url("/stop-recording")).send().await?;
        let body = check_status("/stop-recording", resp)
            .await?
            .json::<StatusResponse>()
            .await
            .map(|b| b.status)
            .unwrap_or(None);
        info!(status = ?body, "recording stopped");
        Ok(body)
    }
}

async fn check_status(
    endpoint: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, TransportError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    warn!(endpoint, status, "request failed");
    Err(TransportError::Status {
        endpoint: endpoint.to_string(),
        status,
        body,
    })
}
