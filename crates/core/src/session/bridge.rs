//! Automation session backed by an HTTP browser-automation bridge.
//!
//! The bridge is a separate process that owns the browser and every detail
//! of the remote page. This client speaks a small JSON protocol to it.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::config::SessionConfig;
use super::delay::{DelayKind, SmartDelay};
use super::error::SessionError;
use super::traits::AutomationSession;
use super::types::{GenerationStatus, SubmissionRequest};

#[derive(Debug, Serialize)]
struct OpenRequest<'a> {
    browser_id: &'a str,
    target_url: &'a str,
    operation_timeout_ms: u64,
    headless: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum BridgeState {
    Awaiting,
    InProgress,
    Succeeded,
    Failed,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    state: BridgeState,
    #[serde(default)]
    locator: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// HTTP client for the browser-automation bridge.
pub struct HttpBridgeSession {
    client: Client,
    config: SessionConfig,
    delay: SmartDelay,
    open: AtomicBool,
}

impl HttpBridgeSession {
    /// Create a new bridge session. Nothing is contacted until `open`.
    pub fn new(config: SessionConfig, delay: SmartDelay) -> Result<Self, SessionError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.operation_timeout_ms))
            .build()
            .map_err(|e| SessionError::ConnectionFailed {
                url: config.bridge_url.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            config,
            delay,
            open: AtomicBool::new(false),
        })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.bridge_url.trim_end_matches('/')
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.open.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SessionError::NotOpen)
        }
    }

    fn send_error(&self, operation: &str, e: reqwest::Error) -> SessionError {
        if e.is_timeout() {
            SessionError::Timeout {
                operation: operation.to_string(),
                timeout_ms: self.config.operation_timeout_ms,
            }
        } else if e.is_connect() {
            SessionError::ConnectionFailed {
                url: self.base_url().to_string(),
                reason: e.to_string(),
            }
        } else {
            SessionError::api(0, e.to_string())
        }
    }

    /// Turns a non-2xx bridge answer into a typed error.
    async fn check(response: Response) -> Result<Response, SessionError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        let message = body.error.unwrap_or(text);

        match body.code.as_deref() {
            Some("upload_target_missing") => Err(SessionError::UploadTargetMissing { reason: message }),
            Some("session_not_open") => Err(SessionError::NotOpen),
            _ => Err(SessionError::api(status.as_u16(), message)),
        }
    }

    async fn image_part(path: &Path) -> Result<multipart::Part, SessionError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| SessionError::AssetUnreadable {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(multipart::Part::bytes(bytes).file_name(file_name))
    }
}

#[async_trait]
impl AutomationSession for HttpBridgeSession {
    fn name(&self) -> &str {
        "http-bridge"
    }

    async fn open(&self) -> Result<(), SessionError> {
        let body = OpenRequest {
            browser_id: &self.config.browser_id,
            target_url: &self.config.target_url,
            operation_timeout_ms: self.config.operation_timeout_ms,
            headless: self.config.headless,
        };

        info!(
            "Opening session on browser {} at {}",
            self.config.browser_id, self.config.target_url
        );
        let response = self
            .client
            .post(self.url("/session/open"))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.send_error("open", e))?;
        Self::check(response).await?;

        self.open.store(true, Ordering::SeqCst);
        info!("Session opened via bridge {}", self.base_url());
        Ok(())
    }

    async fn submit(&self, request: &SubmissionRequest) -> Result<(), SessionError> {
        self.ensure_open()?;

        let options =
            serde_json::to_string(&request.options).map_err(SessionError::invalid_response)?;
        let upload_after = self.delay.fixed(DelayKind::UploadAfter);
        let input_after = self.delay.fixed(DelayKind::InputAfter);

        let form = multipart::Form::new()
            .part("image", Self::image_part(&request.asset_path).await?)
            .text("prompt", request.prompt.clone())
            .text("options", options)
            .text("upload_after_ms", upload_after.as_millis().to_string())
            .text("input_after_ms", input_after.as_millis().to_string());

        debug!("Submitting {}", request.asset_path.display());
        let response = self
            .client
            .post(self.url("/tasks"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.send_error("submit", e))?;
        Self::check(response).await?;

        self.delay.pause(DelayKind::ClickAfter).await;
        Ok(())
    }

    async fn generation_status(&self) -> Result<GenerationStatus, SessionError> {
        self.ensure_open()?;

        let response = self
            .client
            .get(self.url("/tasks/current/status"))
            .send()
            .await
            .map_err(|e| self.send_error("status", e))?;
        let response = Self::check(response).await?;
        let body: StatusResponse = response
            .json()
            .await
            .map_err(|e| SessionError::invalid_response(format!("status body: {}", e)))?;

        match body.state {
            BridgeState::Awaiting => Ok(GenerationStatus::Awaiting),
            BridgeState::InProgress => Ok(GenerationStatus::InProgress),
            BridgeState::Succeeded => match body.locator.filter(|l| !l.trim().is_empty()) {
                Some(locator) => Ok(GenerationStatus::Succeeded {
                    locator: locator.into(),
                }),
                None => {
                    debug!("Bridge reports success without a locator yet, still in progress");
                    Ok(GenerationStatus::InProgress)
                }
            },
            BridgeState::Failed => Ok(GenerationStatus::Failed {
                reason: body
                    .reason
                    .unwrap_or_else(|| "generation failed".to_string()),
            }),
        }
    }

    async fn is_alive(&self) -> bool {
        match self.client.get(self.url("/health")).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Bridge health check failed: {}", e);
                false
            }
        }
    }

    async fn close(&self) -> Result<(), SessionError> {
        if !self.open.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        let response = self
            .client
            .post(self.url("/session/close"))
            .send()
            .await
            .map_err(|e| self.send_error("close", e))?;
        if let Err(e) = Self::check(response).await {
            warn!("Bridge refused to close the session: {}", e);
            return Err(e);
        }
        info!("Session closed");
        Ok(())
    }
}
