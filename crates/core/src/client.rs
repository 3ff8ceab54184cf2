//! Remote gait analysis client.
//!
//! Every call ends in one of three places: a [`TransportError`] (the service
//! could not be reached meaningfully), [`AnalysisResponse::Failure`] (the
//! service answered but could not analyse the video) or
//! [`AnalysisResponse::Success`]. No retries happen here.

use std::path::Path;

use serde_json::{Map, Value};
use tokio::fs;
use tracing::{info, warn};

use crate::{
    config::ClientConfig,
    error::{GaitError, TransportError},
    transport::{AnalysisTransport, HttpReply, HttpTransport, VideoUpload},
    types::{AnalysisResponse, AnalyzeGaitBody, HealthBody},
};

pub const ANALYZE_ENDPOINT: &str = "analyze_gait";
pub const HEALTH_ENDPOINT: &str = "health";
pub const MODEL_INFO_ENDPOINT: &str = "models/info";
pub const VIDEO_FIELD: &str = "video";
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

pub struct AnalysisClient<T = HttpTransport> {
    transport: T,
}

impl AnalysisClient<HttpTransport> {
    pub fn from_config(config: &ClientConfig) -> Result<Self, GaitError> {
        Ok(Self::new(HttpTransport::new(config)?))
    }
}

impl<T: AnalysisTransport> AnalysisClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Upload a recorded trial and reconcile the service's answer.
    ///
    /// Dropping the returned future abandons the request; nothing is
    /// delivered for a cancelled upload.
    pub async fn analyze_video(&self, video: &Path) -> Result<AnalysisResponse, TransportError> {
        let bytes = fs::read(video)
            .await
            .map_err(|source| TransportError::VideoUnreadable {
                path: video.to_path_buf(),
                source,
            })?;
        let file_name = video
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video.mp4".to_string());

        info!(file = %file_name, bytes = bytes.len(), "uploading video for analysis");

        let reply = self
            .transport
            .upload(
                ANALYZE_ENDPOINT,
                VideoUpload {
                    field_name: VIDEO_FIELD,
                    file_name,
                    content_type: VIDEO_CONTENT_TYPE,
                    bytes,
                },
            )
            .await
            .inspect_err(|e| warn!(error = %e, "analysis request failed"))?;

        let response = reconcile_analysis_reply(reply)?;
        match &response {
            AnalysisResponse::Success(success) => info!(
                request_id = success.request_id.as_deref().unwrap_or("-"),
                severity = success.severity.as_deref().unwrap_or("-"),
                "analysis succeeded"
            ),
            AnalysisResponse::Failure(failure) => warn!(
                error_type = failure.error_type.as_deref().unwrap_or("-"),
                "analysis declined: {}",
                failure.error_message
            ),
        }
        Ok(response)
    }

    /// Healthy only when the service reports `status == "healthy"` and its
    /// models are loaded.
    pub async fn check_health(&self) -> Result<bool, TransportError> {
        let reply = self.transport.get(HEALTH_ENDPOINT).await?;
        let body = successful_body(reply)?;
        let health: HealthBody = serde_json::from_str(&body)?;
        let healthy = health.is_healthy();
        info!(
            status = %health.status,
            models_loaded = health.models_loaded,
            healthy,
            "health check"
        );
        Ok(healthy)
    }

    pub async fn model_info(&self) -> Result<Map<String, Value>, TransportError> {
        let reply = self.transport.get(MODEL_INFO_ENDPOINT).await?;
        let body = successful_body(reply)?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Turn a completed `POST /analyze_gait` exchange into a typed outcome.
pub fn reconcile_analysis_reply(reply: HttpReply) -> Result<AnalysisResponse, TransportError> {
    let body = successful_body(reply)?;
    let parsed: AnalyzeGaitBody = serde_json::from_str(&body)?;
    Ok(AnalysisResponse::from(parsed))
}

fn successful_body(reply: HttpReply) -> Result<String, TransportError> {
    if !reply.is_success() {
        return Err(TransportError::Status {
            status: reply.status,
            message: server_message(&reply.body),
        });
    }
    if reply.body.trim().is_empty() {
        return Err(TransportError::EmptyResponse);
    }
    Ok(reply.body)
}

/// Best human-readable message from an error body: a JSON `error`, `detail`
/// or `message` string, else the raw text.
fn server_message(body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        for key in ["error", "detail", "message"] {
            if let Some(Value::String(message)) = map.get(key) {
                return message.clone();
            }
        }
    }
    if trimmed.is_empty() {
        "no message".to_string()
    } else {
        trimmed.to_string()
    }
}
