use async_trait::async_trait;
use reqwest::{
    Client, Url,
    multipart::{Form, Part},
};
use tracing::debug;

use crate::{
    config::ClientConfig,
    error::{GaitError, TransportError},
};

/// Status and full body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One file sent as a single multipart part.
#[derive(Debug, Clone)]
pub struct VideoUpload {
    pub field_name: &'static str,
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// The wire underneath [`crate::client::AnalysisClient`].
///
/// Implementations hold no per-request state; concurrent calls are
/// independent. Endpoints are relative paths such as `"health"`.
#[async_trait]
pub trait AnalysisTransport: Send + Sync {
    async fn upload(&self, endpoint: &str, video: VideoUpload)
    -> Result<HttpReply, TransportError>;

    async fn get(&self, endpoint: &str) -> Result<HttpReply, TransportError>;
}

/// reqwest-backed transport with separate upload and control-plane clients.
///
/// The upload client bounds each idle read rather than the whole exchange, so
/// a large upload followed by slow inference is not cut off while bytes still
/// move; an overall cap still applies.
pub struct HttpTransport {
    upload_client: Client,
    control_client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, GaitError> {
        let base_url = config.base_url()?;
        let upload_client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .read_timeout(config.request_timeout())
            .timeout(config.upload_total_timeout())
            .build()
            .map_err(TransportError::from)?;
        let control_client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.control_timeout())
            .build()
            .map_err(TransportError::from)?;

        Ok(Self {
            upload_client,
            control_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, endpoint: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(endpoint)
            .map_err(|e| TransportError::Client {
                reason: format!("invalid endpoint {endpoint}: {e}"),
            })
    }

    async fn read_reply(response: reqwest::Response) -> Result<HttpReply, TransportError> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, body_len = body.len(), "response received");
        Ok(HttpReply { status, body })
    }
}

#[async_trait]
impl AnalysisTransport for HttpTransport {
    async fn upload(
        &self,
        endpoint: &str,
        video: VideoUpload,
    ) -> Result<HttpReply, TransportError> {
        let url = self.endpoint(endpoint)?;
        let part = Part::bytes(video.bytes)
            .file_name(video.file_name)
            .mime_str(video.content_type)?;
        let form = Form::new().part(video.field_name, part);

        let response = self
            .upload_client
            .post(url)
            .multipart(form)
            .send()
            .await?;

        Self::read_reply(response).await
    }

    async fn get(&self, endpoint: &str) -> Result<HttpReply, TransportError> {
        let url = self.endpoint(endpoint)?;
        let response = self.control_client.get(url).send().await?;

        Self::read_reply(response).await
    }
}
