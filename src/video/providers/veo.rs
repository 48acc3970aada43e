//! Veo (Google) long-running operations over the Gemini Developer API.

use crate::credential::Credential;
use crate::error::{service_message, ServiceError};
use crate::video::provider::VideoOperations;
use crate::video::types::{FilterReport, GenerationRequest, JobHandle};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default Gemini Developer API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable that overrides [`DEFAULT_BASE_URL`].
pub const BASE_URL_ENV: &str = "FLOWVIZ_BASE_URL";

/// HTTP transport for Veo operations.
#[derive(Debug, Clone)]
pub struct VeoBackend {
    client: reqwest::Client,
    base_url: String,
}

impl Default for VeoBackend {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl VeoBackend {
    /// Creates a backend talking to `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Uses `FLOWVIZ_BASE_URL` when set, otherwise the public endpoint.
    pub fn from_env() -> Self {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Self::default(),
        }
    }

    /// Use a custom `reqwest::Client` (proxies, timeouts, TLS).
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Returns the configured API root.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn submit_url(&self, request: &GenerationRequest) -> String {
        format!(
            "{}/models/{}:predictLongRunning",
            self.base_url,
            request.model.as_str()
        )
    }

    fn operation_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name.trim_start_matches('/'))
    }

    async fn read_operation(response: reqwest::Response) -> Result<JobHandle, ServiceError> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(parse_error(status.as_u16(), &text));
        }
        let operation: VeoOperationResponse = serde_json::from_str(&text)?;
        operation.into_handle()
    }
}

#[async_trait]
impl VideoOperations for VeoBackend {
    async fn submit(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<JobHandle, ServiceError> {
        let body = VeoRequest::from_request(request);
        let response = self
            .client
            .post(self.submit_url(request))
            .header("x-goog-api-key", credential.expose())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;
        Self::read_operation(response).await
    }

    async fn get_operation(
        &self,
        credential: &Credential,
        handle: &JobHandle,
    ) -> Result<JobHandle, ServiceError> {
        let response = self
            .client
            .get(self.operation_url(&handle.name))
            .header("x-goog-api-key", credential.expose())
            .send()
            .await?;
        Self::read_operation(response).await
    }
}

fn parse_error(status: u16, text: &str) -> ServiceError {
    if status == 404 && text.trim().is_empty() {
        return ServiceError::Api {
            status,
            message: "Veo API not available. Veo requires a paid-tier API key with billing enabled."
                .to_string(),
        };
    }
    ServiceError::Api {
        status,
        message: service_message(text),
    }
}

// ── Request wire format ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoRequest {
    instances: Vec<VeoInstance>,
    parameters: VeoParameters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoInstance {
    prompt: String,
    image: VeoImage,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoImage {
    bytes_base64_encoded: String,
    mime_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoParameters {
    sample_count: u32,
    resolution: &'static str,
    aspect_ratio: &'static str,
}

impl VeoRequest {
    fn from_request(req: &GenerationRequest) -> Self {
        Self {
            instances: vec![VeoInstance {
                prompt: req.prompt.clone(),
                image: VeoImage {
                    bytes_base64_encoded: req.image.to_base64(),
                    mime_type: req.image.mime_type().to_string(),
                },
            }],
            parameters: VeoParameters {
                sample_count: req.output.count,
                resolution: req.output.resolution.as_str(),
                aspect_ratio: req.output.aspect_ratio.as_str(),
            },
        }
    }
}

// ── Response wire format ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct VeoOperationResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    done: Option<bool>,
    #[serde(default)]
    response: Option<VeoVideoResponse>,
    #[serde(default)]
    error: Option<VeoError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VeoVideoResponse {
    #[serde(default)]
    generate_video_response: Option<VeoGenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VeoGenerateVideoResponse {
    #[serde(default)]
    generated_samples: Option<Vec<VeoGeneratedSample>>,
    #[serde(default)]
    rai_media_filtered_count: Option<u32>,
    #[serde(default)]
    rai_media_filtered_reasons: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct VeoGeneratedSample {
    #[serde(default)]
    video: Option<VeoVideo>,
}

#[derive(Debug, Deserialize)]
struct VeoVideo {
    #[serde(default)]
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VeoError {
    #[serde(default)]
    message: Option<String>,
}

impl VeoOperationResponse {
    fn into_handle(self) -> Result<JobHandle, ServiceError> {
        let name = self
            .name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ServiceError::Decode("operation has no name".into()))?;

        let mut handle = JobHandle::pending(name);
        handle.done = self.done.unwrap_or(false);
        handle.error = self
            .error
            .map(|e| e.message.unwrap_or_else(|| "Unknown error".into()));

        if let Some(gen_resp) = self.response.and_then(|r| r.generate_video_response) {
            let count = gen_resp.rai_media_filtered_count.unwrap_or(0);
            if count > 0 {
                handle.filtered = Some(FilterReport {
                    count,
                    reasons: gen_resp.rai_media_filtered_reasons.unwrap_or_default(),
                });
            }
            handle.videos = gen_resp
                .generated_samples
                .unwrap_or_default()
                .into_iter()
                .map(|s| s.video.and_then(|v| v.uri))
                .collect();
        }
        Ok(handle)
    }
}
