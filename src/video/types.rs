//! Core types for video jobs.

use crate::credential::Credential;
use crate::image::ImagePayload;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Veo model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VeoModel {
    /// Veo 3.1 Fast Preview, the quicker and cheaper variant.
    #[default]
    #[serde(rename = "veo-3.1-fast-generate-preview")]
    Veo31FastPreview,
    /// Veo 3.1 Preview.
    #[serde(rename = "veo-3.1-generate-preview")]
    Veo31Preview,
}

impl VeoModel {
    /// Returns the API model identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Veo31FastPreview => "veo-3.1-fast-generate-preview",
            Self::Veo31Preview => "veo-3.1-generate-preview",
        }
    }
}

impl std::fmt::Display for VeoModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output resolution. Requests are always 720p.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// 1280x720.
    #[default]
    #[serde(rename = "720p")]
    P720,
}

impl Resolution {
    /// Wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P720 => "720p",
        }
    }
}

/// Output aspect ratio. Requests are always landscape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 16:9 landscape.
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
}

impl AspectRatio {
    /// Wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape => "16:9",
        }
    }
}

/// Output settings sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Number of videos to generate.
    pub count: u32,
    /// Output resolution.
    pub resolution: Resolution,
    /// Output aspect ratio.
    pub aspect_ratio: AspectRatio,
}

impl Default for OutputConfig {
    /// One 720p 16:9 video.
    fn default() -> Self {
        Self {
            count: 1,
            resolution: Resolution::P720,
            aspect_ratio: AspectRatio::Landscape,
        }
    }
}

/// A single image-to-video request. Built fresh for each submission.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Model to run.
    pub model: VeoModel,
    /// Text prompt describing the motion.
    pub prompt: String,
    /// First frame of the video.
    pub image: ImagePayload,
    /// Output settings.
    pub output: OutputConfig,
}

impl GenerationRequest {
    /// Creates a request with the default output settings.
    pub fn new(model: VeoModel, prompt: impl Into<String>, image: ImagePayload) -> Self {
        Self {
            model,
            prompt: prompt.into(),
            image,
            output: OutputConfig::default(),
        }
    }
}

/// Why the service withheld results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterReport {
    /// Number of videos removed by safety filters.
    pub count: u32,
    /// Reasons given by the service.
    pub reasons: Vec<String>,
}

/// Snapshot of a remote long-running operation.
///
/// Every status call returns a new snapshot that replaces the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    /// Server-assigned operation name (e.g. `models/veo/operations/abc`).
    pub name: String,
    /// Whether the operation reached a terminal state.
    pub done: bool,
    /// URIs of generated videos, in service order. Entries without a URI are `None`.
    pub videos: Vec<Option<String>>,
    /// Error reported by the operation itself.
    pub error: Option<String>,
    /// Safety filtering details, when the service reported any.
    pub filtered: Option<FilterReport>,
}

impl JobHandle {
    /// A handle that is still running.
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: false,
            videos: Vec::new(),
            error: None,
            filtered: None,
        }
    }

    /// A finished handle carrying the given video URIs.
    pub fn completed<I, S>(name: impl Into<String>, uris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            done: true,
            videos: uris.into_iter().map(|u| Some(u.into())).collect(),
            ..Self::pending(name)
        }
    }

    /// A finished handle carrying an operation error.
    pub fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            done: true,
            error: Some(message.into()),
            ..Self::pending(name)
        }
    }

    /// URI of the first generated video, if the service returned one.
    pub fn first_video_uri(&self) -> Option<&str> {
        self.videos
            .first()
            .and_then(|v| v.as_deref())
            .filter(|uri| !uri.is_empty())
    }
}

/// Where a job currently is. Reported to progress observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Credential is in hand, nothing sent yet.
    CredentialResolved,
    /// The service accepted the request.
    Submitted {
        /// Operation name.
        operation: String,
    },
    /// Waiting on the operation; `attempt` counts status checks so far.
    Polling {
        /// Operation name.
        operation: String,
        /// Status checks issued after submission.
        attempt: u32,
    },
    /// A video reference is available.
    Completed,
    /// The job failed; `kind` is [`FlowVizError::kind`](crate::FlowVizError::kind).
    Failed {
        /// Error kind.
        kind: &'static str,
    },
    /// The caller abandoned the job.
    Cancelled,
}

impl JobState {
    /// Human-readable progress text.
    pub fn description(&self) -> String {
        match self {
            Self::CredentialResolved => "Initializing Veo model...".to_string(),
            Self::Submitted { .. } => "Request submitted, waiting for Veo...".to_string(),
            Self::Polling { attempt, .. } => {
                format!("Generating video (status check {})...", attempt)
            }
            Self::Completed => "Done!".to_string(),
            Self::Failed { kind } => format!("Failed ({})", kind),
            Self::Cancelled => "Cancelled".to_string(),
        }
    }

    /// Whether no further transitions follow.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed { .. } | Self::Cancelled)
    }
}

/// A finished video, playable or downloadable straight from [`uri`](Self::uri).
#[derive(Clone, PartialEq, Eq)]
pub struct VideoReference {
    uri: String,
    key_len: usize,
    /// Operation that produced the video.
    pub operation: String,
    /// Model that produced the video.
    pub model: VeoModel,
    /// Status calls made, counting the submission response.
    pub status_calls: u32,
    /// Wall time from submission to completion.
    pub elapsed: Duration,
}

impl VideoReference {
    pub(crate) fn new(
        video_uri: &str,
        credential: &Credential,
        operation: String,
        model: VeoModel,
        status_calls: u32,
        elapsed: Duration,
    ) -> Self {
        Self {
            uri: append_key(video_uri, credential),
            key_len: credential.expose().len(),
            operation,
            model,
            status_calls,
            elapsed,
        }
    }

    /// The video URI with the API key appended. Treat it as a secret.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The URI with the key replaced by `***`, safe for logs.
    pub fn redacted_uri(&self) -> String {
        let cut = self.uri.len() - self.key_len;
        format!("{}***", &self.uri[..cut])
    }
}

impl std::fmt::Debug for VideoReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoReference")
            .field("uri", &self.redacted_uri())
            .field("operation", &self.operation)
            .field("model", &self.model)
            .field("status_calls", &self.status_calls)
            .field("elapsed", &self.elapsed)
            .finish()
    }
}

impl std::fmt::Display for VideoReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.redacted_uri())
    }
}

/// Appends `&key=<credential>` so the URI can be fetched without other auth.
pub(crate) fn append_key(uri: &str, credential: &Credential) -> String {
    format!("{}&key={}", uri, credential.expose())
}
