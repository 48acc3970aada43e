//! Error types for credential resolution and video jobs.

/// Failure of a single remote call to the video service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The service answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Network or HTTP transport error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body did not have the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The operation itself reported an error.
    #[error("{0}")]
    Operation(String),
}

impl ServiceError {
    /// Returns the HTTP status, if the service produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Errors that end a video job. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum FlowVizError {
    /// No usable credential from any configured source.
    #[error("credential unavailable: {0}")]
    Credential(String),

    /// The input image could not be read or encoded.
    #[error("invalid input image: {0}")]
    Input(String),

    /// The initial job-creation call failed.
    #[error("video submission failed: {0}")]
    Submission(#[source] ServiceError),

    /// A status check failed while the job was running.
    #[error("status check failed for {operation}: {source}")]
    Poll {
        operation: String,
        #[source]
        source: ServiceError,
    },

    /// The job finished without a usable video reference.
    #[error("no video reference returned: {0}")]
    NoVideo(String),

    /// The caller abandoned the job before it finished.
    #[error("video job cancelled after {polls} status checks")]
    Cancelled { polls: u32 },

    /// A generation is already running in this studio.
    #[error("a video generation is already in progress")]
    Busy,
}

impl FlowVizError {
    /// Short, stable name of the error kind, for logs and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Credential(_) => "credential",
            Self::Input(_) => "input",
            Self::Submission(_) => "submission",
            Self::Poll { .. } => "poll",
            Self::NoVideo(_) => "result",
            Self::Cancelled { .. } => "cancelled",
            Self::Busy => "busy",
        }
    }
}

/// Result type alias for flowviz operations.
pub type Result<T> = std::result::Result<T, FlowVizError>;

/// Pulls `error.message` out of a Google API error body, falling back to the
/// trimmed raw text.
pub(crate) fn service_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct Envelope {
        error: Inner,
    }
    #[derive(serde::Deserialize)]
    struct Inner {
        message: Option<String>,
    }

    if let Ok(env) = serde_json::from_str::<Envelope>(body) {
        if let Some(message) = env.error.message.filter(|m| !m.trim().is_empty()) {
            return message;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no error details from service".to_string()
    } else {
        trimmed.chars().take(500).collect()
    }
}
