pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Wire shape of a successful /analyze response. Every field is optional;
/// validation into a report happens on the session side.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisPayload {
    pub rating: Option<f64>,
    pub summary: Option<String>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    pub full_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub question: String,
    pub context: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatReply {
    pub answer: String,
}

/// Error envelope the service uses on non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
}

/// Seam between the review flow and the analysis service, so orchestration
/// tests can run against an in-process backend.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze(
        &self,
        file_name: String,
        mime_type: String,
        bytes: Vec<u8>,
    ) -> Result<AnalysisPayload, ApiError>;

    async fn ask(&self, question: String, context: String) -> Result<String, ApiError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {}", .message.as_deref().unwrap_or("no detail"))]
    Api { status: u16, message: Option<String> },
}

impl ApiError {
    /// Text the service attached to a rejection, when it attached any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Api {
                message: Some(m), ..
            } => Some(m),
            _ => None,
        }
    }
}
