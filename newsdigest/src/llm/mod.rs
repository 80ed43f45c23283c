use std::fmt;
use thiserror::Error;

pub mod gemini;
pub mod orchestrator;

pub use gemini::GeminiProvider;
pub use orchestrator::{Generation, GenerationOrchestrator, OrchestratorError, RetryPolicy};

/// Text generation endpoint addressed by model name.
#[async_trait::async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate text for `request` with `model`, or report why not.
    async fn generate(&self, model: &ModelCandidate, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// A model to try; position in the candidate list is its preference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelCandidate(pub String);

impl ModelCandidate {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelCandidate {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ModelCandidate {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Request structure for generation
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into() }
    }
}

/// Why a single generation attempt failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// 503: worth retrying the same model after a pause
    #[error("service unavailable: {0}")]
    Unavailable(String),
    /// 429
    #[error("quota exceeded")]
    QuotaExceeded,
    /// 404: model not released to this key
    #[error("model not found")]
    NotFound,
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    /// Success status without a text payload
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl GenerationError {
    /// Transient failures are retried in place; everything else moves on to the
    /// next candidate.
    pub fn is_transient(&self) -> bool {
        matches!(self, GenerationError::Unavailable(_))
    }
}
