use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{GenerationError, GenerationProvider, GenerationRequest, ModelCandidate};

/// Gemini `generateContent` over HTTP. The model is part of the URL, so one
/// provider serves every candidate.
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("Newsdigest/0.1.0")
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
            client,
        })
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout = Duration::from_secs(timeout_secs);
        self
    }

    fn endpoint(&self, model: &ModelCandidate) -> String {
        format!("{}/models/{}:generateContent", self.base_url.trim_end_matches('/'), model)
    }
}

#[async_trait::async_trait]
impl GenerationProvider for GeminiProvider {
    async fn generate(&self, model: &ModelCandidate, request: &GenerationRequest) -> Result<String, GenerationError> {
        let req_body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: &request.prompt }],
            }],
        };

        let response = tokio::time::timeout(
            self.timeout,
            self.client
                .post(self.endpoint(model))
                .header("x-goog-api-key", &self.api_key)
                .header("Content-Type", "application/json")
                .json(&req_body)
                .send(),
        )
        .await
        .map_err(|_| GenerationError::Transport(format!("request timed out after {:?}", self.timeout)))?
        .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // A stalled error body still classifies by status
            let body = match tokio::time::timeout(self.timeout, response.text()).await {
                Ok(Ok(body)) => body,
                Ok(Err(_)) | Err(_) => String::new(),
            };
            debug!(%model, %status, "generation failed: {}", body);
            return Err(match status {
                StatusCode::SERVICE_UNAVAILABLE => GenerationError::Unavailable(body),
                StatusCode::TOO_MANY_REQUESTS => GenerationError::QuotaExceeded,
                StatusCode::NOT_FOUND => GenerationError::NotFound,
                _ => GenerationError::Status {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let body = tokio::time::timeout(self.timeout, response.text())
            .await
            .map_err(|_| GenerationError::Transport("response body timed out".to_string()))?
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        extract_text(&body)
    }
}

/// `candidates[0].content.parts[0].text` of a generateContent response.
pub fn extract_text(body: &str) -> Result<String, GenerationError> {
    let resp: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::Malformed(e.to_string()))?;

    resp.candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or_else(|| GenerationError::Malformed("no text in first candidate".to_string()))
}

// generateContent request/response structures
#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"digest"}],"role":"model"}}]}"#;
        assert_eq!(extract_text(body).unwrap(), "digest");
    }

    #[test]
    fn test_extract_text_missing_parts() {
        for body in [
            r#"{"candidates":[]}"#,
            r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#,
            r#"{"candidates":[{"finishReason":"SAFETY"}]}"#,
            r#"{"candidates":[{"content":{"parts":[]}}]}"#,
            "not json",
        ] {
            assert!(matches!(extract_text(body), Err(GenerationError::Malformed(_))), "{}", body);
        }
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: "hello" }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"contents": [{"parts": [{"text": "hello"}]}]})
        );
    }

    #[test]
    fn test_endpoint() {
        let provider = GeminiProvider::new("https://example.com/v1beta/", "k").unwrap();
        assert_eq!(
            provider.endpoint(&ModelCandidate::from("gemini-2.5-flash")),
            "https://example.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
