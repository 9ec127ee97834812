//! Gemini vision client for image text recognition.
//!
//! Sends one PNG per call to the `generateContent` endpoint and
//! returns the recognized text verbatim. No retry logic here; the
//! pipeline's [`super::RetryPolicy`] owns that.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{retry::parse_retry_after, OcrClient, OcrError};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Request timeout. Vision calls on large pages are slow.
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Recognition prompt sent alongside every page image.
const RECOGNITION_PROMPT: &str = "Extract all text content from this image. Preserve formatting \
     like paragraphs and line breaks where possible. If there is no text, return an empty string.";

/// OCR backend using Gemini's multimodal `generateContent` API.
pub struct GeminiOcrClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiOcrClient {
    /// Create a client for the given credential and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, OcrError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different API root (proxy or test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl OcrClient for GeminiOcrClient {
    async fn recognize(&self, png: &[u8]) -> Result<String, OcrError> {
        let body = json!({
            "contents": [{
                "parts": [
                    { "text": RECOGNITION_PROMPT },
                    { "inline_data": { "mime_type": "image/png", "data": STANDARD.encode(png) } },
                ]
            }]
        });

        debug!(model = %self.model, bytes = png.len(), "sending page image for recognition");

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            let text = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, retry_after.as_deref(), &text));
        }

        let text = response.text().await?;
        text_from_response(&text)
    }
}

/// Map a non-success HTTP response to an [`OcrError`].
fn classify_failure(status: StatusCode, retry_after: Option<&str>, body: &str) -> OcrError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            OcrError::Auth(format!("HTTP {status}"))
        }
        // The API reports an invalid key as a 400 INVALID_ARGUMENT.
        StatusCode::BAD_REQUEST if body.contains("API key") => {
            OcrError::Auth(format!("HTTP {status}"))
        }
        StatusCode::TOO_MANY_REQUESTS => OcrError::RateLimited {
            retry_after: parse_retry_after(retry_after),
        },
        s if s.is_server_error() => OcrError::Unavailable(format!("HTTP {s}")),
        s => OcrError::Malformed(format!("HTTP {s}: {}", truncate_body(body))),
    }
}

/// Pull the recognized text out of a `generateContent` response body.
///
/// A response with no candidates or no text parts means the model saw
/// no text in the image; that is a successful empty recognition, not
/// an error.
fn text_from_response(body: &str) -> Result<String, OcrError> {
    #[derive(Deserialize)]
    struct Response {
        #[serde(default)]
        candidates: Vec<Candidate>,
    }
    #[derive(Deserialize)]
    struct Candidate {
        content: Option<Content>,
    }
    #[derive(Deserialize)]
    struct Content {
        #[serde(default)]
        parts: Vec<Part>,
    }
    #[derive(Deserialize)]
    struct Part {
        text: Option<String>,
    }

    let parsed: Response = serde_json::from_str(body)
        .map_err(|e| OcrError::Malformed(format!("{e}: {}", truncate_body(body))))?;

    let text = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    Ok(text)
}

fn truncate_body(body: &str) -> &str {
    let limit = body
        .char_indices()
        .nth(200)
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    &body[..limit]
}
