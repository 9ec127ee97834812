//! OCR backends for image-based text recognition.
//!
//! The pipeline talks to the OCR service through the [`OcrClient`]
//! trait so tests can substitute a deterministic stub without network
//! access. The production implementation is [`GeminiOcrClient`].
//!
//! Retry policy for transient service errors lives in [`retry`], not
//! in the clients themselves.

mod gemini;
pub mod retry;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use gemini::GeminiOcrClient;
pub use retry::RetryPolicy;

/// Errors an OCR backend can signal for one recognition call.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The service rejected the credential.
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// The service asked us to slow down.
    #[error("rate limited")]
    RateLimited {
        /// Server-suggested wait, from a Retry-After header.
        retry_after: Option<Duration>,
    },

    /// The service returned a server error or was unreachable.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Transport-level failure before any HTTP status was received.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response arrived but could not be interpreted.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl OcrError {
    /// Whether retrying this call could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Unavailable(_) | Self::Transport(_)
        )
    }
}

/// Capability interface for recognizing text in one raster image.
///
/// Implementations send the image to a remote service and return the
/// recognized text verbatim, with no post-processing or confidence
/// filtering. A page with no discernible text yields an empty string.
#[async_trait]
pub trait OcrClient: Send + Sync {
    /// Recognize the text in one PNG-encoded image.
    async fn recognize(&self, png: &[u8]) -> Result<String, OcrError>;
}
