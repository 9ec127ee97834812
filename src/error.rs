//! Error types for the extraction pipeline.
//!
//! Two layers: [`ExtractError`] for fatal setup problems that stop a
//! request before or instead of unit processing, and [`UnitError`] for
//! per-unit failures that are recorded against the unit's index while
//! the pipeline continues.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::{DocumentKind, ExtractionMethod, ExtractionResult};

/// Fatal errors for a whole extraction request.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// File is neither a PDF nor a DOCX.
    #[error("unsupported document kind: {0}")]
    UnsupportedKind(String),

    /// Input file does not exist or is not a regular file.
    #[error("document not found: {}", .0.display())]
    NotFound(PathBuf),

    /// OCR was requested but no API credential is configured.
    #[error("OCR method requires an API credential (set GEMINI_API_KEY)")]
    MissingCredential,

    /// The chosen method cannot process this document kind.
    #[error("{method} extraction is not supported for {kind} documents")]
    MethodUnsupported {
        method: ExtractionMethod,
        kind: DocumentKind,
    },

    /// The document could not be opened or parsed at all, so no units
    /// could be enumerated.
    #[error("failed to open document: {0}")]
    DocumentOpen(String),

    /// Every unit failed; nothing was extracted. Carries the full
    /// per-unit report so callers can still show the reasons.
    #[error("no text could be extracted from any of the {} units", .0.unit_count())]
    EmptyResult(ExtractionResult),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-unit failures. Non-fatal: the pipeline records these and moves
/// on to the next unit.
#[derive(Debug, Error)]
pub enum UnitError {
    /// Rasterizing the page failed.
    #[error("page render failed: {0}")]
    Render(String),

    /// The OCR service rejected our credential.
    #[error("OCR authentication rejected: {0}")]
    Auth(String),

    /// The OCR service kept rate limiting us past the retry budget.
    #[error("OCR service rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    /// The OCR service was unreachable or returned a server error
    /// past the retry budget.
    #[error("OCR service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The OCR service answered with something we could not interpret.
    #[error("unexpected OCR response: {0}")]
    MalformedResponse(String),

    /// The embedded text layer for this unit could not be parsed.
    #[error("text extraction failed: {0}")]
    Parse(String),

    /// Writing or reading the staged page image failed.
    #[error("staging I/O failed: {0}")]
    Staging(String),
}
