//! docutext — text extraction from PDF and DOCX documents.
//!
//! Two extraction methods over the same pipeline:
//! - `direct`: read the embedded text layer (PDF pages) or document
//!   model (DOCX paragraphs) without rendering anything.
//! - `ocr`: render each PDF page to an image and recognize its text
//!   through a generative-AI vision API.
//!
//! The pipeline processes units (pages or paragraphs) sequentially,
//! tolerates per-unit failures, and always accounts for every unit in
//! its result.

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod history;
pub mod models;
pub mod ocr;
pub mod staging;

pub use error::{ExtractError, UnitError};
pub use extract::{ExtractOptions, ExtractionEvent, ExtractionPipeline, PageRenderer};
pub use models::{
    Document, DocumentKind, ExtractionMethod, ExtractionResult, UnitOutcome, UnitRecord,
};
pub use ocr::{GeminiOcrClient, OcrClient, OcrError, RetryPolicy};
