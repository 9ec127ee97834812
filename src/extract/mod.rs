//! The extraction pipeline: method dispatch, per-unit processing, and
//! result assembly.
//!
//! One extraction request walks every unit of the document in
//! ascending index order and records an outcome for each. A unit
//! failure never aborts the request; it is recorded and the next unit
//! is attempted. Only a request where *nothing* succeeded surfaces as
//! an overall error.

mod direct;
mod render;

use std::fs;
use std::path::PathBuf;

use tracing::debug;

pub use direct::DirectTextReader;
pub use render::PageRenderer;

use crate::config::Settings;
use crate::error::{ExtractError, UnitError};
use crate::models::{
    Document, DocumentKind, ExtractionMethod, ExtractionResult, UnitOutcome, UnitRecord,
};
use crate::ocr::{OcrClient, OcrError, RetryPolicy};
use crate::staging::StagingArea;

/// Per-request extraction configuration, passed in explicitly so the
/// pipeline stays testable without environment setup.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Render resolution for OCR mode.
    pub dpi: u32,
    /// Root directory for per-request staging subdirectories.
    pub staging_dir: PathBuf,
    /// Retry budget for transient OCR service errors.
    pub retry: RetryPolicy,
}

impl ExtractOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            dpi: settings.ocr_dpi,
            staging_dir: settings.staging_dir.clone(),
            retry: RetryPolicy::new(settings.ocr_max_retries, settings.retry_base_ms),
        }
    }
}

/// Progress notifications emitted while a request runs. Observational
/// only; dropping them does not affect the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionEvent {
    /// Unit enumeration finished; processing is about to start.
    Started { units: usize },
    /// Work on one unit began.
    UnitStarted { index: usize },
    /// Work on one unit ended. `completed` counts finished units and
    /// only ever increases.
    UnitCompleted {
        index: usize,
        succeeded: bool,
        completed: usize,
    },
    /// All units were attempted.
    Finished { succeeded: usize, failed: usize },
}

/// Orchestrates one extraction request.
pub struct ExtractionPipeline<'a> {
    options: ExtractOptions,
    ocr: Option<&'a dyn OcrClient>,
}

impl<'a> ExtractionPipeline<'a> {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options, ocr: None }
    }

    /// Attach an OCR client, enabling the `ocr` method.
    pub fn with_ocr_client(mut self, client: &'a dyn OcrClient) -> Self {
        self.ocr = Some(client);
        self
    }

    /// Run one extraction request.
    ///
    /// `progress` receives [`ExtractionEvent`]s as units complete.
    pub async fn extract(
        &self,
        document: &Document,
        method: ExtractionMethod,
        progress: &mut dyn FnMut(ExtractionEvent),
    ) -> Result<ExtractionResult, ExtractError> {
        debug!(
            path = %document.path().display(),
            kind = %document.kind(),
            %method,
            "starting extraction"
        );
        match method {
            ExtractionMethod::Direct => self.extract_direct(document, progress),
            ExtractionMethod::Ocr => self.extract_ocr(document, progress).await,
        }
    }

    fn extract_direct(
        &self,
        document: &Document,
        progress: &mut dyn FnMut(ExtractionEvent),
    ) -> Result<ExtractionResult, ExtractError> {
        let reader = DirectTextReader::open(document)?;
        let total = reader.unit_count();
        progress(ExtractionEvent::Started { units: total });

        let mut units = Vec::with_capacity(total);
        for index in 0..total {
            progress(ExtractionEvent::UnitStarted { index });
            // A unit with no text layer is an empty success here.
            let text = reader.read_unit(index).unwrap_or_default().to_string();
            units.push(UnitRecord {
                index,
                outcome: UnitOutcome::Extracted(text),
            });
            progress(ExtractionEvent::UnitCompleted {
                index,
                succeeded: true,
                completed: index + 1,
            });
        }

        finish(document.kind(), ExtractionMethod::Direct, units, progress)
    }

    async fn extract_ocr(
        &self,
        document: &Document,
        progress: &mut dyn FnMut(ExtractionEvent),
    ) -> Result<ExtractionResult, ExtractError> {
        // Setup failures come before any render work.
        let client = self.ocr.ok_or(ExtractError::MissingCredential)?;
        if document.kind() != DocumentKind::Pdf {
            return Err(ExtractError::MethodUnsupported {
                method: ExtractionMethod::Ocr,
                kind: document.kind(),
            });
        }

        let renderer = PageRenderer::new()?;
        let total = renderer.page_count(document)?;
        let staging = StagingArea::create(&self.options.staging_dir)?;
        progress(ExtractionEvent::Started { units: total });

        let mut units = Vec::with_capacity(total);
        for index in 0..total {
            progress(ExtractionEvent::UnitStarted { index });
            let outcome = match self
                .ocr_unit(&renderer, document, &staging, index, client)
                .await
            {
                Ok(text) => UnitOutcome::Extracted(text),
                Err(err) => {
                    debug!(page = index, "unit failed, continuing: {err}");
                    UnitOutcome::Failed(err)
                }
            };
            let succeeded = outcome.is_success();
            units.push(UnitRecord { index, outcome });
            progress(ExtractionEvent::UnitCompleted {
                index,
                succeeded,
                completed: index + 1,
            });
        }

        finish(document.kind(), ExtractionMethod::Ocr, units, progress)
        // staging drops here, removing rendered images on every path
    }

    /// Render, stage, and recognize a single page.
    async fn ocr_unit(
        &self,
        renderer: &PageRenderer,
        document: &Document,
        staging: &StagingArea,
        index: usize,
        client: &dyn OcrClient,
    ) -> Result<String, UnitError> {
        let image = renderer.render_page(document, index, self.options.dpi)?;

        let staged = staging.page_image_path(index);
        image
            .save_with_format(&staged, image::ImageFormat::Png)
            .map_err(|e| UnitError::Staging(e.to_string()))?;
        let png = fs::read(&staged).map_err(|e| UnitError::Staging(e.to_string()))?;

        self.options
            .retry
            .recognize(client, &png)
            .await
            .map_err(|err| unit_error_from_ocr(err, self.options.retry.total_attempts()))
    }
}

fn unit_error_from_ocr(err: OcrError, attempts: u32) -> UnitError {
    match err {
        OcrError::Auth(msg) => UnitError::Auth(msg),
        OcrError::RateLimited { .. } => UnitError::RateLimited { attempts },
        OcrError::Unavailable(msg) => UnitError::ServiceUnavailable(msg),
        OcrError::Transport(e) => UnitError::ServiceUnavailable(e.to_string()),
        OcrError::Malformed(msg) => UnitError::MalformedResponse(msg),
    }
}

/// Assemble the result and apply the all-units-failed rule.
fn finish(
    kind: DocumentKind,
    method: ExtractionMethod,
    units: Vec<UnitRecord>,
    progress: &mut dyn FnMut(ExtractionEvent),
) -> Result<ExtractionResult, ExtractError> {
    let result = ExtractionResult::new(kind, method, units);
    progress(ExtractionEvent::Finished {
        succeeded: result.succeeded(),
        failed: result.failed(),
    });

    if result.unit_count() > 0 && result.succeeded() == 0 {
        return Err(ExtractError::EmptyResult(result));
    }
    Ok(result)
}
