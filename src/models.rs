//! Core data model: documents, extraction methods, and per-unit results.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, UnitError};

/// Kind of input document, inferred from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Infer the kind from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }

    /// MIME type the file content is expected to sniff as.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// What a unit of this document kind is called, for user-facing
    /// messages ("page 4" vs "paragraph 4").
    pub fn unit_label(&self) -> &'static str {
        match self {
            Self::Pdf => "page",
            Self::Docx => "paragraph",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An input file plus its declared kind. Immutable once opened; lives
/// for the duration of one extraction request.
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    kind: DocumentKind,
}

impl Document {
    /// Open a document, inferring its kind from the extension.
    ///
    /// The content magic is sniffed as a sanity check; a mismatch is
    /// logged but the extension wins, since that is what the user
    /// declared.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ExtractError> {
        let path = path.into();
        if !path.is_file() {
            return Err(ExtractError::NotFound(path));
        }

        let kind = DocumentKind::from_path(&path).ok_or_else(|| {
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_else(|| "(no extension)".to_string());
            ExtractError::UnsupportedKind(ext)
        })?;

        if let Ok(Some(sniffed)) = infer::get_from_path(&path) {
            if sniffed.mime_type() != kind.mime_type() {
                tracing::warn!(
                    path = %path.display(),
                    declared = kind.as_str(),
                    sniffed = sniffed.mime_type(),
                    "file content does not match its extension"
                );
            }
        }

        Ok(Self { path, kind })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Default output filename for the extracted text, placed beside
    /// the input: `report.pdf` -> `report_extracted.txt`.
    pub fn default_output_path(&self) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        self.path.with_file_name(format!("{stem}_extracted.txt"))
    }
}

/// Which leaf component processes each unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// Read the embedded text layer without rendering.
    Direct,
    /// Render each page and recognize text through the OCR service.
    Ocr,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Ocr => "ocr",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one unit: extracted text or the failure that was
/// recorded against it.
#[derive(Debug)]
pub enum UnitOutcome {
    Extracted(String),
    Failed(UnitError),
}

impl UnitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Extracted(_))
    }

    /// The extracted text, if this unit succeeded.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Extracted(text) => Some(text),
            Self::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&UnitError> {
        match self {
            Self::Extracted(_) => None,
            Self::Failed(err) => Some(err),
        }
    }
}

/// One entry of an [`ExtractionResult`]: a unit index and its outcome.
#[derive(Debug)]
pub struct UnitRecord {
    pub index: usize,
    pub outcome: UnitOutcome,
}

/// The final artifact of one extraction request.
///
/// Contains exactly one record per unit of the document, in ascending
/// index order. Failed units stay in the sequence so the report never
/// looks misleadingly complete.
#[derive(Debug)]
pub struct ExtractionResult {
    kind: DocumentKind,
    method: ExtractionMethod,
    units: Vec<UnitRecord>,
}

impl ExtractionResult {
    pub(crate) fn new(
        kind: DocumentKind,
        method: ExtractionMethod,
        units: Vec<UnitRecord>,
    ) -> Self {
        debug_assert!(units.iter().enumerate().all(|(i, u)| u.index == i));
        Self {
            kind,
            method,
            units,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn method(&self) -> ExtractionMethod {
        self.method
    }

    /// Number of units in the document (successful or not).
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn units(&self) -> &[UnitRecord] {
        &self.units
    }

    pub fn succeeded(&self) -> usize {
        self.units.iter().filter(|u| u.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.units.len() - self.succeeded()
    }

    /// Iterate failed units as `(index, error)`.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &UnitError)> {
        self.units
            .iter()
            .filter_map(|u| u.outcome.error().map(|e| (u.index, e)))
    }

    /// Join the successful fragments in unit order with newlines.
    ///
    /// Failed units are omitted here; they are reported separately via
    /// [`Self::failures`]. The joined text alone cannot distinguish a
    /// failed unit from an empty-but-successful one.
    pub fn full_text(&self) -> String {
        let fragments: Vec<&str> = self
            .units
            .iter()
            .filter_map(|u| u.outcome.text())
            .collect();
        fragments.join("\n")
    }

    /// Human-readable lines describing each failed unit, e.g.
    /// `page 4: OCR service unavailable: ...`.
    pub fn failure_summary(&self) -> Vec<String> {
        self.failures()
            .map(|(index, err)| format!("{} {}: {}", self.kind.unit_label(), index + 1, err))
            .collect()
    }
}
