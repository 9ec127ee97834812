//! Direct extraction of embedded text, without rendering or network.
//!
//! PDF pages come from the embedded text layer via `pdf-extract`;
//! DOCX paragraphs come from the document model via `docx-rs`.

use std::fs;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::ExtractError;
use crate::models::{Document, DocumentKind};

/// Reads the units of a document straight from its text content.
///
/// The document is parsed once at open; unit reads are then cheap
/// lookups. In direct mode a unit with no text is a success that
/// yields an empty string, so every unit of an opened document reads
/// successfully.
pub struct DirectTextReader {
    units: Vec<String>,
}

impl DirectTextReader {
    /// Parse the document and split it into units.
    pub fn open(document: &Document) -> Result<Self, ExtractError> {
        let units = match document.kind() {
            DocumentKind::Pdf => pdf_page_texts(document)?,
            DocumentKind::Docx => docx_paragraph_texts(document)?,
        };
        tracing::debug!(
            path = %document.path().display(),
            units = units.len(),
            "opened document for direct extraction"
        );
        Ok(Self { units })
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Text of the unit at `index`, or None past the end.
    pub fn read_unit(&self, index: usize) -> Option<&str> {
        self.units.get(index).map(String::as_str)
    }
}

/// Per-page embedded text of a PDF.
fn pdf_page_texts(document: &Document) -> Result<Vec<String>, ExtractError> {
    let pages = pdf_extract::extract_text_by_pages(document.path())
        .map_err(|e| ExtractError::DocumentOpen(format!("pdf parse failed: {e}")))?;
    Ok(pages.iter().map(|p| normalize_page_text(p)).collect())
}

/// Per-paragraph text of a DOCX body.
fn docx_paragraph_texts(document: &Document) -> Result<Vec<String>, ExtractError> {
    let buf = fs::read(document.path())?;
    let docx = docx_rs::read_docx(&buf)
        .map_err(|e| ExtractError::DocumentOpen(format!("docx parse failed: {e:?}")))?;

    let mut paragraphs = Vec::new();
    for child in &docx.document.children {
        if let docx_rs::DocumentChild::Paragraph(paragraph) = child {
            paragraphs.push(paragraph_text(paragraph));
        }
    }
    Ok(paragraphs)
}

/// Concatenated run text of one paragraph. A paragraph with no runs
/// yields an empty string.
fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let docx_rs::ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                match run_child {
                    docx_rs::RunChild::Text(t) => text.push_str(&t.text),
                    docx_rs::RunChild::Tab(_) => text.push('\t'),
                    docx_rs::RunChild::Break(_) => text.push('\n'),
                    _ => {}
                }
            }
        }
    }
    text
}

/// Normalize whitespace at paragraph boundaries only: collapse runs of
/// blank lines, drop trailing spaces on each line, trim the ends. The
/// text itself is left exactly as the parser reported it.
fn normalize_page_text(text: &str) -> String {
    static TRAILING: OnceLock<Regex> = OnceLock::new();
    static BLANK_RUNS: OnceLock<Regex> = OnceLock::new();

    let trailing = TRAILING.get_or_init(|| Regex::new(r"[ \t]+\n").expect("valid regex"));
    let blank_runs = BLANK_RUNS.get_or_init(|| Regex::new(r"\n{3,}").expect("valid regex"));

    let stripped = trailing.replace_all(text, "\n");
    let collapsed = blank_runs.replace_all(&stripped, "\n\n");
    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Paragraph, Run};

    fn write_docx(path: &std::path::Path, paragraphs: Vec<Paragraph>) {
        let file = fs::File::create(path).unwrap();
        let mut docx = Docx::new();
        for p in paragraphs {
            docx = docx.add_paragraph(p);
        }
        docx.build().pack(file).unwrap();
    }

    #[test]
    fn normalize_collapses_blank_runs_and_trailing_spaces() {
        let input = "first line   \nsecond line\n\n\n\nnext paragraph\n\n";
        assert_eq!(
            normalize_page_text(input),
            "first line\nsecond line\n\nnext paragraph"
        );
    }

    #[test]
    fn normalize_leaves_inner_text_alone() {
        let input = "spaced   out   words";
        assert_eq!(normalize_page_text(input), "spaced   out   words");
    }

    #[test]
    fn docx_paragraphs_in_order_with_empty_ones_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("letter.docx");
        write_docx(
            &path,
            vec![
                Paragraph::new().add_run(Run::new().add_text("Dear reader,")),
                Paragraph::new(),
                Paragraph::new().add_run(Run::new().add_text("Sincerely.")),
            ],
        );

        let document = Document::open(&path).unwrap();
        let reader = DirectTextReader::open(&document).unwrap();

        assert_eq!(reader.unit_count(), 3);
        assert_eq!(reader.read_unit(0), Some("Dear reader,"));
        // A run-less paragraph is an empty success, not a failure.
        assert_eq!(reader.read_unit(1), Some(""));
        assert_eq!(reader.read_unit(2), Some("Sincerely."));
        assert_eq!(reader.read_unit(3), None);
    }

    #[test]
    fn multiple_runs_concatenate_within_a_paragraph() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.docx");
        write_docx(
            &path,
            vec![Paragraph::new()
                .add_run(Run::new().add_text("Hello, "))
                .add_run(Run::new().add_text("world"))],
        );

        let document = Document::open(&path).unwrap();
        let reader = DirectTextReader::open(&document).unwrap();
        assert_eq!(reader.read_unit(0), Some("Hello, world"));
    }

    #[test]
    fn corrupt_docx_fails_at_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.docx");
        fs::write(&path, b"this is not a zip container").unwrap();

        let document = Document::open(&path).unwrap();
        assert!(matches!(
            DirectTextReader::open(&document),
            Err(ExtractError::DocumentOpen(_))
        ));
    }
}
