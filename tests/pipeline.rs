//! End-to-end pipeline tests over generated documents.
//!
//! DOCX fixtures are built with docx-rs so no binary files live in the
//! repository. OCR is stubbed through the client trait; nothing here
//! touches the network or a rendering library.

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use docx_rs::{Docx, Paragraph, Run};

use docutext::{
    Document, ExtractError, ExtractOptions, ExtractionEvent, ExtractionMethod,
    ExtractionPipeline, OcrClient, OcrError, RetryPolicy,
};

fn write_docx(path: &Path, texts: &[Option<&str>]) {
    let file = fs::File::create(path).unwrap();
    let mut docx = Docx::new();
    for text in texts {
        let paragraph = match text {
            Some(text) => Paragraph::new().add_run(Run::new().add_text(*text)),
            None => Paragraph::new(),
        };
        docx = docx.add_paragraph(paragraph);
    }
    docx.build().pack(file).unwrap();
}

fn options_in(dir: &Path) -> ExtractOptions {
    ExtractOptions {
        dpi: 96,
        staging_dir: dir.join("staging"),
        retry: RetryPolicy::new(0, 1),
    }
}

/// Stub OCR backend; never expected to be called in these tests.
struct PanickingOcr;

#[async_trait]
impl OcrClient for PanickingOcr {
    async fn recognize(&self, _png: &[u8]) -> Result<String, OcrError> {
        panic!("OCR should not be reached");
    }
}

#[tokio::test]
async fn direct_docx_accounts_for_every_paragraph() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("letter.docx");
    write_docx(
        &path,
        &[Some("first paragraph"), None, Some("third paragraph")],
    );

    let document = Document::open(&path).unwrap();
    let pipeline = ExtractionPipeline::new(options_in(dir.path()));
    let result = pipeline
        .extract(&document, ExtractionMethod::Direct, &mut |_| {})
        .await
        .unwrap();

    // One entry per paragraph, contiguous from zero.
    assert_eq!(result.unit_count(), 3);
    for (i, unit) in result.units().iter().enumerate() {
        assert_eq!(unit.index, i);
    }

    // Direct mode structurally succeeds even for the empty paragraph.
    assert_eq!(result.succeeded(), 3);
    assert_eq!(result.failed(), 0);
    assert_eq!(
        result.full_text(),
        "first paragraph\n\nthird paragraph"
    );
}

#[tokio::test]
async fn direct_extraction_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memo.docx");
    write_docx(&path, &[Some("alpha"), Some("beta")]);

    let document = Document::open(&path).unwrap();
    let pipeline = ExtractionPipeline::new(options_in(dir.path()));

    let first = pipeline
        .extract(&document, ExtractionMethod::Direct, &mut |_| {})
        .await
        .unwrap();
    let second = pipeline
        .extract(&document, ExtractionMethod::Direct, &mut |_| {})
        .await
        .unwrap();

    assert_eq!(first.unit_count(), second.unit_count());
    assert_eq!(first.full_text(), second.full_text());
}

#[tokio::test]
async fn progress_counts_are_monotonic_and_complete() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.docx");
    write_docx(&path, &[Some("a"), Some("b"), Some("c"), Some("d")]);

    let document = Document::open(&path).unwrap();
    let pipeline = ExtractionPipeline::new(options_in(dir.path()));

    let mut events = Vec::new();
    pipeline
        .extract(&document, ExtractionMethod::Direct, &mut |e| events.push(e))
        .await
        .unwrap();

    assert_eq!(events.first(), Some(&ExtractionEvent::Started { units: 4 }));
    assert_eq!(
        events.last(),
        Some(&ExtractionEvent::Finished {
            succeeded: 4,
            failed: 0
        })
    );

    let completed: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            ExtractionEvent::UnitCompleted { completed, .. } => Some(*completed),
            _ => None,
        })
        .collect();
    assert_eq!(completed, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn ocr_without_credential_fails_before_any_work() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.pdf");
    fs::write(&path, b"%PDF-1.4 stub").unwrap();

    let document = Document::open(&path).unwrap();
    let pipeline = ExtractionPipeline::new(options_in(dir.path()));

    let mut events = Vec::new();
    let err = pipeline
        .extract(&document, ExtractionMethod::Ocr, &mut |e| events.push(e))
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::MissingCredential));
    // Failed fast: no unit was started and no staging dir appeared.
    assert!(events.is_empty());
    assert!(!dir.path().join("staging").exists());
}

#[tokio::test]
async fn ocr_is_rejected_for_docx_documents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("letter.docx");
    write_docx(&path, &[Some("text")]);

    let document = Document::open(&path).unwrap();
    let client = PanickingOcr;
    let pipeline = ExtractionPipeline::new(options_in(dir.path())).with_ocr_client(&client);

    let err = pipeline
        .extract(&document, ExtractionMethod::Ocr, &mut |_| {})
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ExtractError::MethodUnsupported {
            method: ExtractionMethod::Ocr,
            ..
        }
    ));
}

#[tokio::test]
async fn unsupported_extension_is_rejected_at_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.md");
    fs::write(&path, b"# notes").unwrap();

    assert!(matches!(
        Document::open(&path),
        Err(ExtractError::UnsupportedKind(_))
    ));
}

#[tokio::test]
async fn zero_paragraph_docx_yields_empty_success() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blank.docx");
    write_docx(&path, &[]);

    let document = Document::open(&path).unwrap();
    let pipeline = ExtractionPipeline::new(options_in(dir.path()));
    let result = pipeline
        .extract(&document, ExtractionMethod::Direct, &mut |_| {})
        .await
        .unwrap();

    assert_eq!(result.unit_count(), 0);
    assert_eq!(result.full_text(), "");
}

#[tokio::test]
async fn full_text_round_trips_successful_fragments() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("list.docx");
    let fragments = ["one", "two", "three"];
    write_docx(&path, &[Some("one"), Some("two"), Some("three")]);

    let document = Document::open(&path).unwrap();
    let pipeline = ExtractionPipeline::new(options_in(dir.path()));
    let result = pipeline
        .extract(&document, ExtractionMethod::Direct, &mut |_| {})
        .await
        .unwrap();

    let joined = result.full_text();
    let split: Vec<&str> = joined.split('\n').collect();
    assert_eq!(split, fragments);
}
