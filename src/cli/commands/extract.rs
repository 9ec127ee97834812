//! The `extract` subcommand.

use std::fs;
use std::path::PathBuf;

use console::style;
use indicatif::ProgressBar;

use crate::config::Settings;
use crate::error::ExtractError;
use crate::extract::{ExtractOptions, ExtractionEvent, ExtractionPipeline};
use crate::history::HistoryLog;
use crate::models::{Document, ExtractionMethod, ExtractionResult};
use crate::ocr::GeminiOcrClient;

/// Arguments of one `extract` invocation.
pub struct ExtractArgs {
    pub file: PathBuf,
    pub method: ExtractionMethod,
    pub output: Option<PathBuf>,
    pub stdout: bool,
    pub dpi: Option<u32>,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

/// Run one extraction and write the text artifact.
pub async fn cmd_extract(settings: &Settings, args: ExtractArgs) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let document = Document::open(&args.file)?;
    println!(
        "{} {} ({} document)",
        style("→").cyan(),
        document.path().display(),
        document.kind()
    );

    let mut options = ExtractOptions::from_settings(settings);
    if let Some(dpi) = args.dpi {
        options.dpi = dpi;
    }

    // The client only exists when a credential was supplied; the
    // pipeline turns its absence into MissingCredential for ocr mode.
    let model = args
        .model
        .unwrap_or_else(|| settings.ocr_model.clone());
    let client = match &args.api_key {
        Some(key) if args.method == ExtractionMethod::Ocr => {
            Some(GeminiOcrClient::new(key.clone(), model)?)
        }
        _ => None,
    };

    let mut pipeline = ExtractionPipeline::new(options);
    if let Some(ref client) = client {
        pipeline = pipeline.with_ocr_client(client);
    }

    let mut bar: Option<ProgressBar> = None;
    let mut on_event = |event: ExtractionEvent| match event {
        ExtractionEvent::Started { units } => {
            bar = Some(ProgressBar::new(units as u64));
        }
        ExtractionEvent::UnitCompleted { completed, .. } => {
            if let Some(bar) = &bar {
                bar.set_position(completed as u64);
            }
        }
        ExtractionEvent::Finished { .. } => {
            if let Some(bar) = &bar {
                bar.finish_and_clear();
            }
        }
        ExtractionEvent::UnitStarted { .. } => {}
    };

    let outcome = pipeline
        .extract(&document, args.method, &mut on_event)
        .await;

    let result = match outcome {
        Ok(result) => result,
        Err(ExtractError::EmptyResult(report)) => {
            println!(
                "{} Nothing could be extracted from {} units:",
                style("✗").red(),
                report.unit_count()
            );
            print_failures(&report);
            record_history(settings, &document, args.method, &report);
            anyhow::bail!("extraction produced no text");
        }
        Err(err) => return Err(err.into()),
    };

    println!(
        "{} Extracted {}/{} {}s",
        style("✓").green(),
        result.succeeded(),
        result.unit_count(),
        result.kind().unit_label()
    );

    if result.failed() > 0 {
        println!(
            "{} {} {}s failed:",
            style("!").yellow(),
            result.failed(),
            result.kind().unit_label()
        );
        print_failures(&result);
    }

    let text = result.full_text();
    if args.stdout {
        println!("{text}");
    } else {
        let output = args
            .output
            .unwrap_or_else(|| document.default_output_path());
        fs::write(&output, text.as_bytes())?;
        println!("{} Wrote {}", style("→").cyan(), output.display());
    }

    record_history(settings, &document, args.method, &result);
    Ok(())
}

fn print_failures(result: &ExtractionResult) {
    for line in result.failure_summary() {
        println!("    {line}");
    }
}

/// History is best-effort; a write failure never fails the extraction.
fn record_history(
    settings: &Settings,
    document: &Document,
    method: ExtractionMethod,
    result: &ExtractionResult,
) {
    let file_name = document
        .path()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| document.path().display().to_string());

    let mut log = HistoryLog::load(settings.history_path());
    if let Err(err) = log.add(file_name, method, result.unit_count(), result.succeeded()) {
        tracing::warn!("failed to record history: {err}");
    }
}
