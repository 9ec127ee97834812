//! The `preview` subcommand: first page of a PDF as a PNG.

use std::path::{Path, PathBuf};

use console::style;

use crate::extract::PageRenderer;
use crate::models::{Document, DocumentKind};

pub fn cmd_preview(file: &Path, output: Option<PathBuf>, dpi: u32) -> anyhow::Result<()> {
    let document = Document::open(file)?;
    if document.kind() != DocumentKind::Pdf {
        anyhow::bail!("preview is only available for PDF documents");
    }

    let renderer = PageRenderer::new()?;
    if renderer.page_count(&document)? == 0 {
        anyhow::bail!("document has no pages");
    }

    let image = renderer.render_page(&document, 0, dpi)?;

    let output = output.unwrap_or_else(|| {
        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        file.with_file_name(format!("{stem}_preview.png"))
    });
    image.save_with_format(&output, image::ImageFormat::Png)?;

    println!("{} Wrote {}", style("→").cyan(), output.display());
    Ok(())
}
