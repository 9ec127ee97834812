//! PDF page rasterization for OCR input.
//!
//! Pages render at a configurable DPI; higher resolutions trade time
//! for recognition accuracy. pdfium is bound dynamically, looking for
//! a local library first and falling back to the system one.

use image::DynamicImage;
use pdfium_render::prelude::*;

use crate::error::{ExtractError, UnitError};
use crate::models::Document;

/// Renders single PDF pages to raster images.
pub struct PageRenderer {
    pdfium: Pdfium,
}

impl PageRenderer {
    /// Bind the pdfium library.
    pub fn new() -> Result<Self, ExtractError> {
        let bindings =
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library())
                .map_err(|e| {
                    ExtractError::DocumentOpen(format!(
                        "pdfium library unavailable (install libpdfium): {e:?}"
                    ))
                })?;
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Number of pages in the document.
    pub fn page_count(&self, document: &Document) -> Result<usize, ExtractError> {
        let doc = self
            .pdfium
            .load_pdf_from_file(document.path(), None)
            .map_err(|e| ExtractError::DocumentOpen(format!("pdf open failed: {e:?}")))?;
        Ok(doc.pages().len() as usize)
    }

    /// Render the page at `index` to an image at the requested DPI.
    ///
    /// Pixel dimensions derive from the page's point size (72 points
    /// per inch), so the same page and DPI always produce the same
    /// dimensions.
    pub fn render_page(
        &self,
        document: &Document,
        index: usize,
        dpi: u32,
    ) -> Result<DynamicImage, UnitError> {
        let doc = self
            .pdfium
            .load_pdf_from_file(document.path(), None)
            .map_err(|e| UnitError::Render(format!("pdf open failed: {e:?}")))?;

        let page = doc
            .pages()
            .get(index as u16)
            .map_err(|e| UnitError::Render(format!("page {index} load failed: {e:?}")))?;

        let scale = dpi as f32 / 72.0;
        let width = (page.width().value * scale).round().max(1.0) as i32;
        let height = (page.height().value * scale).round().max(1.0) as i32;

        let config = PdfRenderConfig::new().set_target_size(width, height);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| UnitError::Render(format!("page {index} render failed: {e:?}")))?;

        Ok(bitmap.as_image())
    }
}
