//! PDF rasterisation via pdfium.
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and must not run on Tokio worker threads. All rendering happens in
//! `tokio::task::spawn_blocking`.
//!
//! Output size is capped by `max_rendered_pixels` on the longest edge, not by
//! DPI.

use super::encode;
use super::input::ResumeFile;
use crate::error::ReviewError;
use async_trait::async_trait;
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, info};

/// Rendered first page of a resume, PNG-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub name: String,
    pub png: Vec<u8>,
}

/// Turns a resume PDF into its preview image.
#[async_trait]
pub trait PreviewRenderer: Send + Sync {
    async fn render_preview(&self, file: &ResumeFile) -> Result<PreviewImage, ReviewError>;
}

/// [`PreviewRenderer`] backed by pdfium.
#[derive(Debug, Clone)]
pub struct PdfiumRenderer {
    max_pixels: u32,
}

impl PdfiumRenderer {
    pub fn new(max_pixels: u32) -> Self {
        Self { max_pixels }
    }
}

#[async_trait]
impl PreviewRenderer for PdfiumRenderer {
    async fn render_preview(&self, file: &ResumeFile) -> Result<PreviewImage, ReviewError> {
        let mut pages = render_pages(file.bytes.clone(), self.max_pixels, 1).await?;
        let first = pages.pop().ok_or_else(|| ReviewError::ConversionFailed {
            detail: "document has no pages".into(),
        })?;
        let png = encode::png_bytes(&first).map_err(|e| ReviewError::ConversionFailed {
            detail: format!("PNG encoding failed: {e}"),
        })?;
        Ok(PreviewImage {
            name: file.preview_name(),
            png,
        })
    }
}

/// Rasterise up to `max_pages` leading pages of a PDF held in memory.
pub async fn render_pages(
    pdf: Vec<u8>,
    max_pixels: u32,
    max_pages: usize,
) -> Result<Vec<DynamicImage>, ReviewError> {
    tokio::task::spawn_blocking(move || render_pages_blocking(&pdf, max_pixels, max_pages))
        .await
        .map_err(|e| ReviewError::Internal(format!("Render task panicked: {}", e)))?
}

/// Bind pdfium: `PDFIUM_LIB_PATH` first, then the working directory, then the system.
pub fn bind_pdfium() -> Result<Pdfium, ReviewError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| ReviewError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

fn render_pages_blocking(
    pdf: &[u8],
    max_pixels: u32,
    max_pages: usize,
) -> Result<Vec<DynamicImage>, ReviewError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_byte_slice(pdf, None)
        .map_err(|e| ReviewError::ConversionFailed {
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let count = total_pages.min(max_pages);
    let mut results = Vec::with_capacity(count);
    for idx in 0..count {
        let page = pages
            .get(idx as u16)
            .map_err(|e| ReviewError::ConversionFailed {
                detail: format!("page {}: {:?}", idx + 1, e),
            })?;

        let bitmap =
            page.render_with_config(&render_config)
                .map_err(|e| ReviewError::ConversionFailed {
                    detail: format!("page {}: {:?}", idx + 1, e),
                })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );
        results.push(image);
    }

    Ok(results)
}
