//! PDF rasterisation: render preview pages to size-bounded JPEGs via pdfium.
//!
//! Rendering is split in two so the page loop can be tested without a pdfium
//! shared library: [`PageSource`] abstracts "a document whose pages can be
//! rasterised", and [`render_pages`] drives it. [`PdfiumRenderer`] ties the
//! two together for production.
//!
//! A failure on one page never aborts its siblings: the output always has
//! one slot per requested page, `None` where that page could not be
//! produced.

use crate::config::RenderConfig;
use crate::error::{HarvestError, PageError};
use crate::pipeline::encode::encode_under_budget;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// A document whose pages can be rasterised.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Rasterise the zero-based page `index` at `scale`× its natural size.
    fn rasterize(&self, index: usize, scale: f32) -> Result<DynamicImage, PageError>;
}

/// Turns PDF bytes into preview images.
pub trait Renderer {
    /// One slot per entry of `pages`, `None` for pages that failed.
    fn render(&self, pdf: &[u8], pages: &[usize]) -> Vec<Option<Vec<u8>>>;
}

/// Render `pages` of `source`, one output slot per requested index.
pub fn render_pages(
    source: &dyn PageSource,
    pages: &[usize],
    config: &RenderConfig,
) -> Vec<Option<Vec<u8>>> {
    pages
        .iter()
        .map(|&index| match render_page(source, index, config) {
            Ok(image) => image,
            Err(e) => {
                warn!("{}", e);
                None
            }
        })
        .collect()
}

fn render_page(
    source: &dyn PageSource,
    index: usize,
    config: &RenderConfig,
) -> Result<Option<Vec<u8>>, PageError> {
    let total = source.page_count();
    if total == 0 {
        debug!("Document has no pages; page {} skipped", index + 1);
        return Ok(None);
    }
    if index >= total {
        return Err(PageError::OutOfRange {
            page: index + 1,
            total,
        });
    }

    let image = source.rasterize(index, config.scale)?;
    let encoded = encode_under_budget(&image, config).map_err(|e| PageError::EncodeFailed {
        page: index + 1,
        detail: e.to_string(),
    })?;
    debug!(
        "Rendered page {} → {}x{} px, {} bytes at quality {}",
        index + 1,
        image.width(),
        image.height(),
        encoded.bytes.len(),
        encoded.quality
    );
    Ok(Some(encoded.bytes))
}

/// Renderer used when pdfium is unavailable: every page is `None`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPreview;

impl Renderer for NoPreview {
    fn render(&self, _pdf: &[u8], pages: &[usize]) -> Vec<Option<Vec<u8>>> {
        vec![None; pages.len()]
    }
}

// ── pdfium ───────────────────────────────────────────────────────────────

/// Production renderer backed by the pdfium library.
pub struct PdfiumRenderer {
    pdfium: Pdfium,
    config: RenderConfig,
}

impl PdfiumRenderer {
    /// Bind to pdfium: `PDFIUM_LIB_PATH` (a library file or the directory
    /// holding it) when set, the system library otherwise.
    pub fn bind(config: RenderConfig) -> Result<Self, HarvestError> {
        let bindings = match std::env::var("PDFIUM_LIB_PATH") {
            Ok(path) if !path.is_empty() => {
                let path = Path::new(&path);
                let lib = if path.is_dir() {
                    Pdfium::pdfium_platform_library_name_at_path(path)
                } else {
                    path.to_path_buf()
                };
                Pdfium::bind_to_library(&lib)
            }
            _ => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| HarvestError::PdfiumBindingFailed(format!("{:?}", e)))?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
            config,
        })
    }
}

impl Renderer for PdfiumRenderer {
    fn render(&self, pdf: &[u8], pages: &[usize]) -> Vec<Option<Vec<u8>>> {
        let document = match self.pdfium.load_pdf_from_byte_slice(pdf, None) {
            Ok(document) => document,
            Err(e) => {
                warn!("Could not open PDF ({} bytes): {:?}", pdf.len(), e);
                return vec![None; pages.len()];
            }
        };
        let source = PdfiumPages { document };
        info!("PDF loaded: {} pages", source.page_count());
        render_pages(&source, pages, &self.config)
    }
}

struct PdfiumPages<'a> {
    document: PdfDocument<'a>,
}

impl PageSource for PdfiumPages<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn rasterize(&self, index: usize, scale: f32) -> Result<DynamicImage, PageError> {
        let failed = |e: PdfiumError| PageError::RenderFailed {
            page: index + 1,
            detail: format!("{:?}", e),
        };
        let page = self.document.pages().get(index as u16).map_err(failed)?;
        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = page.render_with_config(&render_config).map_err(failed)?;
        Ok(bitmap.as_image())
    }
}
