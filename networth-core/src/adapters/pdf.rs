//! Embedded PDF text via pdf-extract
//!
//! pdf-extract reads the text layer only. It cannot render pages, so scanned
//! PDFs need a loader that can rasterize for the vision collaborator.

use tracing::debug;

use crate::domain::result::{Error, Result};
use crate::ports::{DocumentLoader, PageSource, RasterPage};

/// PDF text extracted up front, one string per page
pub struct PdfTextDocument {
    pages: Vec<String>,
}

impl PageSource for PdfTextDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn extract_text(&self, page: usize) -> Result<String> {
        self.pages
            .get(page)
            .cloned()
            .ok_or_else(|| Error::structural(format!("PDF has no page {}", page + 1)))
    }

    fn rasterize(&self, page: usize) -> Result<RasterPage> {
        Err(Error::structural(format!(
            "Page {} cannot be rendered: no PDF renderer is available",
            page + 1
        )))
    }
}

/// [`DocumentLoader`] backed by `pdf_extract`
#[derive(Debug, Default)]
pub struct PdfTextLoader;

impl PdfTextLoader {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentLoader for PdfTextLoader {
    fn name(&self) -> &str {
        "pdf-extract"
    }

    fn load<'a>(&self, content: &'a [u8]) -> Result<Box<dyn PageSource + 'a>> {
        let pages = pdf_extract::extract_text_from_mem_by_pages(content)
            .map_err(|e| Error::structural(format!("Could not read PDF: {}", e)))?;
        debug!(pages = pages.len(), "Extracted PDF text");
        Ok(Box::new(PdfTextDocument { pages }))
    }
}
