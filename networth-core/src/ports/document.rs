//! Paged document port
//!
//! Rendering is effectful and slow, so the document pipeline only sees these two
//! operations per page. Tests drive the pipeline with in-memory fakes.

use crate::domain::result::Result;

/// A rasterized page ready to send to a vision collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterPage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// An opened paged document (PDF, or a single raster image)
pub trait PageSource {
    /// Number of pages
    fn page_count(&self) -> usize;

    /// Embedded text of a 0-based page; empty when the page carries no text layer
    fn extract_text(&self, page: usize) -> Result<String>;

    /// Render a 0-based page to an image
    fn rasterize(&self, page: usize) -> Result<RasterPage>;
}

/// Opens raw document bytes as a [`PageSource`]
pub trait DocumentLoader: Send + Sync {
    /// Loader name (e.g., "pdf-extract")
    fn name(&self) -> &str;

    /// Open a document held in memory
    fn load<'a>(&self, content: &'a [u8]) -> Result<Box<dyn PageSource + 'a>>;
}
