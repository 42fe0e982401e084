//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - In-memory raster images as single-page documents
//! - pdf-extract for embedded PDF text (`pdf` feature)
//!
//! Vision collaborators are supplied by the hosting service.

pub mod image;
#[cfg(feature = "pdf")]
pub mod pdf;

pub use image::{ImageDocument, ImageLoader};
#[cfg(feature = "pdf")]
pub use pdf::PdfTextLoader;
