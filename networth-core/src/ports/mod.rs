//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external collaborators. The parsing logic
//! depends only on these traits, not on a rendering library or an AI vendor.

mod document;
mod vision;

pub use document::{DocumentLoader, PageSource, RasterPage};
pub use vision::VisionAssist;
