//! Raster image uploads
//!
//! A screenshot or photo of a statement is a one-page document with no text
//! layer, so it always goes to the vision collaborator.

use crate::domain::result::{Error, Result};
use crate::ports::{DocumentLoader, PageSource, RasterPage};

/// A single encoded image held in memory
pub struct ImageDocument<'a> {
    bytes: &'a [u8],
    mime_type: String,
}

impl<'a> ImageDocument<'a> {
    pub fn new(bytes: &'a [u8], mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }
}

impl PageSource for ImageDocument<'_> {
    fn page_count(&self) -> usize {
        1
    }

    fn extract_text(&self, page: usize) -> Result<String> {
        check_page(page)?;
        Ok(String::new())
    }

    fn rasterize(&self, page: usize) -> Result<RasterPage> {
        check_page(page)?;
        Ok(RasterPage {
            bytes: self.bytes.to_vec(),
            mime_type: self.mime_type.clone(),
        })
    }
}

fn check_page(page: usize) -> Result<()> {
    if page == 0 {
        Ok(())
    } else {
        Err(Error::structural(format!("Image has a single page, requested page {}", page + 1)))
    }
}

/// Opens image bytes of one MIME type as an [`ImageDocument`]
pub struct ImageLoader {
    mime_type: String,
}

impl ImageLoader {
    pub fn new(mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
        }
    }
}

impl DocumentLoader for ImageLoader {
    fn name(&self) -> &str {
        "image"
    }

    fn load<'a>(&self, content: &'a [u8]) -> Result<Box<dyn PageSource + 'a>> {
        if content.is_empty() {
            return Err(Error::structural("Image file is empty"));
        }
        Ok(Box::new(ImageDocument::new(content, self.mime_type.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_page_without_text() {
        let bytes = [0x89, b'P', b'N', b'G'];
        let doc = ImageDocument::new(&bytes, "image/png");
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.extract_text(0).unwrap(), "");

        let page = doc.rasterize(0).unwrap();
        assert_eq!(page.bytes, bytes.to_vec());
        assert_eq!(page.mime_type, "image/png");

        assert!(doc.rasterize(1).is_err());
    }

    #[test]
    fn test_loader_rejects_empty_content() {
        let loader = ImageLoader::new("image/jpeg");
        assert!(loader.load(&[]).is_err());
        assert_eq!(loader.load(&[0xff, 0xd8]).unwrap().page_count(), 1);
    }
}
