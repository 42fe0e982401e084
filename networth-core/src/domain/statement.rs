//! Uploaded statement file

use std::path::Path;

use crate::domain::result::Result;

/// An uploaded statement: the original filename and its raw bytes
///
/// Lives for a single parse call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStatementFile {
    pub filename: String,
    pub content: Vec<u8>,
}

impl RawStatementFile {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    /// Read a statement from disk, keeping only the file name
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { filename, content })
    }

    /// Content decoded as text; invalid UTF-8 is replaced and a leading BOM dropped
    pub fn text(&self) -> String {
        let text = String::from_utf8_lossy(&self.content);
        text.strip_prefix('\u{feff}').unwrap_or(&text).to_string()
    }
}
