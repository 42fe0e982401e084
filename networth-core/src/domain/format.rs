//! Statement format labels

use std::fmt;

use serde::{Deserialize, Serialize};

/// Internal classification of an uploaded statement file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatLabel {
    /// Delimited text (comma or tab separated)
    Csv,
    /// Open Financial Exchange markup
    Ofx,
    /// Quicken's OFX variant
    Qfx,
    Pdf,
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl FormatLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatLabel::Csv => "csv",
            FormatLabel::Ofx => "ofx",
            FormatLabel::Qfx => "qfx",
            FormatLabel::Pdf => "pdf",
            FormatLabel::Png => "png",
            FormatLabel::Jpeg => "jpeg",
            FormatLabel::Gif => "gif",
            FormatLabel::Webp => "webp",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            FormatLabel::Csv => "text/csv",
            FormatLabel::Ofx => "application/x-ofx",
            FormatLabel::Qfx => "application/x-qfx",
            FormatLabel::Pdf => "application/pdf",
            FormatLabel::Png => "image/png",
            FormatLabel::Jpeg => "image/jpeg",
            FormatLabel::Gif => "image/gif",
            FormatLabel::Webp => "image/webp",
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(
            self,
            FormatLabel::Png | FormatLabel::Jpeg | FormatLabel::Gif | FormatLabel::Webp
        )
    }
}

impl fmt::Display for FormatLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
