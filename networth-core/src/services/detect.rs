//! Format detection from filename and content

use crate::domain::FormatLabel;

/// Bytes inspected when sniffing text content for markup
const SNIFF_LEN: usize = 1000;

/// Classify an upload
///
/// Priority: filename extension, then magic bytes, then markup tokens in the
/// first kilobyte. Anything else is treated as delimited text.
pub fn detect_format(filename: &str, content: &[u8]) -> FormatLabel {
    if let Some(label) = from_extension(filename) {
        return label;
    }
    if let Some(label) = from_magic_bytes(content) {
        return label;
    }

    let head = &content[..content.len().min(SNIFF_LEN)];
    let head = String::from_utf8_lossy(head).to_ascii_uppercase();
    if head.contains("<OFX>") || head.contains("OFXHEADER") {
        return FormatLabel::Ofx;
    }

    FormatLabel::Csv
}

fn from_extension(filename: &str) -> Option<FormatLabel> {
    let (_, ext) = filename.rsplit_once('.')?;
    let label = match ext.to_ascii_lowercase().as_str() {
        "csv" | "tsv" | "txt" => FormatLabel::Csv,
        "ofx" => FormatLabel::Ofx,
        "qfx" => FormatLabel::Qfx,
        "pdf" => FormatLabel::Pdf,
        "png" => FormatLabel::Png,
        "jpg" | "jpeg" => FormatLabel::Jpeg,
        "gif" => FormatLabel::Gif,
        "webp" => FormatLabel::Webp,
        _ => return None,
    };
    Some(label)
}

fn from_magic_bytes(content: &[u8]) -> Option<FormatLabel> {
    if content.starts_with(b"%PDF") {
        Some(FormatLabel::Pdf)
    } else if content.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some(FormatLabel::Png)
    } else if content.starts_with(&[0xff, 0xd8]) {
        Some(FormatLabel::Jpeg)
    } else if content.starts_with(b"GIF87a") || content.starts_with(b"GIF89a") {
        Some(FormatLabel::Gif)
    } else if content.len() >= 12 && &content[..4] == b"RIFF" && &content[8..12] == b"WEBP" {
        Some(FormatLabel::Webp)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_wins() {
        assert_eq!(detect_format("statement.CSV", b"%PDF-1.7"), FormatLabel::Csv);
        assert_eq!(detect_format("bank.qfx", b""), FormatLabel::Qfx);
        assert_eq!(detect_format("export.ofx", b""), FormatLabel::Ofx);
        assert_eq!(detect_format("scan.JPG", b""), FormatLabel::Jpeg);
        assert_eq!(detect_format("feb.pdf", b""), FormatLabel::Pdf);
    }

    #[test]
    fn test_magic_bytes() {
        assert_eq!(detect_format("upload", b"%PDF-1.4\n..."), FormatLabel::Pdf);
        assert_eq!(detect_format("upload", b"\x89PNG\r\n\x1a\n\0\0"), FormatLabel::Png);
        assert_eq!(detect_format("upload.bin", &[0xff, 0xd8, 0xff, 0xe0]), FormatLabel::Jpeg);
        assert_eq!(detect_format("upload", b"GIF89a...."), FormatLabel::Gif);
        assert_eq!(detect_format("upload", b"RIFF\x10\0\0\0WEBPVP8 "), FormatLabel::Webp);
    }

    #[test]
    fn test_markup_sniffing() {
        let ofx = b"OFXHEADER:100\nDATA:OFXSGML\n<OFX><BANKMSGSRSV1>";
        assert_eq!(detect_format("download", ofx), FormatLabel::Ofx);
        assert_eq!(detect_format("download", b"<ofx>\n<signonmsgsrsv1>"), FormatLabel::Ofx);
    }

    #[test]
    fn test_defaults_to_delimited_text() {
        assert_eq!(detect_format("download", b"Date,Description,Amount\n"), FormatLabel::Csv);
        assert_eq!(detect_format("", b""), FormatLabel::Csv);
        assert_eq!(detect_format("archive.zip", b"PK\x03\x04"), FormatLabel::Csv);
    }
}
