//! Format dispatch
//!
//! Detect the format, hand the file to the matching parser and return its
//! result untouched.

use tracing::{debug, info};

use crate::adapters::ImageLoader;
use crate::config::EngineConfig;
use crate::domain::result::Error;
use crate::domain::{FormatLabel, ParseResult, RawStatementFile};
use crate::ports::{DocumentLoader, VisionAssist};
use crate::services::delimited::parse_delimited;
use crate::services::detect::detect_format;
use crate::services::document::{self, parse_document};
use crate::services::markup::parse_markup;

/// Parse one uploaded statement
///
/// `loader` opens PDFs; without one, PDFs are reported as unsupported.
/// `assist` is only consulted by the document/image path.
pub fn parse_statement(
    file: &RawStatementFile,
    config: &EngineConfig,
    loader: Option<&dyn DocumentLoader>,
    assist: Option<&dyn VisionAssist>,
) -> ParseResult {
    let format = detect_format(&file.filename, &file.content);
    info!(%format, bytes = file.content.len(), "Dispatching statement");

    match format {
        FormatLabel::Csv => parse_delimited(&file.text(), config),
        FormatLabel::Ofx | FormatLabel::Qfx => parse_markup(&file.text(), format),
        FormatLabel::Pdf => {
            let Some(loader) = loader else {
                return ParseResult::failed(
                    format,
                    document::PARSER_TEXT,
                    Error::FormatUnsupported("pdf (no document loader configured)".to_string()),
                );
            };
            open_and_parse(loader, file, format, config, assist)
        }
        FormatLabel::Png | FormatLabel::Jpeg | FormatLabel::Gif | FormatLabel::Webp => {
            let loader = ImageLoader::new(format.mime_type());
            open_and_parse(&loader, file, format, config, assist)
        }
    }
}

fn open_and_parse(
    loader: &dyn DocumentLoader,
    file: &RawStatementFile,
    format: FormatLabel,
    config: &EngineConfig,
    assist: Option<&dyn VisionAssist>,
) -> ParseResult {
    debug!(loader = loader.name(), "Opening document");
    match loader.load(&file.content) {
        Ok(source) => parse_document(source.as_ref(), format, config, assist),
        Err(err) => ParseResult::failed(format, document::PARSER_TEXT, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(filename: &str, content: &[u8]) -> ParseResult {
        parse_statement(
            &RawStatementFile::new(filename, content),
            &EngineConfig::default(),
            None,
            None,
        )
    }

    #[test]
    fn test_dispatches_delimited_text() {
        let result = parse("jan.csv", b"Date,Description,Amount\n2024-01-15,Coffee,-4.50\n");
        assert_eq!(result.format, FormatLabel::Csv);
        assert_eq!(result.parser, "csv");
        assert_eq!(result.transactions.len(), 1);
    }

    #[test]
    fn test_dispatches_markup_variants() {
        let body = b"<STMTTRN><DTPOSTED>20240115<TRNAMT>-45.99<NAME>AMAZON</STMTTRN>";
        assert_eq!(parse("a.qfx", body).format, FormatLabel::Qfx);
        assert_eq!(parse("a.ofx", body).parser, "ofx");
    }

    #[test]
    fn test_pdf_without_loader_is_unsupported() {
        let result = parse("feb.pdf", b"%PDF-1.7");
        assert!(result.transactions.is_empty());
        assert!(result.errors[0].starts_with("Unsupported file type"));
    }

    /// Single-page PDF with one Helvetica text line per entry
    #[cfg(feature = "pdf")]
    fn text_pdf(lines: &[&str]) -> Vec<u8> {
        let mut content = String::from("BT\n/F1 11 Tf\n72 720 Td\n");
        for line in lines {
            content.push_str(&format!("({}) Tj\n0 -16 Td\n", line));
        }
        content.push_str("ET\n");

        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
                .to_string(),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".to_string(),
            format!("<< /Length {} >>\nstream\n{}endstream", content.len(), content),
        ];

        let mut pdf = String::from("%PDF-1.4\n");
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
        }
        let xref = pdf.len();
        pdf.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
        for offset in offsets {
            pdf.push_str(&format!("{:010} 00000 n \n", offset));
        }
        pdf.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref
        ));
        pdf.into_bytes()
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_default_engine_reads_text_pdf() {
        let pdf = text_pdf(&[
            "ACME BANK MONTHLY SUMMARY",
            "01/15/2024 GROCERY OUTLET 1123 -45.10",
            "01/20/2024 PAYROLL ACME CORP 2,500.00",
            "01/28/2024 CITY WATER UTILITY -62.35",
        ]);
        let result = crate::StatementEngine::default().parse(&RawStatementFile::new("jan.pdf", pdf));

        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert_eq!(result.format, FormatLabel::Pdf);
        assert_eq!(result.parser, "pdf_text");
        assert_eq!(result.transactions.len(), 3);
        assert_eq!(result.transactions[1].amount, rust_decimal::Decimal::new(250000, 2));
        assert!(result.transactions[2].is_outflow());
    }

    #[test]
    fn test_image_without_assist_fails_with_guidance() {
        let result = parse("scan.png", b"\x89PNG\r\n\x1a\n\0");
        assert_eq!(result.format, FormatLabel::Png);
        assert!(result.errors[0].contains("requires an AI provider"));
    }
}
