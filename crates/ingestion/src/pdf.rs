//! PDF text extraction module
//!
//! Extracts text page by page using lopdf. Pages where lopdf's own extractor
//! fails fall back to a plain scan of the content stream's text operators.

use crate::errors::IngestionError;
use lopdf::{Document, ObjectId};
use std::path::Path;
use tracing::{debug, warn};

/// Text of one PDF page (1-based page number)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfPage {
    pub number: u32,
    pub text: String,
}

/// Extract the text of every page of a PDF file, in page order
pub fn extract_pages(path: &Path) -> Result<Vec<PdfPage>, IngestionError> {
    let doc = Document::load(path).map_err(|e| IngestionError::PdfParseError {
        path: path.display().to_string(),
        message: format!("Failed to load PDF: {}", e),
    })?;

    let pages = doc.get_pages();
    debug!(path = %path.display(), page_count = pages.len(), "Extracting text from PDF");

    let mut result = Vec::with_capacity(pages.len());
    for (number, page_id) in pages {
        let text = match extract_page_text(&doc, number, page_id) {
            Ok(text) => text,
            Err(e) => {
                warn!(page = number, error = %e, "Failed to extract text from page, skipping");
                continue;
            }
        };

        result.push(PdfPage {
            number,
            text: clean_text(&text),
        });
    }

    Ok(result)
}

fn extract_page_text(doc: &Document, number: u32, page_id: ObjectId) -> Result<String, String> {
    match doc.extract_text(&[number]) {
        Ok(text) if !text.trim().is_empty() => Ok(text),
        Ok(_) | Err(_) => {
            let content = doc.get_page_content(page_id).map_err(|e| e.to_string())?;
            Ok(extract_text_from_content(&content))
        }
    }
}

/// Scan a content stream for text between BT and ET operators
fn extract_text_from_content(content: &[u8]) -> String {
    let content_str = String::from_utf8_lossy(content);
    let mut text = String::new();
    let mut in_text_block = false;
    let mut current_text = String::new();

    for line in content_str.lines() {
        let trimmed = line.trim();

        if trimmed == "BT" {
            in_text_block = true;
            continue;
        }

        if trimmed == "ET" {
            in_text_block = false;
            if !current_text.is_empty() {
                text.push_str(&current_text);
                text.push('\n');
                current_text.clear();
            }
            continue;
        }

        if in_text_block {
            if let Some(text_content) = extract_text_from_operator(trimmed) {
                current_text.push_str(&text_content);
            }
        }
    }

    text
}

/// Text shown by a single `Tj`, `'`, `"` or `TJ` operator line
fn extract_text_from_operator(line: &str) -> Option<String> {
    if line.ends_with("Tj") || line.ends_with('\'') || line.ends_with('"') {
        let start = line.find('(')?;
        let end = line.rfind(')')?;
        if end > start {
            return Some(decode_pdf_string(&line[start + 1..end]));
        }
        return None;
    }

    if line.ends_with("TJ") {
        let mut result = String::new();
        let mut in_paren = false;
        let mut current = String::new();

        for ch in line.chars() {
            match ch {
                '(' => in_paren = true,
                ')' => {
                    in_paren = false;
                    result.push_str(&decode_pdf_string(&current));
                    current.clear();
                }
                _ if in_paren => current.push(ch),
                _ => {}
            }
        }

        if !result.is_empty() {
            return Some(result);
        }
    }

    None
}

/// Decode PDF string escapes
fn decode_pdf_string(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some(c) => result.push(c),
                None => {}
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Collapse runs of spaces within lines, drop blank lines and BOMs, normalise quotes
pub fn clean_text(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .replace('\u{FEFF}', "")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}

/// Write a minimal uncompressed PDF with one text line per page
#[cfg(test)]
pub(crate) fn write_test_pdf(path: &Path, pages: &[&str]) {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("Hello   World\n\n  Test  "), "Hello World\nTest");
        assert_eq!(clean_text("\u{FEFF}\u{201C}quoted\u{201D} it\u{2019}s"), "\"quoted\" it's");
    }

    #[test]
    fn test_decode_pdf_string() {
        assert_eq!(decode_pdf_string("Hello\\nWorld"), "Hello\nWorld");
        assert_eq!(decode_pdf_string("Test\\(paren\\)"), "Test(paren)");
    }

    #[test]
    fn test_content_stream_fallback() {
        let content = b"BT\n/F1 12 Tf\n(Payment is due) Tj\n[(in ) -20 (30 days)] TJ\nET\n";
        assert_eq!(extract_text_from_content(content), "Payment is duein 30 days\n");
    }

    #[test]
    fn test_extract_pages_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("supply.pdf");
        write_test_pdf(&path, &["Supply agreement", "Liability is unlimited"]);

        let pages = extract_pages(&path).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].number, 1);
        assert!(pages[0].text.contains("Supply agreement"));
        assert!(pages[1].text.contains("Liability is unlimited"));
    }

    #[test]
    fn test_corrupt_pdf_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();

        let err = extract_pages(&path).unwrap_err();
        assert!(matches!(err, IngestionError::PdfParseError { .. }));
    }
}
