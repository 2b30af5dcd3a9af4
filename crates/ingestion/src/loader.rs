//! Document folder loader
//!
//! Reads every `*.pdf` (page by page) and `*.txt` file of a folder. Each
//! non-empty page becomes a [`DocumentPage`] whose provenance is the file path.

use crate::errors::IngestionError;
use crate::pdf::extract_pages;
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument};

/// One page of loaded text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPage {
    pub text: String,
    pub source_id: String,
    /// 1-based page number within the source file
    pub page: u32,
}

/// Supported document extensions
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["pdf", "txt"];

/// Load all supported documents of `dir`, files in name order.
///
/// A file that fails to parse is logged and skipped. A folder that yields no
/// pages at all is an error.
#[instrument(fields(dir = %dir.display()))]
pub fn load_directory(dir: &Path) -> Result<Vec<DocumentPage>, IngestionError> {
    if !dir.is_dir() {
        return Err(IngestionError::DirectoryNotFound(dir.display().to_string()));
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_supported(path))
        .collect();
    files.sort();

    let mut pages = Vec::new();
    for path in &files {
        match load_file(path) {
            Ok(file_pages) => pages.extend(file_pages),
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to load document, skipping");
            }
        }
    }

    if pages.is_empty() {
        return Err(IngestionError::NoDocuments(dir.display().to_string()));
    }

    info!(files = files.len(), pages = pages.len(), "Documents loaded");
    Ok(pages)
}

/// Load one supported file
pub fn load_file(path: &Path) -> Result<Vec<DocumentPage>, IngestionError> {
    let source_id = path.display().to_string();

    let pages = if has_extension(path, "pdf") {
        extract_pages(path)?
            .into_iter()
            .map(|p| DocumentPage {
                text: p.text,
                source_id: source_id.clone(),
                page: p.number,
            })
            .collect()
    } else {
        vec![DocumentPage {
            text: std::fs::read_to_string(path)?,
            source_id,
            page: 1,
        }]
    };

    Ok(pages
        .into_iter()
        .filter(|p: &DocumentPage| !p.text.trim().is_empty())
        .collect())
}

fn is_supported(path: &Path) -> bool {
    SUPPORTED_EXTENSIONS.iter().any(|ext| has_extension(path, ext))
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}
