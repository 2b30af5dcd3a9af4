//! Ingestion error types

use docintel_common::errors::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("PDF parse error for {path}: {message}")]
    PdfParseError { path: String, message: String },

    #[error("Chunking error: {0}")]
    ChunkingError(String),

    #[error("Document folder not found: {0}")]
    DirectoryNotFound(String),

    #[error("No readable PDF or text documents in {0}")]
    NoDocuments(String),

    #[error("Index error: {0}")]
    Index(#[from] AppError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<IngestionError> for AppError {
    fn from(e: IngestionError) -> Self {
        match e {
            IngestionError::Index(inner) => inner,
            other => AppError::Document {
                message: other.to_string(),
            },
        }
    }
}
