//! DocIntel Ingestion
//!
//! Turns a folder of PDF and text documents into:
//! 1. Pages with file provenance
//! 2. Overlapping text chunks
//! 3. A persisted vector index
//! 4. The document excerpt analysed by the workflow

pub mod chunker;
pub mod errors;
pub mod excerpt;
pub mod loader;
pub mod pdf;
pub mod processor;

pub use errors::IngestionError;
pub use loader::DocumentPage;
pub use processor::{DocumentProcessor, IngestionStats, ProcessedCorpus};
