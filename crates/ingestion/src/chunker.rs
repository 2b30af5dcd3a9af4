//! Text chunking module
//!
//! Splits loaded pages into overlapping character windows for embedding.

use crate::errors::IngestionError;
use crate::loader::DocumentPage;
use docintel_common::config::DocumentsConfig;
use docintel_common::Passage;
use text_splitter::{ChunkConfig, TextSplitter};
use tracing::debug;

/// Configuration for text chunking
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
    /// Chunks shorter than this (in characters) are dropped
    pub min_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            min_chunk_size: 1,
        }
    }
}

impl From<&DocumentsConfig> for ChunkingConfig {
    fn from(config: &DocumentsConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            min_chunk_size: config.min_chunk_size,
        }
    }
}

/// Text splitter built from a [`ChunkingConfig`]
pub struct Chunker {
    splitter: TextSplitter<text_splitter::Characters>,
    min_chunk_size: usize,
}

impl Chunker {
    pub fn new(config: &ChunkingConfig) -> Result<Self, IngestionError> {
        let chunk_config = ChunkConfig::new(config.chunk_size)
            .with_overlap(config.chunk_overlap)
            .map_err(|e| IngestionError::ChunkingError(e.to_string()))?;

        Ok(Self {
            splitter: TextSplitter::new(chunk_config),
            min_chunk_size: config.min_chunk_size,
        })
    }

    /// Split one text into chunks
    pub fn chunk_text<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.splitter
            .chunks(text)
            .filter(|chunk| chunk.chars().count() >= self.min_chunk_size)
            .collect()
    }

    /// Split pages into passages; each passage keeps its page's source
    pub fn chunk_pages(&self, pages: &[DocumentPage]) -> Vec<Passage> {
        let passages: Vec<Passage> = pages
            .iter()
            .flat_map(|page| {
                self.chunk_text(&page.text)
                    .into_iter()
                    .map(|chunk| Passage::new(chunk, page.source_id.clone()))
            })
            .collect();

        debug!(
            pages = pages.len(),
            chunk_count = passages.len(),
            "Pages chunked"
        );

        passages
    }
}
