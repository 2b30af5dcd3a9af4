//! Ingestion processor
//!
//! Core pipeline: load a folder, chunk its pages, embed the chunks into a
//! vector index and build the workflow excerpt.

use crate::chunker::{Chunker, ChunkingConfig};
use crate::errors::IngestionError;
use crate::excerpt::build_excerpt;
use crate::loader::{load_directory, DocumentPage};
use docintel_common::config::DocumentsConfig;
use docintel_common::{metrics, Embedder, VectorIndex};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};

/// Counts reported after processing a folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestionStats {
    pub documents: usize,
    pub pages: usize,
    pub chunks: usize,
}

/// A processed folder, ready for question answering and analysis
#[derive(Debug)]
pub struct ProcessedCorpus {
    pub index: VectorIndex,
    pub excerpt: String,
    pub stats: IngestionStats,
}

/// Ingestion processor
pub struct DocumentProcessor {
    embedder: Arc<dyn Embedder>,
    chunking: ChunkingConfig,
    excerpt_pages: usize,
    excerpt_page_chars: usize,
}

impl DocumentProcessor {
    pub fn new(embedder: Arc<dyn Embedder>, config: &DocumentsConfig) -> Self {
        Self {
            embedder,
            chunking: ChunkingConfig::from(config),
            excerpt_pages: config.excerpt_pages,
            excerpt_page_chars: config.excerpt_page_chars,
        }
    }

    /// Load, chunk and index every supported document of `dir`
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub async fn process_directory(&self, dir: &Path) -> Result<ProcessedCorpus, IngestionError> {
        info!("Processing document folder");

        let pages = load_pages(dir).await?;
        let chunker = Chunker::new(&self.chunking)?;
        let passages = chunker.chunk_pages(&pages);

        let stats = IngestionStats {
            documents: count_documents(&pages),
            pages: pages.len(),
            chunks: passages.len(),
        };

        let index = VectorIndex::build(self.embedder.clone(), passages).await?;
        metrics::record_ingestion(stats.documents, stats.chunks);

        info!(
            documents = stats.documents,
            pages = stats.pages,
            chunks = stats.chunks,
            "Folder processed"
        );

        Ok(ProcessedCorpus {
            index,
            excerpt: self.excerpt_of(&pages),
            stats,
        })
    }

    /// Process `dir` and persist the index to `index_path`
    pub async fn process_and_save(
        &self,
        dir: &Path,
        index_path: &Path,
    ) -> Result<ProcessedCorpus, IngestionError> {
        let corpus = self.process_directory(dir).await?;
        corpus.index.save(index_path).await?;
        Ok(corpus)
    }

    /// Reload a persisted index, rebuilding the excerpt from the source folder
    #[instrument(skip(self), fields(index = %index_path.display()))]
    pub async fn reload(
        &self,
        dir: &Path,
        index_path: &Path,
    ) -> Result<ProcessedCorpus, IngestionError> {
        let index = VectorIndex::load(index_path, self.embedder.clone()).await?;
        let pages = load_pages(dir).await?;

        let stats = IngestionStats {
            documents: index.manifest().sources.len(),
            pages: pages.len(),
            chunks: index.manifest().passage_count,
        };

        Ok(ProcessedCorpus {
            index,
            excerpt: self.excerpt_of(&pages),
            stats,
        })
    }

    fn excerpt_of(&self, pages: &[DocumentPage]) -> String {
        build_excerpt(pages, self.excerpt_pages, self.excerpt_page_chars)
    }
}

/// Folder loading is blocking file IO; keep it off the async workers
async fn load_pages(dir: &Path) -> Result<Vec<DocumentPage>, IngestionError> {
    let dir: PathBuf = dir.to_path_buf();
    tokio::task::spawn_blocking(move || load_directory(&dir))
        .await
        .map_err(|e| IngestionError::Index(docintel_common::AppError::Internal {
            message: format!("Document loading task failed: {}", e),
        }))?
}

fn count_documents(pages: &[DocumentPage]) -> usize {
    pages
        .iter()
        .map(|p| p.source_id.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}
