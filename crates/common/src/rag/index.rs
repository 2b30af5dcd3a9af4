//! Vector similarity index
//!
//! Brute-force cosine similarity over every stored vector. Contract corpora
//! are a few thousand chunks at most, so a flat scan stays well under the
//! latency of the model call that follows it.

use crate::embeddings::Embedder;
use crate::errors::{AppError, Result};
use crate::metrics;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// A retrievable unit of document text with provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Passage text
    pub content: String,

    /// Provenance label, e.g. the originating file
    pub source_id: String,
}

impl Passage {
    pub fn new(content: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source_id: source_id.into(),
        }
    }
}

/// Passage with its similarity to the query
#[derive(Debug, Clone, Serialize)]
pub struct ScoredPassage {
    pub passage: Passage,

    /// Cosine similarity (-1.0 - 1.0)
    pub score: f32,
}

/// Common trait for retrieval backends
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Top `k` passages for `text`, best match first
    async fn query(&self, text: &str, k: usize) -> Result<Vec<ScoredPassage>>;

    /// Number of indexed passages
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Metadata stored alongside the vectors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexManifest {
    pub embedding_model: String,
    pub dimension: usize,
    pub passage_count: usize,
    pub sources: BTreeSet<String>,
    pub built_at: DateTime<Utc>,

    /// SHA-256 over every passage's source and content, hex encoded
    pub fingerprint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    passage: Passage,
    vector: Vec<f32>,
}

#[derive(Serialize, Deserialize)]
struct IndexSnapshot {
    manifest: IndexManifest,
    entries: Vec<IndexEntry>,
}

/// In-memory vector index
pub struct VectorIndex {
    manifest: IndexManifest,
    entries: Vec<IndexEntry>,
    embedder: Arc<dyn Embedder>,
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("manifest", &self.manifest)
            .field("entries", &self.entries.len())
            .finish()
    }
}

fn fingerprint(passages: &[Passage]) -> String {
    let mut hasher = Sha256::new();
    for passage in passages {
        hasher.update(passage.source_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(passage.content.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

impl VectorIndex {
    /// Embed every passage and build the index
    #[instrument(skip(embedder, passages), fields(passages = passages.len()))]
    pub async fn build(embedder: Arc<dyn Embedder>, passages: Vec<Passage>) -> Result<Self> {
        if passages.is_empty() {
            return Err(AppError::Retrieval {
                message: "Cannot build an index from zero passages".to_string(),
            });
        }

        let texts: Vec<String> = passages.iter().map(|p| p.content.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await?;

        if vectors.len() != passages.len() {
            return Err(AppError::Retrieval {
                message: format!(
                    "Embedder returned {} vectors for {} passages",
                    vectors.len(),
                    passages.len()
                ),
            });
        }

        let dimension = vectors[0].len();
        if let Some(bad) = vectors.iter().position(|v| v.len() != dimension) {
            return Err(AppError::Retrieval {
                message: format!(
                    "Passage {} embedded to {} dimensions, expected {}",
                    bad,
                    vectors[bad].len(),
                    dimension
                ),
            });
        }

        let manifest = IndexManifest {
            embedding_model: embedder.model_name().to_string(),
            dimension,
            passage_count: passages.len(),
            sources: passages.iter().map(|p| p.source_id.clone()).collect(),
            built_at: Utc::now(),
            fingerprint: fingerprint(&passages),
        };

        let entries = passages
            .into_iter()
            .zip(vectors)
            .map(|(passage, vector)| IndexEntry { passage, vector })
            .collect();

        info!(
            passages = manifest.passage_count,
            dimension = manifest.dimension,
            sources = manifest.sources.len(),
            "Vector index built"
        );
        metrics::record_index_size(manifest.passage_count);

        Ok(Self { manifest, entries, embedder })
    }

    /// Persist the index to `path`, creating parent directories
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let snapshot = IndexSnapshot {
            manifest: self.manifest.clone(),
            entries: self.entries.clone(),
        };
        let bytes = serde_json::to_vec(&snapshot)?;

        // Write then rename so a crash never leaves a truncated index behind
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;

        info!(path = %path.display(), passages = self.entries.len(), "Vector index saved");
        Ok(())
    }

    /// Reload an index saved by [`VectorIndex::save`]
    pub async fn load(path: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await.map_err(|e| AppError::Retrieval {
            message: format!("Failed to read index {}: {}", path.display(), e),
        })?;
        let snapshot: IndexSnapshot = serde_json::from_slice(&bytes).map_err(|e| AppError::Retrieval {
            message: format!("Corrupt index {}: {}", path.display(), e),
        })?;

        if snapshot.manifest.embedding_model != embedder.model_name() {
            warn!(
                stored = %snapshot.manifest.embedding_model,
                active = %embedder.model_name(),
                "Index was built with a different embedding model"
            );
        }
        if snapshot.entries.len() != snapshot.manifest.passage_count {
            return Err(AppError::Retrieval {
                message: format!(
                    "Index manifest lists {} passages but {} are stored",
                    snapshot.manifest.passage_count,
                    snapshot.entries.len()
                ),
            });
        }

        let dimension = snapshot.manifest.dimension;
        if let Some(bad) = snapshot.entries.iter().position(|e| e.vector.len() != dimension) {
            return Err(AppError::Retrieval {
                message: format!(
                    "Stored vector {} has {} dimensions, manifest expects {}",
                    bad,
                    snapshot.entries[bad].vector.len(),
                    dimension
                ),
            });
        }

        info!(
            path = %path.display(),
            passages = snapshot.entries.len(),
            "Vector index loaded"
        );
        metrics::record_index_size(snapshot.entries.len());

        Ok(Self {
            manifest: snapshot.manifest,
            entries: snapshot.entries,
            embedder,
        })
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }
}

#[async_trait]
impl Retriever for VectorIndex {
    async fn query(&self, text: &str, k: usize) -> Result<Vec<ScoredPassage>> {
        let start = Instant::now();
        let query_vector = self.embedder.embed(text).await?;

        if query_vector.len() != self.manifest.dimension {
            return Err(AppError::Retrieval {
                message: format!(
                    "Query embedded to {} dimensions, index expects {}",
                    query_vector.len(),
                    self.manifest.dimension
                ),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(&query_vector, &entry.vector)))
            .collect();

        // Stable sort: equal scores keep insertion order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        let results: Vec<ScoredPassage> = scored
            .into_iter()
            .map(|(i, score)| ScoredPassage {
                passage: self.entries[i].passage.clone(),
                score,
            })
            .collect();

        metrics::record_retrieval(start.elapsed().as_secs_f64(), results.len());
        debug!(k, returned = results.len(), "Index queried");

        Ok(results)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
