//! Shared application state and the dashboard session

use chrono::{DateTime, Utc};
use docintel_common::{
    config::AppConfig,
    errors::{AppError, Result},
    ModelGateway, QaPipeline, Sequencer, WorkRecord,
};
use docintel_ingestion::{DocumentProcessor, IngestionStats, ProcessedCorpus};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub models: ModelGateway,
    pub session: Arc<RwLock<Session>>,
}

/// Documents currently loaded into the dashboard
pub struct LoadedCorpus {
    pub qa: Arc<QaPipeline>,
    pub excerpt: String,
    pub stats: IngestionStats,
    pub sources: Vec<String>,
    pub source_dir: PathBuf,
    pub loaded_at: DateTime<Utc>,
}

/// Result of the most recent analysis run
#[derive(Clone)]
pub struct CompletedRun {
    pub record: WorkRecord,
    pub elapsed_secs: f64,
    pub finished_at: DateTime<Utc>,
}

/// One dashboard session: loaded documents plus the last analysis
#[derive(Default)]
pub struct Session {
    pub corpus: Option<LoadedCorpus>,
    pub last_run: Option<CompletedRun>,
}

impl AppState {
    pub fn new(config: AppConfig, models: ModelGateway) -> Self {
        Self {
            config: Arc::new(config),
            models,
            session: Arc::new(RwLock::new(Session::default())),
        }
    }

    pub fn processor(&self) -> DocumentProcessor {
        DocumentProcessor::new(self.models.embedder(), &self.config.documents)
    }

    /// Process `dir`, persist the index and make it the active corpus
    pub async fn load_documents(&self, dir: &Path) -> Result<IngestionStats> {
        let corpus = self
            .processor()
            .process_and_save(dir, &self.config.documents.index_path)
            .await?;
        Ok(self.install(corpus, dir).await)
    }

    /// Reload the persisted index if one exists
    pub async fn restore_index(&self) {
        let documents = &self.config.documents;
        if !documents.index_path.exists() {
            info!(path = %documents.index_path.display(), "No persisted index to reload");
            return;
        }

        match self
            .processor()
            .reload(&documents.source_dir, &documents.index_path)
            .await
        {
            Ok(corpus) => {
                self.install(corpus, &documents.source_dir).await;
            }
            Err(e) => warn!(error = %e, "Persisted index could not be reloaded"),
        }
    }

    async fn install(&self, corpus: ProcessedCorpus, dir: &Path) -> IngestionStats {
        let ProcessedCorpus { index, excerpt, stats } = corpus;
        let sources = index.manifest().sources.iter().cloned().collect();
        let qa = QaPipeline::new(self.models.generator(), self.config.retrieval.top_k)
            .with_retriever(Arc::new(index));

        let mut session = self.session.write().await;
        session.corpus = Some(LoadedCorpus {
            qa: Arc::new(qa),
            excerpt,
            stats: stats.clone(),
            sources,
            source_dir: dir.to_path_buf(),
            loaded_at: Utc::now(),
        });
        stats
    }

    /// QA pipeline over the loaded documents, or an index-less one that
    /// refuses every question
    pub async fn qa_pipeline(&self) -> Arc<QaPipeline> {
        let session = self.session.read().await;
        match &session.corpus {
            Some(corpus) => corpus.qa.clone(),
            None => Arc::new(QaPipeline::new(
                self.models.generator(),
                self.config.retrieval.top_k,
            )),
        }
    }

    /// Sequencer and excerpt for a run over the loaded documents
    pub async fn sequencer(&self) -> Result<(Sequencer, String)> {
        let session = self.session.read().await;
        let corpus = session
            .corpus
            .as_ref()
            .ok_or_else(|| AppError::configuration("No documents loaded; process documents first"))?;

        let sequencer = Sequencer::new(self.models.generator(), corpus.qa.clone())
            .with_excerpt_limit(self.config.workflow.excerpt_limit);
        Ok((sequencer, corpus.excerpt.clone()))
    }

    pub async fn record_run(&self, record: WorkRecord, elapsed_secs: f64) {
        self.session.write().await.last_run = Some(CompletedRun {
            record,
            elapsed_secs,
            finished_at: Utc::now(),
        });
    }

    /// Drop loaded documents and the last run
    pub async fn reset(&self) {
        *self.session.write().await = Session::default();
    }
}

/// File name shown for a source id
pub fn display_name(source_id: &str) -> String {
    Path::new(source_id)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| source_id.to_string())
}
