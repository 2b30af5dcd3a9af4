//! Document loading and session status handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::state::{display_name, AppState};
use docintel_common::errors::{AppError, Result};
use docintel_ingestion::IngestionStats;

/// Request to process a document folder
#[derive(Debug, Default, Deserialize)]
pub struct ProcessRequest {
    /// Folder to load, inside the configured source folder. Relative paths
    /// resolve against that folder; the folder itself when absent.
    #[serde(default)]
    pub source_dir: Option<PathBuf>,
}

#[derive(Serialize)]
pub struct ProcessResponse {
    pub status: String,
    pub source_dir: String,
    #[serde(flatten)]
    pub stats: IngestionStats,
    pub elapsed_secs: f64,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub provider: String,
    pub documents_loaded: bool,
    pub documents: usize,
    pub pages: usize,
    pub chunks: usize,
    pub sources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<String>,
    /// Tasks executed by the last analysis run
    pub agent_calls: usize,
    pub has_report: bool,
}

#[derive(Serialize)]
pub struct ResetResponse {
    pub status: String,
}

/// Load, chunk and index a folder, replacing the current documents
pub async fn process(
    State(state): State<AppState>,
    body: Option<Json<ProcessRequest>>,
) -> Result<Json<ProcessResponse>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let root = &state.config.documents.source_dir;
    let dir = match request.source_dir {
        Some(requested) => resolve_within(root, &requested).await?,
        None => root.clone(),
    };

    let start = Instant::now();
    let stats = state.load_documents(&dir).await?;
    let elapsed_secs = start.elapsed().as_secs_f64();

    tracing::info!(
        dir = %dir.display(),
        documents = stats.documents,
        chunks = stats.chunks,
        elapsed_secs,
        "Documents processed"
    );

    Ok(Json(ProcessResponse {
        status: "processed".to_string(),
        source_dir: dir.display().to_string(),
        stats,
        elapsed_secs,
    }))
}

/// Resolve a requested folder and refuse anything outside `root`
async fn resolve_within(root: &Path, requested: &Path) -> Result<PathBuf> {
    let invalid = |message: String| AppError::Validation {
        message,
        field: Some("source_dir".to_string()),
    };

    if requested.as_os_str().is_empty() {
        return Err(invalid("source_dir must not be empty".to_string()));
    }

    let root = tokio::fs::canonicalize(root).await.map_err(|e| AppError::Document {
        message: format!("Source folder {} is unavailable: {}", root.display(), e),
    })?;
    let candidate = tokio::fs::canonicalize(root.join(requested))
        .await
        .map_err(|_| invalid(format!("Folder {} does not exist", requested.display())))?;

    if !candidate.starts_with(&root) {
        tracing::warn!(
            requested = %requested.display(),
            root = %root.display(),
            "Rejected folder outside the source folder"
        );
        return Err(invalid(format!(
            "Folder {} is outside the document source folder",
            requested.display()
        )));
    }
    Ok(candidate)
}

/// Session summary for the dashboard sidebar
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let session = state.session.read().await;

    let (documents, pages, chunks, sources, loaded_at) = match &session.corpus {
        Some(corpus) => (
            corpus.stats.documents,
            corpus.stats.pages,
            corpus.stats.chunks,
            corpus.sources.iter().map(|s| display_name(s)).collect(),
            Some(corpus.loaded_at.to_rfc3339()),
        ),
        None => (0, 0, 0, Vec::new(), None),
    };

    Json(StatusResponse {
        provider: state.models.provider().to_string(),
        documents_loaded: session.corpus.is_some(),
        documents,
        pages,
        chunks,
        sources,
        loaded_at,
        agent_calls: session
            .last_run
            .as_ref()
            .map_or(0, |run| run.record.trace().len()),
        has_report: session.last_run.is_some(),
    })
}

/// Forget loaded documents and the last report
pub async fn reset(State(state): State<AppState>) -> Json<ResetResponse> {
    state.reset().await;
    tracing::info!("Session reset");
    Json(ResetResponse {
        status: "reset".to_string(),
    })
}
