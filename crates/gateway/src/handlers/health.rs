//! Health check handlers

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub model_provider: CheckResult,
    pub index: CheckResult,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: docintel_common::VERSION.to_string(),
    })
}

/// Readiness probe - ready once a non-empty index is loaded
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let index_check = {
        let session = state.session.read().await;
        match &session.corpus {
            Some(corpus) if corpus.qa.is_ready() => CheckResult {
                status: "up".to_string(),
                detail: Some(format!("{} chunks", corpus.stats.chunks)),
            },
            _ => CheckResult {
                status: "down".to_string(),
                detail: Some("no documents loaded".to_string()),
            },
        }
    };

    let provider_check = CheckResult {
        status: "up".to_string(),
        detail: Some(state.models.provider().to_string()),
    };

    let ready = index_check.status == "up";
    let status = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(ReadyResponse {
            status: if ready { "ready" } else { "not_ready" }.to_string(),
            checks: HealthChecks {
                model_provider: provider_check,
                index: index_check,
            },
        }),
    )
}
