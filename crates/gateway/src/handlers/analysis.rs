//! Multi-agent analysis handlers

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use validator::Validate;

use crate::render::{render_blocks, Block};
use crate::state::AppState;
use docintel_common::{
    errors::{AppError, Result},
    workflow::{REPORT_CONTENT_TYPE, REPORT_FILE_NAME},
    Task, WorkRecord,
};

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RunRequest {
    /// Optional question answered from the documents before the analysis
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub question: Option<String>,
}

#[derive(Serialize)]
pub struct RunResponse {
    #[serde(flatten)]
    pub record: WorkRecord,
    /// Agent names in execution order
    pub agents: Vec<&'static str>,
    pub agent_calls: usize,
    pub blocks: Vec<Block>,
    pub elapsed_secs: f64,
}

#[derive(Serialize)]
pub struct ReportResponse {
    pub report: String,
    pub blocks: Vec<Block>,
    pub trace: Vec<Task>,
    pub elapsed_secs: f64,
    pub finished_at: String,
}

/// Run the full workflow over the loaded documents
pub async fn run(
    State(state): State<AppState>,
    body: Option<Json<RunRequest>>,
) -> std::result::Result<Json<RunResponse>, Response> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    request
        .validate()
        .map_err(|e| {
            AppError::Validation {
                message: e.to_string(),
                field: Some("question".to_string()),
            }
            .into_response()
        })?;

    let (sequencer, excerpt) = state.sequencer().await.map_err(IntoResponse::into_response)?;

    let start = Instant::now();
    let outcome = sequencer.run(request.question, excerpt).await;
    let elapsed_secs = start.elapsed().as_secs_f64();

    let record = match outcome {
        Ok(record) => record,
        Err(err) => {
            tracing::warn!(error = %err.source, elapsed_secs, "Analysis run aborted");
            return Err(match err.record {
                Some(partial) => err
                    .source
                    .into_response_with_details(serde_json::json!({ "partial_record": partial })),
                None => err.source.into_response(),
            });
        }
    };

    tracing::info!(
        agent_calls = record.trace().len(),
        elapsed_secs,
        "Analysis run complete"
    );

    state.record_run(record.clone(), elapsed_secs).await;

    Ok(Json(RunResponse {
        agents: record.trace().iter().map(Task::agent_name).collect(),
        agent_calls: record.trace().len(),
        blocks: render_blocks(record.report().unwrap_or_default()),
        record,
        elapsed_secs,
    }))
}

/// Last report, parsed for display
pub async fn report(State(state): State<AppState>) -> Result<Json<ReportResponse>> {
    let session = state.session.read().await;
    let run = session.last_run.as_ref().ok_or_else(no_report)?;
    let report = run.record.report().ok_or_else(no_report)?;

    Ok(Json(ReportResponse {
        report: report.to_string(),
        blocks: render_blocks(report),
        trace: run.record.trace().to_vec(),
        elapsed_secs: run.elapsed_secs,
        finished_at: run.finished_at.to_rfc3339(),
    }))
}

/// Last report as a markdown attachment
pub async fn download(State(state): State<AppState>) -> Result<Response> {
    let session = state.session.read().await;
    let report = session
        .last_run
        .as_ref()
        .and_then(|run| run.record.report())
        .ok_or_else(no_report)?
        .to_string();

    Ok((
        [
            (header::CONTENT_TYPE, format!("{}; charset=utf-8", REPORT_CONTENT_TYPE)),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", REPORT_FILE_NAME),
            ),
        ],
        report,
    )
        .into_response())
}

fn no_report() -> AppError {
    AppError::NotFound {
        resource: "report; run the analysis first".to_string(),
    }
}
