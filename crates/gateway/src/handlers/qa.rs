//! Single-shot question answering

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use validator::Validate;

use crate::state::{display_name, AppState};
use docintel_common::errors::{AppError, Result};

#[derive(Debug, Deserialize, Validate)]
pub struct AskRequest {
    #[validate(length(min = 1, max = 2000))]
    pub question: String,
}

#[derive(Serialize)]
pub struct AskResponse {
    pub question: String,
    pub answer: String,
    /// Distinct source file names, sorted
    pub sources: Vec<String>,
    pub elapsed_secs: f64,
}

/// Answer one question from the loaded documents
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("question".to_string()),
    })?;

    let question = request.question.trim();
    if question.is_empty() {
        return Err(AppError::Validation {
            message: "question must not be blank".to_string(),
            field: Some("question".to_string()),
        });
    }

    let start = Instant::now();
    let qa = state.qa_pipeline().await;
    let result = qa.answer(question).await?;

    let mut sources: Vec<String> = result.sources.iter().map(|s| display_name(s)).collect();
    sources.sort();
    sources.dedup();

    Ok(Json(AskResponse {
        question: question.to_string(),
        answer: result.answer,
        sources,
        elapsed_secs: start.elapsed().as_secs_f64(),
    }))
}
