//! Drives one analysis run from `ROUTE` to `DONE`

use super::record::{Task, TaskOutput, WorkRecord};
use super::report::compose_report;
use super::router::{next_state, WorkflowState};
use super::tasks::{risk_prompt, summary_prompt, truncate_chars, EXCERPT_LIMIT};
use crate::errors::{AppError, Result};
use crate::llm::Generator;
use crate::metrics;
use crate::rag::QaPipeline;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info, instrument};

/// A run that stopped before `DONE`.
///
/// `record` holds everything written before the failure. It is `None` when
/// the run was refused up front, before any task executed.
#[derive(Debug, Error)]
#[error("analysis run failed: {source}")]
pub struct RunError {
    pub record: Option<WorkRecord>,
    #[source]
    pub source: AppError,
}

impl From<RunError> for AppError {
    fn from(err: RunError) -> Self {
        err.source
    }
}

/// The task sequencer.
///
/// Holds no per-run state; every call to [`Sequencer::run`] starts from a
/// fresh [`WorkRecord`].
pub struct Sequencer {
    generator: Arc<dyn Generator>,
    qa: Arc<QaPipeline>,
    excerpt_limit: usize,
}

impl Sequencer {
    pub fn new(generator: Arc<dyn Generator>, qa: Arc<QaPipeline>) -> Self {
        Self {
            generator,
            qa,
            excerpt_limit: EXCERPT_LIMIT,
        }
    }

    /// Override the excerpt cut applied to the summary and risk prompts
    pub fn with_excerpt_limit(mut self, excerpt_limit: usize) -> Self {
        self.excerpt_limit = excerpt_limit;
        self
    }

    /// `run(question?, document_excerpt) -> WorkRecord`
    #[instrument(skip(self, question, document_excerpt), fields(has_question = tracing::field::Empty))]
    pub async fn run(
        &self,
        question: Option<String>,
        document_excerpt: String,
    ) -> std::result::Result<WorkRecord, RunError> {
        let record = WorkRecord::new(question, document_excerpt);
        tracing::Span::current().record("has_question", record.question().is_some());

        if record.question().is_some() {
            if let Err(source) = self.qa.ensure_ready() {
                metrics::record_workflow_run(false);
                return Err(RunError { record: None, source });
            }
        }

        let result = self.drive(record).await;
        metrics::record_workflow_run(result.is_ok());
        result
    }

    async fn drive(&self, mut record: WorkRecord) -> std::result::Result<WorkRecord, RunError> {
        let mut state = WorkflowState::Route;

        loop {
            if let WorkflowState::Execute(task) = state {
                record.begin(task);
                info!(task = %task, "Running task");

                let start = Instant::now();
                let outcome = match self.execute(task, &record).await {
                    Ok(output) => record.apply(output),
                    Err(e) => Err(e),
                };
                metrics::record_task(start.elapsed().as_secs_f64(), task.label(), outcome.is_ok());

                if let Err(source) = outcome {
                    error!(task = %task, error = %source, "Task failed, aborting run");
                    return Err(RunError {
                        record: Some(record),
                        source,
                    });
                }
            }

            state = next_state(state, &record);
            if state == WorkflowState::Done {
                break;
            }
        }

        info!(trace = ?record.trace(), "Run complete");
        Ok(record)
    }

    async fn execute(&self, task: Task, record: &WorkRecord) -> Result<TaskOutput> {
        match task {
            Task::AnswerQuestion => {
                let question = record.question().ok_or_else(|| AppError::Internal {
                    message: "ANSWER_QUESTION routed without a question".to_string(),
                })?;
                let answer = self.qa.answer(question).await?;
                Ok(TaskOutput::QaAnswer(answer.answer))
            }
            Task::Summarize => {
                let excerpt = truncate_chars(record.document_excerpt(), self.excerpt_limit);
                let summary = self.generator.generate(&summary_prompt(excerpt)).await?;
                Ok(TaskOutput::Summary(summary))
            }
            Task::AssessRisk => {
                let excerpt = truncate_chars(record.document_excerpt(), self.excerpt_limit);
                let risks = self.generator.generate(&risk_prompt(excerpt)).await?;
                Ok(TaskOutput::RiskFindings(risks))
            }
            Task::ComposeReport => Ok(TaskOutput::Report(compose_report(record))),
        }
    }
}
