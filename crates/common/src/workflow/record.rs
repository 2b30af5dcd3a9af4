//! The work record threaded through one analysis run

use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four single-purpose tasks of the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Task {
    /// Retrieval-augmented answer to the user's question
    AnswerQuestion,
    /// Bulleted synopsis of the document excerpt
    Summarize,
    /// Top risks with severity tags
    AssessRisk,
    /// Local report composition, no model call
    ComposeReport,
}

impl Task {
    /// Trace label
    pub fn label(&self) -> &'static str {
        match self {
            Task::AnswerQuestion => "ANSWER_QUESTION",
            Task::Summarize => "SUMMARIZE",
            Task::AssessRisk => "ASSESS_RISK",
            Task::ComposeReport => "COMPOSE_REPORT",
        }
    }

    /// Human-facing agent name used by the dashboard
    pub fn agent_name(&self) -> &'static str {
        match self {
            Task::AnswerQuestion => "RAG Agent",
            Task::Summarize => "Summarizer",
            Task::AssessRisk => "Risk Analyzer",
            Task::ComposeReport => "Finalizer",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A task's result: the one field it owns, not yet merged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutput {
    QaAnswer(String),
    Summary(String),
    RiskFindings(String),
    Report(String),
}

impl TaskOutput {
    /// Task that owns this field
    pub fn task(&self) -> Task {
        match self {
            TaskOutput::QaAnswer(_) => Task::AnswerQuestion,
            TaskOutput::Summary(_) => Task::Summarize,
            TaskOutput::RiskFindings(_) => Task::AssessRisk,
            TaskOutput::Report(_) => Task::ComposeReport,
        }
    }
}

/// State of one run.
///
/// Output fields are private and only written through [`WorkRecord::apply`],
/// which refuses a second write. `trace` only grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkRecord {
    question: Option<String>,
    document_excerpt: String,
    qa_answer: Option<String>,
    summary: Option<String>,
    risk_findings: Option<String>,
    report: Option<String>,
    trace: Vec<Task>,
}

impl WorkRecord {
    /// Fresh record; a blank question counts as no question
    pub fn new(question: Option<String>, document_excerpt: impl Into<String>) -> Self {
        let question = question
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());

        Self {
            question,
            document_excerpt: document_excerpt.into(),
            qa_answer: None,
            summary: None,
            risk_findings: None,
            report: None,
            trace: Vec::new(),
        }
    }

    pub fn question(&self) -> Option<&str> {
        self.question.as_deref()
    }

    pub fn document_excerpt(&self) -> &str {
        &self.document_excerpt
    }

    pub fn qa_answer(&self) -> Option<&str> {
        self.qa_answer.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn risk_findings(&self) -> Option<&str> {
        self.risk_findings.as_deref()
    }

    pub fn report(&self) -> Option<&str> {
        self.report.as_deref()
    }

    /// Tasks in execution order
    pub fn trace(&self) -> &[Task] {
        &self.trace
    }

    /// Whether `task`'s output field has been written
    pub fn is_written(&self, task: Task) -> bool {
        match task {
            Task::AnswerQuestion => self.qa_answer.is_some(),
            Task::Summarize => self.summary.is_some(),
            Task::AssessRisk => self.risk_findings.is_some(),
            Task::ComposeReport => self.report.is_some(),
        }
    }

    /// Append the trace label for a task being entered
    pub(crate) fn begin(&mut self, task: Task) {
        self.trace.push(task);
    }

    /// Merge a task's delta into the record
    pub(crate) fn apply(&mut self, output: TaskOutput) -> Result<()> {
        let task = output.task();
        if self.is_written(task) {
            return Err(AppError::Internal {
                message: format!("{} output written twice in one run", task),
            });
        }

        match output {
            TaskOutput::QaAnswer(text) => self.qa_answer = Some(text),
            TaskOutput::Summary(text) => self.summary = Some(text),
            TaskOutput::RiskFindings(text) => self.risk_findings = Some(text),
            TaskOutput::Report(text) => self.report = Some(text),
        }
        Ok(())
    }
}
