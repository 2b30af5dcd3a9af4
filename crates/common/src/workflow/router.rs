//! Workflow state machine
//!
//! `ROUTE` is a pure projection of which record fields are still empty onto
//! the next task. It never retries and never looks at field contents.

use super::record::{Task, WorkRecord};
use serde::Serialize;

/// Sequencer states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "task", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowState {
    /// Decide the next task
    Route,
    /// Run exactly one task
    Execute(Task),
    /// Terminal
    Done,
}

/// Task chosen on entry to `ROUTE`
pub fn route(record: &WorkRecord) -> Task {
    if record.question().is_some() && !record.is_written(Task::AnswerQuestion) {
        Task::AnswerQuestion
    } else if !record.is_written(Task::Summarize) {
        Task::Summarize
    } else if !record.is_written(Task::AssessRisk) {
        Task::AssessRisk
    } else {
        Task::ComposeReport
    }
}

/// Transition function
pub fn next_state(state: WorkflowState, record: &WorkRecord) -> WorkflowState {
    match state {
        WorkflowState::Route => WorkflowState::Execute(route(record)),
        WorkflowState::Execute(Task::ComposeReport) => WorkflowState::Done,
        WorkflowState::Execute(Task::AnswerQuestion | Task::Summarize | Task::AssessRisk) => {
            WorkflowState::Route
        }
        WorkflowState::Done => WorkflowState::Done,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::record::TaskOutput;

    #[test]
    fn test_question_routes_to_answer_first() {
        let record = WorkRecord::new(Some("Which contract is riskiest?".into()), "doc");
        assert_eq!(route(&record), Task::AnswerQuestion);
    }

    #[test]
    fn test_no_question_routes_to_summary_first() {
        let record = WorkRecord::new(None, "doc");
        assert_eq!(route(&record), Task::Summarize);
    }

    #[test]
    fn test_route_follows_field_emptiness() {
        let mut record = WorkRecord::new(Some("q".into()), "doc");
        record.apply(TaskOutput::QaAnswer("a".into())).unwrap();
        assert_eq!(route(&record), Task::Summarize);

        record.apply(TaskOutput::Summary("s".into())).unwrap();
        assert_eq!(route(&record), Task::AssessRisk);

        record.apply(TaskOutput::RiskFindings("r".into())).unwrap();
        assert_eq!(route(&record), Task::ComposeReport);
    }

    #[test]
    fn test_populated_field_never_rerouted() {
        // Summary written out of the usual order still suppresses SUMMARIZE
        let mut record = WorkRecord::new(None, "doc");
        record.apply(TaskOutput::Summary("s".into())).unwrap();
        assert_eq!(route(&record), Task::AssessRisk);
    }

    #[test]
    fn test_transitions() {
        let record = WorkRecord::new(None, "doc");
        assert_eq!(
            next_state(WorkflowState::Route, &record),
            WorkflowState::Execute(Task::Summarize)
        );
        assert_eq!(
            next_state(WorkflowState::Execute(Task::Summarize), &record),
            WorkflowState::Route
        );
        assert_eq!(
            next_state(WorkflowState::Execute(Task::ComposeReport), &record),
            WorkflowState::Done
        );
        assert_eq!(next_state(WorkflowState::Done, &record), WorkflowState::Done);
    }
}
