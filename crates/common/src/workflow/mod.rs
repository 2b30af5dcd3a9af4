//! Multi-agent analysis workflow
//!
//! A fixed sequence of single-purpose tasks (answer, summarize, assess risk,
//! compose report) driven by a state machine over a write-once
//! [`WorkRecord`].

mod record;
mod report;
mod router;
mod sequencer;
mod tasks;

pub use record::{Task, TaskOutput, WorkRecord};
pub use report::{compose_report, ATTRIBUTION, NOT_AVAILABLE, REPORT_CONTENT_TYPE, REPORT_FILE_NAME};
pub use router::{next_state, route, WorkflowState};
pub use sequencer::{RunError, Sequencer};
pub use tasks::{risk_prompt, summary_prompt, truncate_chars, EXCERPT_LIMIT, SEVERITIES};
