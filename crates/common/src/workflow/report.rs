//! Markdown report composition
//!
//! Pure formatting over a [`WorkRecord`]: identical records give identical
//! reports, and model text is embedded verbatim.

use super::record::WorkRecord;

/// Download file name offered by the dashboard
pub const REPORT_FILE_NAME: &str = "document_intelligence_report.md";

/// Media type of the downloaded report
pub const REPORT_CONTENT_TYPE: &str = "text/markdown";

/// Closing attribution line
pub const ATTRIBUTION: &str =
    "*Analysed by DocIntel multi-agent workflow | retrieval-augmented generation*";

/// Placeholder for an output field that was never written
pub const NOT_AVAILABLE: &str = "N/A";

/// Render the final markdown report
pub fn compose_report(record: &WorkRecord) -> String {
    let question = record.question().unwrap_or_default();
    let answer = record.qa_answer().unwrap_or(NOT_AVAILABLE);
    let summary = record.summary().unwrap_or(NOT_AVAILABLE);
    let risks = record.risk_findings().unwrap_or(NOT_AVAILABLE);

    format!(
        "\n\
         # DOCUMENT INTELLIGENCE REPORT\n\
         \n\
         ## Question & Answer\n\
         **Q:** {question}\n\
         **A:** {answer}\n\
         \n\
         ## Executive Summary\n\
         {summary}\n\
         \n\
         ## Risk Analysis\n\
         {risks}\n\
         \n\
         ---\n\
         {ATTRIBUTION}\n"
    )
}
