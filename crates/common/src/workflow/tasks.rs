//! Prompts for the model-backed tasks

/// Characters of the document excerpt sent to the summary and risk prompts.
///
/// A lossy cut by character count: it may end mid-sentence. It bounds prompt
/// size and carries no meaning for the workflow itself.
pub const EXCERPT_LIMIT: usize = 3000;

/// Severity tags the risk prompt asks for
pub const SEVERITIES: [&str; 4] = ["LOW", "MEDIUM", "HIGH", "CRITICAL"];

/// First `limit` characters of `text`, cut on a char boundary
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

pub fn summary_prompt(excerpt: &str) -> String {
    format!("Summarize these contracts in 4 bullet points:\n\n{}", excerpt)
}

pub fn risk_prompt(excerpt: &str) -> String {
    format!(
        "List the top 3 risks in these contracts with severity ({}):\n\n{}",
        SEVERITIES.join("/"),
        excerpt
    )
}
