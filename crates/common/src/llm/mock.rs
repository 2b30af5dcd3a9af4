//! Offline generator used when no provider is configured

use super::Generator;
use crate::errors::Result;
use async_trait::async_trait;

const MOCK_NOTICE: &str = "[Mock response - model provider not configured]";

/// Deterministic generator.
///
/// Recognises the question-answering, summary and risk prompts and answers in
/// the shape a real model would, so the dashboard can be exercised without
/// credentials. Anything else is acknowledged with the prompt's first line.
#[derive(Debug, Default)]
pub struct MockGenerator;

impl MockGenerator {
    pub fn new() -> Self {
        Self
    }
}

fn first_source(prompt: &str) -> Option<&str> {
    let start = prompt.find("[Source: ")? + "[Source: ".len();
    let end = prompt[start..].find(']')?;
    Some(&prompt[start..start + end])
}

fn question_of(prompt: &str) -> &str {
    prompt
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix("Question:"))
        .map(str::trim)
        .unwrap_or("")
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let response = if prompt.starts_with("Use ONLY the following context") {
            match first_source(prompt) {
                Some(source) => format!(
                    "Based on {}, the documents address \"{}\" in the retrieved passages. {}",
                    source,
                    question_of(prompt),
                    MOCK_NOTICE
                ),
                None => format!("I cannot find this in the documents. {}", MOCK_NOTICE),
            }
        } else if prompt.starts_with("Summarize") {
            format!(
                "- Parties, term and scope of the agreement\n\
                 - Payment obligations and schedule\n\
                 - Termination and renewal conditions\n\
                 - Liability, indemnity and governing law\n{}",
                MOCK_NOTICE
            )
        } else if prompt.starts_with("List the top 3 risks") {
            format!(
                "1. Uncapped liability exposure (HIGH)\n\
                 2. Automatic renewal without notice window (MEDIUM)\n\
                 3. Ambiguous payment dispute process (LOW)\n{}",
                MOCK_NOTICE
            )
        } else {
            format!(
                "Acknowledged: {} {}",
                prompt.lines().next().unwrap_or_default().trim(),
                MOCK_NOTICE
            )
        };

        Ok(response)
    }

    fn model_name(&self) -> &str {
        "mock-generation"
    }
}
