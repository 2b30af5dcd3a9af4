//! Question-answering pipeline
//!
//! One retrieval, one generation. No caching, no retry and no relevance
//! threshold: whatever the index returns is handed to the model.

use super::index::{Retriever, ScoredPassage};
use crate::errors::{AppError, Result};
use crate::llm::Generator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, instrument};

/// Instruction template; `{context}` and `{question}` are substituted
pub const QA_TEMPLATE: &str = "Use ONLY the following context to answer the question.
If the answer is not in the context, say \"I cannot find this in the documents.\"
Always mention which document your answer comes from.

Context:
{context}

Question: {question}

Answer:";

/// Answer plus the distinct sources of the passages it was grounded on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaAnswer {
    pub answer: String,
    pub sources: BTreeSet<String>,
}

/// Concatenate passages in rank order, each under a `[Source: ...]` label
pub fn format_context(passages: &[ScoredPassage]) -> String {
    passages
        .iter()
        .map(|p| format!("[Source: {}]\n{}", p.passage.source_id, p.passage.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Bind context and question into [`QA_TEMPLATE`]
pub fn build_prompt(context: &str, question: &str) -> String {
    // Question first so a context containing "{question}" is left alone
    QA_TEMPLATE
        .replace("{question}", question)
        .replacen("{context}", context, 1)
}

/// Retrieval + generation over the loaded documents
pub struct QaPipeline {
    generator: Arc<dyn Generator>,
    retriever: Option<Arc<dyn Retriever>>,
    top_k: usize,
}

impl QaPipeline {
    /// Pipeline without an index; [`QaPipeline::answer`] fails until one is attached
    pub fn new(generator: Arc<dyn Generator>, top_k: usize) -> Self {
        Self {
            generator,
            retriever: None,
            top_k,
        }
    }

    /// Attach the retrieval index
    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// True once a non-empty index is attached
    pub fn is_ready(&self) -> bool {
        self.retriever.as_ref().is_some_and(|r| !r.is_empty())
    }

    /// Configuration error unless an index has been built
    pub fn ensure_ready(&self) -> Result<&Arc<dyn Retriever>> {
        match &self.retriever {
            Some(retriever) if !retriever.is_empty() => Ok(retriever),
            Some(_) => Err(AppError::configuration(
                "Retrieval index is empty; load documents first",
            )),
            None => Err(AppError::configuration(
                "Retrieval index has not been built; load documents first",
            )),
        }
    }

    /// `answer(question) -> {answer, sources}`
    #[instrument(skip(self), fields(top_k = self.top_k))]
    pub async fn answer(&self, question: &str) -> Result<QaAnswer> {
        let retriever = self.ensure_ready()?;

        let passages = retriever.query(question, self.top_k).await?;
        let context = format_context(&passages);
        let answer = self.generator.generate(&build_prompt(&context, question)).await?;

        let sources: BTreeSet<String> = passages
            .into_iter()
            .map(|p| p.passage.source_id)
            .collect();

        info!(sources = sources.len(), answer_chars = answer.len(), "Question answered");

        Ok(QaAnswer { answer, sources })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::index::Passage;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns a fixed ranking regardless of the query
    struct FixedRetriever {
        passages: Vec<Passage>,
        queries: Mutex<Vec<(String, usize)>>,
    }

    impl FixedRetriever {
        fn new(passages: Vec<Passage>) -> Arc<Self> {
            Arc::new(Self { passages, queries: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl Retriever for FixedRetriever {
        async fn query(&self, text: &str, k: usize) -> Result<Vec<ScoredPassage>> {
            self.queries.lock().unwrap().push((text.to_string(), k));
            Ok(self
                .passages
                .iter()
                .take(k)
                .enumerate()
                .map(|(i, p)| ScoredPassage { passage: p.clone(), score: 1.0 - i as f32 * 0.1 })
                .collect())
        }

        fn len(&self) -> usize {
            self.passages.len()
        }
    }

    /// Records prompts and answers with a fixed string
    struct RecordingGenerator {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Generator for RecordingGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("Net 30 (a.pdf)".to_string())
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }

    fn recording() -> Arc<RecordingGenerator> {
        Arc::new(RecordingGenerator { prompts: Mutex::new(Vec::new()) })
    }

    #[tokio::test]
    async fn test_sources_are_deduplicated_set() {
        let retriever = FixedRetriever::new(vec![
            Passage::new("Payment is due in 30 days.", "a.pdf"),
            Passage::new("Invoices are payable monthly.", "b.pdf"),
            Passage::new("Late fees apply after 30 days.", "a.pdf"),
            Passage::new("Never retrieved.", "c.pdf"),
        ]);
        let generator = recording();
        let pipeline = QaPipeline::new(generator.clone(), 3).with_retriever(retriever.clone());

        let result = pipeline.answer("payment terms").await.unwrap();

        let expected: BTreeSet<String> = ["a.pdf", "b.pdf"].iter().map(|s| s.to_string()).collect();
        assert_eq!(result.sources, expected);
        assert_eq!(result.answer, "Net 30 (a.pdf)");
        assert_eq!(retriever.queries.lock().unwrap().as_slice(), &[("payment terms".to_string(), 3)]);
        assert_eq!(generator.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_prompt_contains_labelled_context_in_rank_order() {
        let retriever = FixedRetriever::new(vec![
            Passage::new("First passage.", "a.pdf"),
            Passage::new("Second passage.", "b.pdf"),
        ]);
        let generator = recording();
        let pipeline = QaPipeline::new(generator.clone(), 3).with_retriever(retriever);

        pipeline.answer("What is first?").await.unwrap();

        let prompts = generator.prompts.lock().unwrap();
        let prompt = &prompts[0];
        assert!(prompt.starts_with("Use ONLY the following context"));
        assert!(prompt.contains("[Source: a.pdf]\nFirst passage.\n\n[Source: b.pdf]\nSecond passage."));
        assert!(prompt.contains("Question: What is first?"));
        assert!(prompt.ends_with("Answer:"));
        let first = prompt.find("a.pdf").unwrap();
        let second = prompt.find("b.pdf").unwrap();
        assert!(first < second);
    }

    #[tokio::test]
    async fn test_answer_before_index_is_configuration_error() {
        let generator = recording();
        let pipeline = QaPipeline::new(generator.clone(), 3);

        let err = pipeline.answer("payment terms").await.unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
        assert!(!pipeline.is_ready());
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_index_is_not_ready() {
        let pipeline = QaPipeline::new(recording(), 3).with_retriever(FixedRetriever::new(vec![]));
        assert!(!pipeline.is_ready());
        let err = pipeline.answer("anything").await.unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
    }

    #[test]
    fn test_build_prompt_keeps_braces_in_context() {
        let prompt = build_prompt("clause {question} literal", "Q?");
        assert!(prompt.contains("clause {question} literal"));
        assert!(prompt.contains("Question: Q?"));
    }
}
