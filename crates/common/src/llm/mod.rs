//! Language model gateway
//!
//! The gateway is the only place the rest of the system talks to a model
//! provider. It pairs a [`Generator`] (prompt in, text out) with an
//! [`Embedder`] (text in, vector out). Providers:
//! - `bedrock`: Claude on Amazon Bedrock + Titan embeddings
//! - `openai`: any OpenAI-compatible chat/embeddings endpoint
//! - `mock`: deterministic offline responses
//!
//! Calls are never retried here; a failure propagates to the caller.

pub mod bedrock;
pub mod mock;
pub mod openai;

use crate::config::LlmConfig;
use crate::embeddings::{Embedder, MockEmbedder, OpenAIEmbedder};
use crate::errors::{AppError, Result};
use crate::metrics;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub use bedrock::{BedrockEmbedder, BedrockGenerator};
pub use mock::MockGenerator;
pub use openai::OpenAIGenerator;

/// Trait for text generation
#[async_trait]
pub trait Generator: Send + Sync {
    /// Send one prompt, return the model's text verbatim
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Sampling parameters fixed per deployment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    /// Maximum output tokens
    pub max_tokens: usize,

    /// Temperature (0.0 - 1.0)
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.1,
        }
    }
}

impl From<&LlmConfig> for GenerationOptions {
    fn from(config: &LlmConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

/// Generator wrapper recording call latency and outcome
struct MeteredGenerator {
    inner: Arc<dyn Generator>,
    provider: String,
}

#[async_trait]
impl Generator for MeteredGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let start = Instant::now();
        let result = self.inner.generate(prompt).await;
        let elapsed = start.elapsed();

        metrics::record_generation(
            elapsed.as_secs_f64(),
            &self.provider,
            self.inner.model_name(),
            result.is_ok(),
        );

        match &result {
            Ok(text) => tracing::debug!(
                provider = %self.provider,
                prompt_chars = prompt.len(),
                response_chars = text.len(),
                latency_ms = elapsed.as_millis() as u64,
                "Generation complete"
            ),
            Err(e) => tracing::warn!(
                provider = %self.provider,
                error = %e,
                "Generation failed"
            ),
        }

        result
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

/// Handle pairing a generator with an embedder from the same provider
#[derive(Clone)]
pub struct ModelGateway {
    provider: String,
    generator: Arc<dyn Generator>,
    embedder: Arc<dyn Embedder>,
}

impl ModelGateway {
    /// Assemble a gateway from explicit parts
    pub fn new(
        provider: impl Into<String>,
        generator: Arc<dyn Generator>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        let provider = provider.into();
        let generator: Arc<dyn Generator> = Arc::new(MeteredGenerator {
            inner: generator,
            provider: provider.clone(),
        });
        Self { provider, generator, embedder }
    }

    /// Offline gateway with canned generations and hashed embeddings
    pub fn mock() -> Self {
        Self::new(
            "mock",
            Arc::new(MockGenerator::new()),
            Arc::new(MockEmbedder::new(crate::DEFAULT_EMBEDDING_DIMENSION)),
        )
    }

    /// Build the gateway selected by `llm.provider`
    pub async fn from_config(config: &LlmConfig) -> Result<Self> {
        let options = GenerationOptions::from(config);
        let timeout = Duration::from_secs(config.timeout_secs);

        match config.provider.as_str() {
            "bedrock" => {
                let client = bedrock::connect(&config.region, timeout).await;
                Ok(Self::new(
                    "bedrock",
                    Arc::new(BedrockGenerator::new(client.clone(), config.model_id.clone(), options)),
                    Arc::new(BedrockEmbedder::new(client, config.embedding_model.clone())),
                ))
            }
            "openai" => {
                let api_key = config
                    .api_key
                    .clone()
                    .filter(|k| !k.trim().is_empty())
                    .ok_or_else(|| AppError::configuration("llm.api_key is required for the openai provider"))?;

                let generator = OpenAIGenerator::new(
                    api_key.clone(),
                    config.model_id.clone(),
                    config.api_base.clone(),
                    options,
                    timeout,
                )?;
                let embedder = OpenAIEmbedder::new(
                    api_key,
                    config.embedding_model.clone(),
                    config.api_base.clone(),
                    timeout,
                )?;
                Ok(Self::new("openai", Arc::new(generator), Arc::new(embedder)))
            }
            "mock" => Ok(Self::mock()),
            other => Err(AppError::configuration(format!(
                "Unknown llm.provider '{}' (expected bedrock, openai or mock)",
                other
            ))),
        }
    }

    /// Provider label
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Shared generator handle
    pub fn generator(&self) -> Arc<dyn Generator> {
        self.generator.clone()
    }

    /// Shared embedder handle
    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    /// `generate(prompt) -> text`
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        self.generator.generate(prompt).await
    }

    /// `embed(text) -> vector`
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embedder.embed(text).await
    }
}

impl std::fmt::Debug for ModelGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelGateway")
            .field("provider", &self.provider)
            .field("generation_model", &self.generator.model_name())
            .field("embedding_model", &self.embedder.model_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_from_config() {
        let config = LlmConfig {
            provider: "mock".to_string(),
            ..Default::default()
        };
        let gateway = ModelGateway::from_config(&config).await.unwrap();
        assert_eq!(gateway.provider(), "mock");

        let vector = gateway.embed("indemnification clause").await.unwrap();
        assert_eq!(vector.len(), crate::DEFAULT_EMBEDDING_DIMENSION);
        assert!(!gateway.generate("Say hello!").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_provider_is_configuration_error() {
        let config = LlmConfig {
            provider: "carrier-pigeon".to_string(),
            ..Default::default()
        };
        let err = ModelGateway::from_config(&config).await.unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_openai_requires_api_key() {
        let config = LlmConfig {
            provider: "openai".to_string(),
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        let err = ModelGateway::from_config(&config).await.unwrap_err();
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn test_generation_options_from_config() {
        let config = LlmConfig {
            max_tokens: 512,
            temperature: 0.5,
            ..Default::default()
        };
        let options = GenerationOptions::from(&config);
        assert_eq!(options.max_tokens, 512);
        assert_eq!(options.temperature, 0.5);
    }
}
