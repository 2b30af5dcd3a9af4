//! Amazon Bedrock provider
//!
//! Generation goes through the Anthropic messages body accepted by Claude
//! models on Bedrock; embeddings through the Titan text embedding body.

use super::{GenerationOptions, Generator};
use crate::embeddings::Embedder;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::primitives::Blob;
use aws_sdk_bedrockruntime::Client;
use aws_types::region::Region;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PROVIDER: &str = "bedrock";
const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Build a Bedrock runtime client from the default credential chain
pub async fn connect(region: &str, timeout: Duration) -> Client {
    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(timeout)
                .build(),
        )
        .load()
        .await;

    tracing::info!(region = region, "Bedrock runtime client configured");
    Client::new(&sdk_config)
}

async fn invoke(client: &Client, model_id: &str, body: Vec<u8>) -> Result<Vec<u8>> {
    let output = client
        .invoke_model()
        .model_id(model_id)
        .content_type("application/json")
        .accept("application/json")
        .body(Blob::new(body))
        .send()
        .await
        .map_err(|e| AppError::provider(PROVIDER, format!("{}: {}", model_id, DisplayErrorContext(&e))))?;

    Ok(output.body().as_ref().to_vec())
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    anthropic_version: &'static str,
    max_tokens: usize,
    temperature: f32,
    messages: [AnthropicMessage<'a>; 1],
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

fn generation_body(prompt: &str, options: &GenerationOptions) -> Result<Vec<u8>> {
    let request = AnthropicRequest {
        anthropic_version: ANTHROPIC_VERSION,
        max_tokens: options.max_tokens,
        temperature: options.temperature,
        messages: [AnthropicMessage { role: "user", content: prompt }],
    };
    Ok(serde_json::to_vec(&request)?)
}

fn parse_generation(bytes: &[u8]) -> Result<String> {
    let response: AnthropicResponse = serde_json::from_slice(bytes)
        .map_err(|e| AppError::provider(PROVIDER, format!("Failed to parse generation response: {}", e)))?;

    let text: String = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .map(|block| block.text)
        .collect();

    if text.is_empty() {
        return Err(AppError::provider(PROVIDER, "Empty response from model"));
    }
    Ok(text)
}

/// Claude on Bedrock
pub struct BedrockGenerator {
    client: Client,
    model_id: String,
    options: GenerationOptions,
}

impl BedrockGenerator {
    pub fn new(client: Client, model_id: String, options: GenerationOptions) -> Self {
        Self { client, model_id, options }
    }
}

#[async_trait]
impl Generator for BedrockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = generation_body(prompt, &self.options)?;
        let bytes = invoke(&self.client, &self.model_id, body).await?;
        parse_generation(&bytes)
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}

#[derive(Serialize)]
struct TitanRequest<'a> {
    #[serde(rename = "inputText")]
    input_text: &'a str,
}

#[derive(Deserialize)]
struct TitanResponse {
    embedding: Vec<f32>,
}

fn parse_embedding(bytes: &[u8]) -> Result<Vec<f32>> {
    let response: TitanResponse = serde_json::from_slice(bytes)
        .map_err(|e| AppError::provider(PROVIDER, format!("Failed to parse embedding response: {}", e)))?;
    Ok(response.embedding)
}

/// Titan text embeddings on Bedrock
pub struct BedrockEmbedder {
    client: Client,
    model_id: String,
    dimension: usize,
}

impl BedrockEmbedder {
    pub fn new(client: Client, model_id: String) -> Self {
        let dimension = match model_id.as_str() {
            "amazon.titan-embed-text-v2:0" => 1024,
            _ => crate::DEFAULT_EMBEDDING_DIMENSION,
        };
        Self { client, model_id, dimension }
    }
}

#[async_trait]
impl Embedder for BedrockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = serde_json::to_vec(&TitanRequest { input_text: text })?;
        let bytes = invoke(&self.client, &self.model_id, body).await?;
        parse_embedding(&bytes)
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_body_shape() {
        let body = generation_body("Say hello!", &GenerationOptions::default()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["anthropic_version"], "bedrock-2023-05-31");
        assert_eq!(json["max_tokens"], 4096);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Say hello!");
    }

    #[test]
    fn test_parse_generation_joins_text_blocks() {
        let bytes = br#"{"id":"msg_1","content":[{"type":"text","text":"Hello"},{"type":"text","text":" there"}],"stop_reason":"end_turn"}"#;
        assert_eq!(parse_generation(bytes).unwrap(), "Hello there");
    }

    #[test]
    fn test_parse_generation_rejects_empty_content() {
        let err = parse_generation(br#"{"content":[]}"#).unwrap_err();
        assert!(matches!(err, AppError::ModelProvider { .. }));
    }

    #[test]
    fn test_parse_embedding() {
        let bytes = br#"{"embedding":[0.25,-0.5,1.0],"inputTextTokenCount":3}"#;
        assert_eq!(parse_embedding(bytes).unwrap(), vec![0.25, -0.5, 1.0]);
    }

    #[test]
    fn test_titan_request_field_name() {
        let body = serde_json::to_string(&TitanRequest { input_text: "test" }).unwrap();
        assert_eq!(body, r#"{"inputText":"test"}"#);
    }
}
