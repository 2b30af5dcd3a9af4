//! OpenAI-compatible chat completions provider

use super::{GenerationOptions, Generator};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PROVIDER: &str = "openai";

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Chat completions client
pub struct OpenAIGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
    options: GenerationOptions,
}

impl OpenAIGenerator {
    pub fn new(
        api_key: String,
        model: String,
        base_url: Option<String>,
        options: GenerationOptions,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        let base = base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string());
        let endpoint = format!("{}/chat/completions", base.trim_end_matches('/'));

        Ok(Self { client, api_key, model, endpoint, options })
    }
}

fn parse_chat(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|content| !content.is_empty())
        .ok_or_else(|| AppError::provider(PROVIDER, "Empty response from LLM"))
}

#[async_trait]
impl Generator for OpenAIGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
        };

        let response = self.client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::provider(PROVIDER, format!("LLM API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::provider(PROVIDER, format!("LLM API error {}: {}", status, body)));
        }

        let chat_response: ChatResponse = response.json().await
            .map_err(|e| AppError::provider(PROVIDER, format!("Failed to parse LLM response: {}", e)))?;

        parse_chat(chat_response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
