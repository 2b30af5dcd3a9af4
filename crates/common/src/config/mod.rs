//! Configuration management for DocIntel services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{APP_ENV}.toml)
//! - Default values
//!
//! Every field has a default, so an empty environment yields a runnable
//! configuration.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Language model provider configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Document loading and indexing configuration
    #[serde(default)]
    pub documents: DocumentsConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Analysis workflow configuration
    #[serde(default)]
    pub workflow: WorkflowConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Provider: bedrock, openai, mock
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    /// AWS region for Bedrock
    #[serde(default = "default_region")]
    pub region: String,

    /// Generation model identifier
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// Embedding model identifier
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// API key (OpenAI-compatible providers only)
    pub api_key: Option<String>,

    /// API base URL (OpenAI-compatible providers only)
    pub api_base: Option<String>,

    /// Maximum output tokens per generation
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// HTTP timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DocumentsConfig {
    /// Folder scanned for PDF and text documents
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Where the vector index is persisted
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Target chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Chunks shorter than this are dropped
    #[serde(default = "default_min_chunk_size")]
    pub min_chunk_size: usize,

    /// Number of leading pages that make up the workflow excerpt
    #[serde(default = "default_excerpt_pages")]
    pub excerpt_pages: usize,

    /// Characters taken from each excerpt page
    #[serde(default = "default_excerpt_page_chars")]
    pub excerpt_page_chars: usize,

    /// Reload a persisted index when the dashboard starts
    #[serde(default = "default_load_on_startup")]
    pub load_on_startup: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    /// Passages retrieved per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowConfig {
    /// Characters of the document excerpt sent to the summarizer and risk analyzer
    #[serde(default = "default_excerpt_limit")]
    pub excerpt_limit: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Expose Prometheus metrics on /metrics
    #[serde(default = "default_enabled")]
    pub metrics_enabled: bool,

    /// Service name attached to logs
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second across all model-backed routes
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8501 }
fn default_request_timeout() -> u64 { 300 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_llm_provider() -> String { "bedrock".to_string() }
fn default_region() -> String { "us-east-1".to_string() }
fn default_model_id() -> String { crate::DEFAULT_GENERATION_MODEL.to_string() }
fn default_embedding_model() -> String { crate::DEFAULT_EMBEDDING_MODEL.to_string() }
fn default_max_tokens() -> usize { 4096 }
fn default_temperature() -> f32 { 0.1 }
fn default_llm_timeout() -> u64 { 120 }
fn default_source_dir() -> PathBuf { PathBuf::from("./data/sample_contracts") }
fn default_index_path() -> PathBuf { PathBuf::from("./data/vector_index.json") }
fn default_chunk_size() -> usize { 1000 }
fn default_chunk_overlap() -> usize { 200 }
fn default_min_chunk_size() -> usize { 1 }
fn default_excerpt_pages() -> usize { 6 }
fn default_excerpt_page_chars() -> usize { 600 }
fn default_load_on_startup() -> bool { true }
fn default_top_k() -> usize { 3 }
fn default_excerpt_limit() -> usize { crate::workflow::EXCERPT_LIMIT }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { false }
fn default_service_name() -> String { "docintel".to_string() }
fn default_rate_limit() -> u32 { 5 }
fn default_burst() -> u32 { 10 }
fn default_enabled() -> bool { true }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__LLM__PROVIDER=mock
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific configuration file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            region: default_region(),
            model_id: default_model_id(),
            embedding_model: default_embedding_model(),
            api_key: None,
            api_base: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            index_path: default_index_path(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            min_chunk_size: default_min_chunk_size(),
            excerpt_pages: default_excerpt_pages(),
            excerpt_page_chars: default_excerpt_page_chars(),
            load_on_startup: default_load_on_startup(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: default_top_k() }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self { excerpt_limit: default_excerpt_limit() }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_enabled: default_enabled(),
            service_name: default_service_name(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: default_enabled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.llm.provider, "bedrock");
        assert_eq!(config.llm.embedding_model, "amazon.titan-embed-text-v1");
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.workflow.excerpt_limit, 3000);
    }

    #[test]
    fn test_chunking_defaults() {
        let docs = DocumentsConfig::default();
        assert_eq!(docs.chunk_size, 1000);
        assert_eq!(docs.chunk_overlap, 200);
        assert_eq!(docs.excerpt_pages, 6);
        assert_eq!(docs.excerpt_page_chars, 600);
    }

    #[test]
    fn test_from_file_fills_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docintel.toml");
        std::fs::write(&path, "[llm]\nprovider = \"mock\"\n\n[retrieval]\ntop_k = 5\n").unwrap();

        let config = AppConfig::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.llm.provider, "mock");
        assert_eq!(config.llm.max_tokens, 4096);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.server.port, 8501);
    }
}
