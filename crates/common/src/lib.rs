//! DocIntel Common Library
//!
//! Shared code for the DocIntel services including:
//! - Language model gateway (generation and embeddings)
//! - Vector retrieval index and the question-answering pipeline
//! - The multi-agent analysis workflow and report composition
//! - Error types, configuration, logging and metrics

pub mod config;
pub mod embeddings;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod metrics;
pub mod rag;
pub mod workflow;

// Re-export commonly used types
pub use config::AppConfig;
pub use embeddings::Embedder;
pub use errors::{AppError, Result};
pub use llm::{Generator, ModelGateway};
pub use rag::{Passage, QaAnswer, QaPipeline, Retriever, VectorIndex};
pub use workflow::{RunError, Sequencer, Task, WorkRecord};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default generation model (Claude 3 Haiku on Bedrock)
pub const DEFAULT_GENERATION_MODEL: &str = "us.anthropic.claude-3-haiku-20240307-v1:0";

/// Default embedding model (Titan text embeddings on Bedrock)
pub const DEFAULT_EMBEDDING_MODEL: &str = "amazon.titan-embed-text-v1";

/// Default embedding dimension
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1536;
