//! DocIntel ingestion CLI
//!
//! Builds and persists the vector index for a document folder without
//! starting the dashboard:
//! 1. Loads configuration
//! 2. Connects the embedding provider
//! 3. Loads, chunks and embeds the folder
//! 4. Saves the index where the dashboard reloads it

use clap::Parser;
use docintel_common::{config::AppConfig, logging, ModelGateway, VERSION};
use docintel_ingestion::DocumentProcessor;
use std::path::PathBuf;
use tracing::{error, info};

/// Build the DocIntel vector index from a folder of contracts
#[derive(Parser, Debug)]
#[command(name = "docintel-ingest")]
#[command(version, about)]
struct Args {
    /// Folder of PDF/text documents (defaults to documents.source_dir)
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Output path of the index (defaults to documents.index_path)
    #[arg(short, long)]
    index_path: Option<PathBuf>,

    /// Configuration file; APP__ environment variables still apply
    #[arg(short, long)]
    config: Option<String>,

    /// Model provider override (bedrock, openai, mock)
    #[arg(long)]
    provider: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::load()?,
    };
    if let Some(provider) = args.provider {
        config.llm.provider = provider;
    }

    logging::init(&config.observability);
    info!("Starting DocIntel ingestion v{}", VERSION);

    let source_dir = args.source_dir.unwrap_or_else(|| config.documents.source_dir.clone());
    let index_path = args.index_path.unwrap_or_else(|| config.documents.index_path.clone());

    let models = ModelGateway::from_config(&config.llm).await.map_err(|e| {
        error!(error = %e, "Failed to initialise model provider");
        e
    })?;

    let processor = DocumentProcessor::new(models.embedder(), &config.documents);
    let corpus = processor
        .process_and_save(&source_dir, &index_path)
        .await
        .map_err(|e| {
            error!(error = %e, dir = %source_dir.display(), "Ingestion failed");
            e
        })?;

    println!("{}", serde_json::to_string_pretty(&serde_json::json!({
        "index_path": index_path.display().to_string(),
        "documents": corpus.stats.documents,
        "pages": corpus.stats.pages,
        "chunks": corpus.stats.chunks,
        "fingerprint": corpus.index.manifest().fingerprint,
    }))?);

    Ok(())
}
