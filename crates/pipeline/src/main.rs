use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use extract::{Extractor, OpenAiClient};
use index::{EmbeddingClient, GraphWriter, Neo4jGraphStore, QdrantStore};
use ingest::PdfReader;
use pipeline::{
    AlwaysProceed, Checkpoints, Pipeline, PipelineConfig, PipelineSettings, TerminalCheckpoints,
};

/// Chunk a PDF, extract entities and relations, and load them into the
/// document and graph stores.
#[derive(Parser, Debug)]
#[command(name = "pdf2graph", version)]
struct Cli {
    /// PDF file to ingest
    pdf_path: PathBuf,

    /// Identifier stored with every chunk of this document
    #[arg(long, default_value = "paper-001")]
    paper_id: String,

    /// Never prompt; every checkpoint proceeds
    #[arg(long)]
    non_interactive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig::from_env().context("Failed to load configuration")?;
    let interactive = config.interactive && !cli.non_interactive;

    tracing::info!(neo4j = %config.graph.uri, qdrant = %config.documents.url, "Loaded config");

    let graph = Neo4jGraphStore::connect(
        &config.graph.uri,
        &config.graph.user,
        &config.graph.password,
    )
    .await?;
    let documents = QdrantStore::new(
        config.documents.url.clone(),
        config.documents.collection.clone(),
    );
    documents.check_connection().await?;

    let retry = config.retry.policy();
    let chat = OpenAiClient::new(
        config.llm.base_url.clone(),
        config.llm.text_model.clone(),
        config.llm.api_key.clone(),
    )
    .with_retry(retry.clone());
    let embedder = EmbeddingClient::new(
        config.llm.base_url.clone(),
        config.llm.embedding_model.clone(),
        config.llm.api_key.clone(),
    )
    .with_retry(retry);

    let checkpoints: Box<dyn Checkpoints> = if interactive {
        Box::new(TerminalCheckpoints)
    } else {
        Box::new(AlwaysProceed)
    };

    let mut pipeline = Pipeline::new(
        PipelineSettings {
            chunker: config.chunking.chunker(),
            embedding_dimensions: config.llm.embedding_dimensions,
        },
        Extractor::new(Box::new(chat)),
        Box::new(embedder),
        Box::new(documents),
        GraphWriter::new(Box::new(graph)),
        checkpoints,
    );

    let report = pipeline
        .process(&PdfReader::new(&cli.pdf_path), &cli.paper_id)
        .await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
