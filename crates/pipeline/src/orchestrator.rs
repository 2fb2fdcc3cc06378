use anyhow::{Context, Result};
use extract::{ExtractError, Extractor};
use index::{
    DocumentRecord, DocumentStore, Embedder, GraphWriter, IndexStatus, Similarity, StoreError,
};
use ingest::{Chunk, Chunker, ChunkerConfig, PageSource};
use serde::Serialize;
use tracing::{info, warn};

use crate::checkpoints::{Checkpoint, Checkpoints};

const PREVIEW_COUNT: usize = 2;
const PREVIEW_CHARS: usize = 300;

/// What is known about the document store's vector index support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorIndexState {
    Unknown,
    Supported,
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub chunker: ChunkerConfig,
    pub embedding_dimensions: usize,
}

/// Counters for one processed document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub chunks_total: usize,
    pub chunks_processed: usize,
    pub chunks_skipped: usize,
    pub chunks_failed: usize,
    pub documents_written: usize,
    pub nodes_written: usize,
    pub edges_written: usize,
    pub warnings: usize,
}

/// Runs one document through chunking, extraction, embedding and both stores.
///
/// Chunks are handled strictly in order and independently: a chunk that is
/// declined or fails does not change what happens to the next one.
pub struct Pipeline {
    settings: PipelineSettings,
    extractor: Extractor,
    embedder: Box<dyn Embedder>,
    documents: Box<dyn DocumentStore>,
    graph: GraphWriter,
    checkpoints: Box<dyn Checkpoints>,
    vector_index: VectorIndexState,
}

impl Pipeline {
    pub fn new(
        settings: PipelineSettings,
        extractor: Extractor,
        embedder: Box<dyn Embedder>,
        documents: Box<dyn DocumentStore>,
        graph: GraphWriter,
        checkpoints: Box<dyn Checkpoints>,
    ) -> Self {
        Self {
            settings,
            extractor,
            embedder,
            documents,
            graph,
            checkpoints,
            vector_index: VectorIndexState::Unknown,
        }
    }

    pub fn vector_index_state(&self) -> VectorIndexState {
        self.vector_index
    }

    pub async fn process(&mut self, source: &dyn PageSource, paper_id: &str) -> Result<RunReport> {
        let pages = source.pages().context("Failed to load pages")?;
        info!(pages = pages.len(), paper_id, "Loaded document");

        if self.checkpoints.confirm(Checkpoint::PreviewPages) {
            for page in pages.iter().take(PREVIEW_COUNT) {
                let preview: String = page.text.chars().take(PREVIEW_CHARS).collect();
                self.checkpoints
                    .show(&format!("[Page {}] {}\n", page.page_number, preview));
            }
            self.checkpoints.pause();
        }

        let chunks = Chunker::new(self.settings.chunker).chunk_pages(&pages);
        info!(chunks = chunks.len(), "Chunked document");

        if self.checkpoints.confirm(Checkpoint::PreviewChunks) {
            for chunk in chunks.iter().take(PREVIEW_COUNT) {
                self.checkpoints
                    .show(&format!("{} {}", chunk.chunk_id, chunk.preview(PREVIEW_CHARS)));
            }
            self.checkpoints.pause();
        }

        self.ensure_vector_index().await;

        let mut report = RunReport {
            chunks_total: chunks.len(),
            ..RunReport::default()
        };

        for (i, chunk) in chunks.iter().enumerate() {
            info!(chunk_id = %chunk.chunk_id, "Processing chunk {}/{}", i + 1, chunks.len());
            self.process_chunk(paper_id, chunk, &mut report).await;
        }

        match self.graph.store().stats().await {
            Ok(stats) => info!(
                nodes = stats.node_count,
                edges = stats.edge_count,
                "Graph totals"
            ),
            Err(e) => warn!(error = %e, "Could not read graph totals"),
        }

        info!(
            processed = report.chunks_processed,
            skipped = report.chunks_skipped,
            failed = report.chunks_failed,
            documents = report.documents_written,
            nodes = report.nodes_written,
            edges = report.edges_written,
            warnings = report.warnings,
            "Done"
        );

        Ok(report)
    }

    /// Make sure the vector index exists. Once the store has answered
    /// either way, later calls do nothing.
    pub async fn ensure_vector_index(&mut self) {
        if self.vector_index != VectorIndexState::Unknown {
            return;
        }

        info!("Checking vector index");
        match self
            .documents
            .ensure_vector_index(self.settings.embedding_dimensions, Similarity::Cosine)
            .await
        {
            Ok(IndexStatus::Created) => {
                info!("Vector index created");
                self.vector_index = VectorIndexState::Supported;
            }
            Ok(IndexStatus::AlreadyExists) => {
                info!("Vector index already exists");
                self.vector_index = VectorIndexState::Supported;
            }
            Err(StoreError::CapabilityUnsupported(reason)) => {
                warn!(%reason, "Vector index not supported, skipping permanently");
                self.vector_index = VectorIndexState::Unsupported;
            }
            Err(e) => {
                warn!(error = %e, "Unexpected vector index error");
            }
        }
    }

    async fn process_chunk(&mut self, paper_id: &str, chunk: &Chunk, report: &mut RunReport) {
        if !self.checkpoints.confirm(Checkpoint::ProcessChunk {
            chunk_id: &chunk.chunk_id,
        }) {
            report.chunks_skipped += 1;
            return;
        }

        let extraction = match self.extractor.extract(&chunk.text).await {
            Ok(extraction) => extraction,
            Err(ExtractError::Parse(e)) => {
                warn!(chunk_id = %chunk.chunk_id, error = %e, "Unparseable extraction, skipping chunk");
                report.chunks_failed += 1;
                return;
            }
            Err(e) => {
                warn!(chunk_id = %chunk.chunk_id, error = %e, "Extraction failed, skipping chunk");
                report.chunks_failed += 1;
                return;
            }
        };
        report.chunks_processed += 1;

        if self.checkpoints.confirm(Checkpoint::ShowExtraction) {
            match serde_json::to_string_pretty(&extraction) {
                Ok(json) => self.checkpoints.show(&json),
                Err(e) => warn!(error = %e, "Could not render extraction"),
            }
            self.checkpoints.pause();
        }

        let embedding = match self.embedder.embed(&chunk.text).await {
            Ok(embedding) => Some(embedding),
            Err(e) => {
                warn!(chunk_id = %chunk.chunk_id, error = %format!("{:#}", e), "Embedding failed, document not saved");
                report.warnings += 1;
                None
            }
        };

        if let Some(embedding) = embedding {
            if self.checkpoints.confirm(Checkpoint::SaveDocument) {
                let record = DocumentRecord::new(paper_id, chunk, &extraction, embedding);
                match self.documents.insert(&record).await {
                    Ok(()) => report.documents_written += 1,
                    Err(e) => {
                        warn!(chunk_id = %chunk.chunk_id, error = %e, "Document write failed");
                        report.warnings += 1;
                    }
                }
            }
        }

        if !extraction.relations.is_empty() && self.checkpoints.confirm(Checkpoint::PushGraph) {
            info!(chunk_id = %chunk.chunk_id, "Pushing to graph");
            let nodes = self.graph.upsert_entities(&extraction.entities).await;
            let edges = self.graph.upsert_relations(&extraction.relations).await;

            report.nodes_written += nodes.written();
            report.edges_written += edges.written();
            report.warnings += nodes.warnings() + edges.warnings();
        }
    }
}
