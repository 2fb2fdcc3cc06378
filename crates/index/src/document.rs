use async_trait::async_trait;
use extract::{ExtractionResult, RawEntity, RawRelation};
use ingest::Chunk;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One persisted chunk: text, vector and what was extracted from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub paper_id: String,
    pub chunk_id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub start_page: u32,
    pub end_page: u32,
    pub entities: Vec<RawEntity>,
    pub relations: Vec<RawRelation>,
}

impl DocumentRecord {
    pub fn new(
        paper_id: &str,
        chunk: &Chunk,
        extraction: &ExtractionResult,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            paper_id: paper_id.to_string(),
            chunk_id: chunk.chunk_id.clone(),
            text: chunk.text.clone(),
            embedding,
            metadata: ChunkMetadata {
                start_page: chunk.start_page,
                end_page: chunk.end_page,
                entities: extraction.entities.clone(),
                relations: extraction.relations.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Similarity {
    Cosine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    Created,
    AlreadyExists,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("vector index not supported by the document store: {0}")]
    CapabilityUnsupported(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create the vector index if missing. "Already exists" is success.
    async fn ensure_vector_index(
        &self,
        dimensions: usize,
        similarity: Similarity,
    ) -> Result<IndexStatus, StoreError>;

    async fn insert(&self, record: &DocumentRecord) -> Result<(), StoreError>;
}
