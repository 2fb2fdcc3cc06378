pub mod document;
pub mod embeddings;
pub mod graph;
pub mod neo4j_index;
pub mod qdrant_index;
pub mod writer;

pub use document::{ChunkMetadata, DocumentRecord, DocumentStore, IndexStatus, Similarity, StoreError};
pub use embeddings::{Embedder, EmbeddingClient};
pub use graph::{GraphMutation, GraphStats, GraphStore, MemoryGraphStore, NodeKey};
pub use neo4j_index::Neo4jGraphStore;
pub use qdrant_index::QdrantStore;
pub use writer::{BackendWriteError, BatchReport, GraphWriter, ItemOutcome, ValidationWarning};
