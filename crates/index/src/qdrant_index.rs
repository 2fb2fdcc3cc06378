use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use uuid::Uuid;

use crate::document::{DocumentRecord, DocumentStore, IndexStatus, Similarity, StoreError};

/// Document store backed by a Qdrant collection over its REST API
pub struct QdrantStore {
    base_url: String,
    client: reqwest::Client,
    collection_name: String,
}

#[derive(Serialize)]
struct CreateCollection {
    vectors: VectorParams,
}

#[derive(Serialize)]
struct VectorParams {
    size: usize,
    distance: &'static str,
}

#[derive(Serialize)]
struct UpsertPoints<'a> {
    points: Vec<Point<'a>>,
}

#[derive(Serialize)]
struct Point<'a> {
    id: Uuid,
    vector: &'a [f32],
    payload: Payload<'a>,
}

#[derive(Serialize)]
struct Payload<'a> {
    paper_id: &'a str,
    chunk_id: &'a str,
    text: &'a str,
    metadata: &'a crate::document::ChunkMetadata,
}

#[derive(Deserialize)]
struct CollectionInfo {
    result: CollectionResult,
}

#[derive(Deserialize)]
struct CollectionResult {
    collections: Vec<Collection>,
}

#[derive(Deserialize)]
struct Collection {
    name: String,
}

impl QdrantStore {
    pub fn new(base_url: String, collection_name: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            collection_name,
        }
    }

    /// Fails unless Qdrant answers a collection listing.
    pub async fn check_connection(&self) -> anyhow::Result<()> {
        let exists = self
            .collection_exists()
            .await
            .with_context(|| format!("Qdrant at {} is not answering", self.base_url))?;
        debug!(collection = %self.collection_name, exists, "Qdrant reachable");
        Ok(())
    }

    async fn collection_exists(&self) -> anyhow::Result<bool> {
        let url = format!("{}/collections", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach Qdrant")?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to list collections: {}", response.status());
        }

        let info: CollectionInfo = response.json().await?;
        Ok(info
            .result
            .collections
            .iter()
            .any(|c| c.name == self.collection_name))
    }
}

/// Stable point id for a chunk of a paper
pub fn point_id(paper_id: &str, chunk_id: &str) -> Uuid {
    let digest = Sha256::new()
        .chain_update(paper_id.as_bytes())
        .chain_update(b"\0")
        .chain_update(chunk_id.as_bytes())
        .finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes)
}

fn distance_name(similarity: Similarity) -> &'static str {
    match similarity {
        Similarity::Cosine => "Cosine",
    }
}

/// Map a failed create-collection response onto an index outcome
fn classify_index_failure(status: StatusCode, body: &str) -> Result<IndexStatus, StoreError> {
    let lowered = body.to_ascii_lowercase();

    if status == StatusCode::CONFLICT || lowered.contains("already exists") {
        return Ok(IndexStatus::AlreadyExists);
    }

    if matches!(
        status,
        StatusCode::FORBIDDEN | StatusCode::NOT_IMPLEMENTED | StatusCode::PAYMENT_REQUIRED
    ) || lowered.contains("not supported")
        || lowered.contains("disallowed")
    {
        return Err(StoreError::CapabilityUnsupported(format!("{} {}", status, body)));
    }

    Err(StoreError::Backend(anyhow!(
        "Failed to create collection: {} {}",
        status,
        body
    )))
}

#[async_trait]
impl DocumentStore for QdrantStore {
    async fn ensure_vector_index(
        &self,
        dimensions: usize,
        similarity: Similarity,
    ) -> Result<IndexStatus, StoreError> {
        if self.collection_exists().await? {
            info!(collection = %self.collection_name, "Collection already exists");
            return Ok(IndexStatus::AlreadyExists);
        }

        let url = format!("{}/collections/{}", self.base_url, self.collection_name);
        let create_req = CreateCollection {
            vectors: VectorParams {
                size: dimensions,
                distance: distance_name(similarity),
            },
        };

        let response = self
            .client
            .put(&url)
            .json(&create_req)
            .send()
            .await
            .context("Failed to send create collection request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return classify_index_failure(status, &error_text);
        }

        info!(collection = %self.collection_name, dimensions, "Collection created");
        Ok(IndexStatus::Created)
    }

    async fn insert(&self, record: &DocumentRecord) -> Result<(), StoreError> {
        let url = format!(
            "{}/collections/{}/points?wait=true",
            self.base_url, self.collection_name
        );

        let upsert_req = UpsertPoints {
            points: vec![Point {
                id: point_id(&record.paper_id, &record.chunk_id),
                vector: &record.embedding,
                payload: Payload {
                    paper_id: &record.paper_id,
                    chunk_id: &record.chunk_id,
                    text: &record.text,
                    metadata: &record.metadata,
                },
            }],
        };

        let response = self
            .client
            .put(&url)
            .json(&upsert_req)
            .send()
            .await
            .context("Failed to send point upsert")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Failed to upsert point: {} {}", status, error_text).into());
        }

        debug!(chunk_id = %record.chunk_id, "Stored chunk document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_check_connection_fails_when_server_is_down() {
        let store = QdrantStore::new("http://127.0.0.1:1/".to_string(), "chunks".to_string());
        let err = store.check_connection().await.unwrap_err();
        assert!(format!("{:#}", err).contains("http://127.0.0.1:1 is not answering"));
    }

    #[test]
    fn test_point_id_is_stable_and_distinct() {
        assert_eq!(point_id("paper-001", "chunk_0"), point_id("paper-001", "chunk_0"));
        assert_ne!(point_id("paper-001", "chunk_0"), point_id("paper-001", "chunk_1"));
        assert_ne!(point_id("paper-00", "1chunk_0"), point_id("paper-001", "chunk_0"));
    }

    #[test]
    fn test_classify_already_exists() {
        let outcome = classify_index_failure(
            StatusCode::BAD_REQUEST,
            r#"{"status":{"error":"Wrong input: Collection `chunks` already exists!"}}"#,
        );
        assert_eq!(outcome.unwrap(), IndexStatus::AlreadyExists);
        assert_eq!(
            classify_index_failure(StatusCode::CONFLICT, "").unwrap(),
            IndexStatus::AlreadyExists
        );
    }

    #[test]
    fn test_classify_unsupported() {
        assert!(matches!(
            classify_index_failure(StatusCode::FORBIDDEN, "plan limit"),
            Err(StoreError::CapabilityUnsupported(_))
        ));
        assert!(matches!(
            classify_index_failure(StatusCode::BAD_REQUEST, "vector index disallowed in this tier"),
            Err(StoreError::CapabilityUnsupported(_))
        ));
    }

    #[test]
    fn test_classify_other_failures() {
        assert!(matches!(
            classify_index_failure(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            Err(StoreError::Backend(_))
        ));
    }
}
