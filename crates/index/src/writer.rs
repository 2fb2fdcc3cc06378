use extract::{
    EntityRejection, RawEntity, RawRelation, normalize_entity, normalize_relation, sanitize_label,
    sanitize_relation,
};
use tracing::{debug, warn};

use crate::graph::{GraphMutation, GraphStore, NodeKey};

/// An input item that was skipped before reaching the store
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationWarning {
    InvalidEntity {
        entity: RawEntity,
        reason: EntityRejection,
    },
    UnnormalizableRelation {
        relation: RawRelation,
    },
}

/// A single write the store refused or could not place
#[derive(Debug, Clone, PartialEq)]
pub struct BackendWriteError {
    pub mutation: GraphMutation,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Written(GraphMutation),
    Skipped(ValidationWarning),
    Failed(BackendWriteError),
}

/// Per-item results of one best-effort batch, in input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn written(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ItemOutcome::Written(_)))
            .count()
    }

    pub fn warnings(&self) -> usize {
        self.outcomes.len() - self.written()
    }
}

/// Writes extracted entities and relations into a graph store.
///
/// Every item is written on its own; a rejected or failed item is recorded
/// and the rest of the batch continues.
pub struct GraphWriter {
    store: Box<dyn GraphStore>,
}

impl GraphWriter {
    pub fn new(store: Box<dyn GraphStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn GraphStore {
        self.store.as_ref()
    }

    pub async fn upsert_entities(&self, entities: &[RawEntity]) -> BatchReport {
        let mut report = BatchReport::default();

        for raw in entities {
            let outcome = match normalize_entity(raw) {
                Ok(entity) => {
                    let node = NodeKey {
                        label: sanitize_label(entity.entity_type.as_str()),
                        name: entity.name,
                    };
                    self.apply(GraphMutation::MergeNode(node)).await
                }
                Err(reason) => {
                    warn!(entity = ?raw, %reason, "Skipping invalid entity");
                    ItemOutcome::Skipped(ValidationWarning::InvalidEntity {
                        entity: raw.clone(),
                        reason,
                    })
                }
            };
            report.outcomes.push(outcome);
        }

        report
    }

    pub async fn upsert_relations(&self, relations: &[RawRelation]) -> BatchReport {
        let mut report = BatchReport::default();

        for raw in relations {
            let outcome = match normalize_relation(raw) {
                Some(relation) => {
                    let mutation = GraphMutation::MergeEdge {
                        subject: NodeKey {
                            label: sanitize_label(relation.subject_type.as_str()),
                            name: relation.subject,
                        },
                        rel_type: sanitize_relation(relation.predicate.as_str()),
                        object: NodeKey {
                            label: sanitize_label(relation.object_type.as_str()),
                            name: relation.object,
                        },
                    };
                    self.apply(mutation).await
                }
                None => {
                    warn!(relation = ?raw, "Skipping relation with missing ends");
                    ItemOutcome::Skipped(ValidationWarning::UnnormalizableRelation {
                        relation: raw.clone(),
                    })
                }
            };
            report.outcomes.push(outcome);
        }

        report
    }

    async fn apply(&self, mutation: GraphMutation) -> ItemOutcome {
        match self.store.run(&mutation).await {
            Ok(0) => {
                warn!(%mutation, "No matching node, write skipped");
                ItemOutcome::Failed(BackendWriteError {
                    mutation,
                    message: "no matching node found".to_string(),
                })
            }
            Ok(_) => {
                debug!(%mutation, "Merged");
                ItemOutcome::Written(mutation)
            }
            Err(e) => {
                warn!(%mutation, error = %format!("{:#}", e), "Graph write failed");
                ItemOutcome::Failed(BackendWriteError {
                    mutation,
                    message: format!("{:#}", e),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphStats, MemoryGraphStore};
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Arc;

    /// Fails any write that mentions the given name
    struct Flaky {
        inner: MemoryGraphStore,
        poison: &'static str,
    }

    #[async_trait]
    impl GraphStore for Flaky {
        async fn run(&self, mutation: &GraphMutation) -> Result<u64> {
            if mutation.params().iter().any(|(_, v)| v == self.poison) {
                anyhow::bail!("constraint violation on {}", self.poison);
            }
            self.inner.run(mutation).await
        }

        async fn stats(&self) -> Result<GraphStats> {
            self.inner.stats().await
        }
    }

    /// Never finds anything to attach edges to
    struct NoMatch;

    #[async_trait]
    impl GraphStore for NoMatch {
        async fn run(&self, _mutation: &GraphMutation) -> Result<u64> {
            Ok(0)
        }

        async fn stats(&self) -> Result<GraphStats> {
            Ok(GraphStats::default())
        }
    }

    fn shared() -> (Arc<MemoryGraphStore>, GraphWriter) {
        let graph = Arc::new(MemoryGraphStore::new());
        let writer = GraphWriter::new(Box::new(graph.clone()));
        (graph, writer)
    }

    fn entities(value: Value) -> Vec<RawEntity> {
        serde_json::from_value(value).unwrap()
    }

    fn relations(value: Value) -> Vec<RawRelation> {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_entities_merge_by_label_and_name() {
        let (graph, writer) = shared();
        let batch = entities(json!([
            "TP53",
            {"name": "TP53", "type": "Entity"},
            {"name": "MDM2", "type": "gene product"},
            {"name": "MDM2", "type": "gene-product"}
        ]));

        let report = writer.upsert_entities(&batch).await;

        assert_eq!(report.written(), 4);
        assert_eq!(graph.stats().await.unwrap().node_count, 2);
        assert!(graph.contains_node(&NodeKey {
            label: sanitize_label("GeneProduct"),
            name: "MDM2".into()
        }));
    }

    #[tokio::test]
    async fn test_invalid_entities_are_skipped() {
        let (graph, writer) = shared();
        let batch = entities(json!([42, {"type": "protein"}, "BRCA1", null]));

        let report = writer.upsert_entities(&batch).await;

        assert_eq!(report.written(), 1);
        assert_eq!(report.warnings(), 3);
        assert!(matches!(
            report.outcomes[0],
            ItemOutcome::Skipped(ValidationWarning::InvalidEntity {
                reason: EntityRejection::InvalidShape,
                ..
            })
        ));
        assert!(matches!(
            report.outcomes[1],
            ItemOutcome::Skipped(ValidationWarning::InvalidEntity {
                reason: EntityRejection::MissingName,
                ..
            })
        ));
        assert_eq!(graph.stats().await.unwrap().node_count, 1);
    }

    #[tokio::test]
    async fn test_one_invalid_one_valid_relation() {
        let (graph, writer) = shared();
        let batch = relations(json!([
            {"subject": "X"},
            {"source": "X", "target": "Y", "rel": "activates"}
        ]));

        let report = writer.upsert_relations(&batch).await;

        assert_eq!(report.written(), 1);
        assert_eq!(report.warnings(), 1);
        assert!(matches!(
            report.outcomes[0],
            ItemOutcome::Skipped(ValidationWarning::UnnormalizableRelation { .. })
        ));

        let edges = graph.edges();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].1.as_str(), "ACTIVATES");
    }

    #[tokio::test]
    async fn test_same_relation_twice_is_one_edge() {
        let (graph, writer) = shared();
        let batch = relations(json!([
            {"subject": "MDM2", "object": "TP53", "predicate": "binds to", "subject_type": "protein"},
            {"head": "MDM2", "tail": "TP53", "relation": "binds-to", "source_type": "Protein"}
        ]));

        writer.upsert_relations(&batch).await;
        writer.upsert_relations(&batch).await;

        let stats = graph.stats().await.unwrap();
        assert_eq!(stats, GraphStats { node_count: 2, edge_count: 1 });
    }

    #[tokio::test]
    async fn test_edge_creates_missing_endpoints() {
        let (graph, writer) = shared();
        let batch = relations(json!([
            {"subject": "aspirin", "subject_type": "drug", "object": "COX-1", "object_type": "enzyme", "predicate": "inhibits"}
        ]));

        writer.upsert_relations(&batch).await;

        assert!(graph.contains_node(&NodeKey { label: sanitize_label("Drug"), name: "aspirin".into() }));
        assert!(graph.contains_node(&NodeKey { label: sanitize_label("Enzyme"), name: "COX-1".into() }));
    }

    #[tokio::test]
    async fn test_backend_failure_does_not_abort_batch() {
        let writer = GraphWriter::new(Box::new(Flaky {
            inner: MemoryGraphStore::new(),
            poison: "bad",
        }));
        let batch = entities(json!(["good", "bad", "also good"]));

        let report = writer.upsert_entities(&batch).await;

        assert_eq!(report.written(), 2);
        match &report.outcomes[1] {
            ItemOutcome::Failed(err) => {
                assert!(err.message.contains("constraint violation"));
                assert_eq!(err.mutation.params(), vec![("name", "bad".to_string())]);
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(writer.store().stats().await.unwrap().node_count, 2);
    }

    #[tokio::test]
    async fn test_unmatched_edge_is_a_warning() {
        let writer = GraphWriter::new(Box::new(NoMatch));
        let batch = relations(json!([{"subject": "A", "object": "B", "predicate": "p"}]));

        let report = writer.upsert_relations(&batch).await;

        assert_eq!(report.written(), 0);
        assert!(matches!(report.outcomes[0], ItemOutcome::Failed(_)));
    }
}
