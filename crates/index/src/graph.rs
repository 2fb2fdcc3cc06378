use anyhow::Result;
use async_trait::async_trait;
use extract::Identifier;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex};

/// A node is identified by its label and its `name` property.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeKey {
    pub label: Identifier,
    pub name: String,
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(:{} {{name: {:?}}})", self.label, self.name)
    }
}

/// The only two writes this pipeline makes against the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum GraphMutation {
    MergeNode(NodeKey),
    MergeEdge {
        subject: NodeKey,
        rel_type: Identifier,
        object: NodeKey,
    },
}

impl GraphMutation {
    /// Cypher text. Labels and types come from sanitized identifiers;
    /// names are always bound as parameters.
    pub fn cypher(&self) -> String {
        match self {
            GraphMutation::MergeNode(node) => {
                format!("MERGE (n:{} {{name: $name}})", node.label.quoted())
            }
            GraphMutation::MergeEdge {
                subject,
                rel_type,
                object,
            } => format!(
                "MERGE (a:{} {{name: $subject}}) \
                 MERGE (b:{} {{name: $object}}) \
                 MERGE (a)-[r:{}]->(b) \
                 RETURN count(r) AS edges",
                subject.label.quoted(),
                object.label.quoted(),
                rel_type.quoted()
            ),
        }
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            GraphMutation::MergeNode(node) => vec![("name", node.name.clone())],
            GraphMutation::MergeEdge { subject, object, .. } => vec![
                ("subject", subject.name.clone()),
                ("object", object.name.clone()),
            ],
        }
    }
}

impl fmt::Display for GraphMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphMutation::MergeNode(node) => write!(f, "{}", node),
            GraphMutation::MergeEdge {
                subject,
                rel_type,
                object,
            } => write!(f, "{}-[:{}]->{}", subject, rel_type, object),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
}

#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Apply one mutation. Returns how many nodes or edges it matched or
    /// created; zero means the write found nothing to attach to.
    async fn run(&self, mutation: &GraphMutation) -> Result<u64>;

    async fn stats(&self) -> Result<GraphStats>;
}

#[async_trait]
impl<T: GraphStore + ?Sized> GraphStore for Arc<T> {
    async fn run(&self, mutation: &GraphMutation) -> Result<u64> {
        self.as_ref().run(mutation).await
    }

    async fn stats(&self) -> Result<GraphStats> {
        self.as_ref().stats().await
    }
}

type EdgeKey = (NodeKey, Identifier, NodeKey);

/// Graph kept in process memory with the same merge semantics as Neo4j
#[derive(Default)]
pub struct MemoryGraphStore {
    nodes: Mutex<BTreeSet<NodeKey>>,
    edges: Mutex<BTreeSet<EdgeKey>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_node(&self, node: &NodeKey) -> bool {
        self.nodes
            .lock()
            .map(|nodes| nodes.contains(node))
            .unwrap_or(false)
    }

    pub fn edges(&self) -> Vec<EdgeKey> {
        self.edges
            .lock()
            .map(|edges| edges.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn run(&self, mutation: &GraphMutation) -> Result<u64> {
        let mut nodes = self
            .nodes
            .lock()
            .map_err(|_| anyhow::anyhow!("graph node set poisoned"))?;

        match mutation {
            GraphMutation::MergeNode(node) => {
                nodes.insert(node.clone());
            }
            GraphMutation::MergeEdge {
                subject,
                rel_type,
                object,
            } => {
                nodes.insert(subject.clone());
                nodes.insert(object.clone());
                self.edges
                    .lock()
                    .map_err(|_| anyhow::anyhow!("graph edge set poisoned"))?
                    .insert((subject.clone(), rel_type.clone(), object.clone()));
            }
        }

        Ok(1)
    }

    async fn stats(&self) -> Result<GraphStats> {
        let node_count = self
            .nodes
            .lock()
            .map_err(|_| anyhow::anyhow!("graph node set poisoned"))?
            .len();
        let edge_count = self
            .edges
            .lock()
            .map_err(|_| anyhow::anyhow!("graph edge set poisoned"))?
            .len();

        Ok(GraphStats {
            node_count,
            edge_count,
        })
    }
}
