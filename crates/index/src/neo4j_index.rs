use anyhow::{Context, Result};
use async_trait::async_trait;
use neo4rs::{Graph, Query};

use crate::graph::{GraphMutation, GraphStats, GraphStore};

pub struct Neo4jGraphStore {
    graph: Graph,
}

impl Neo4jGraphStore {
    pub fn new(graph: Graph) -> Self {
        Self { graph }
    }

    /// Build the pool and make sure the server answers. The pool itself
    /// connects lazily, so an unreachable server only shows up here.
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self> {
        let graph = Graph::new(uri, user, password)
            .await
            .with_context(|| format!("Failed to connect to Neo4j at {}", uri))?;
        graph
            .run(Query::new("RETURN 1".to_string()))
            .await
            .with_context(|| format!("Neo4j at {} is not answering", uri))?;
        Ok(Self::new(graph))
    }

    fn query_for(mutation: &GraphMutation) -> Query {
        mutation
            .params()
            .into_iter()
            .fold(Query::new(mutation.cypher()), |query, (key, value)| {
                query.param(key, value)
            })
    }

    async fn count(&self, cypher: &str) -> Result<usize> {
        let mut result = self.graph.execute(Query::new(cypher.to_string())).await?;
        let count = if let Some(row) = result.next().await? {
            row.get::<i64>("count").unwrap_or(0) as usize
        } else {
            0
        };
        Ok(count)
    }
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn run(&self, mutation: &GraphMutation) -> Result<u64> {
        let query = Self::query_for(mutation);

        match mutation {
            GraphMutation::MergeNode(_) => {
                self.graph
                    .run(query)
                    .await
                    .context("Failed to merge node")?;
                Ok(1)
            }
            GraphMutation::MergeEdge { .. } => {
                let mut result = self
                    .graph
                    .execute(query)
                    .await
                    .context("Failed to merge relationship")?;
                let edges = match result.next().await? {
                    Some(row) => row.get::<i64>("edges").unwrap_or(0),
                    None => 0,
                };
                Ok(edges.max(0) as u64)
            }
        }
    }

    async fn stats(&self) -> Result<GraphStats> {
        let node_count = self.count("MATCH (n) RETURN count(n) as count").await?;
        let edge_count = self.count("MATCH ()-[r]->() RETURN count(r) as count").await?;

        Ok(GraphStats {
            node_count,
            edge_count,
        })
    }
}
