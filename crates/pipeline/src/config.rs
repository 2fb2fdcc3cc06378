use ingest::ChunkerConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub chunking: ChunkingConfig,
    pub llm: LlmConfig,
    pub documents: DocumentStoreConfig,
    pub graph: GraphStoreConfig,
    pub retry: RetryConfig,
    pub interactive: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub text_model: String,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStoreConfig {
    pub url: String,
    pub collection: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStoreConfig {
    pub uri: String,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl ChunkingConfig {
    pub fn chunker(&self) -> ChunkerConfig {
        ChunkerConfig {
            chunk_size: self.chunk_size,
            overlap: self.chunk_overlap,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> extract::RetryPolicy {
        extract::RetryPolicy::new(self.max_retries, self.initial_backoff_ms, self.max_backoff_ms)
    }
}

impl PipelineConfig {
    /// Read settings from the process environment, after loading `.env` if present
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &'static str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let chunking = ChunkingConfig {
            chunk_size: parsed(&lookup, "CHUNK_SIZE", 1500)?,
            chunk_overlap: parsed(&lookup, "CHUNK_OVERLAP", 200)?,
        };
        if chunking.chunk_size == 0 {
            return Err(ConfigError::Invalid {
                key: "CHUNK_SIZE",
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if chunking.chunk_overlap >= chunking.chunk_size {
            return Err(ConfigError::Invalid {
                key: "CHUNK_OVERLAP",
                value: chunking.chunk_overlap.to_string(),
                reason: format!("must be smaller than CHUNK_SIZE ({})", chunking.chunk_size),
            });
        }

        let interactive = match text("INTERACTIVE", "true").to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            other => {
                return Err(ConfigError::Invalid {
                    key: "INTERACTIVE",
                    value: other.to_string(),
                    reason: "expected true or false".to_string(),
                });
            }
        };

        Ok(Self {
            chunking,
            llm: LlmConfig {
                base_url: text("LLM_BASE_URL", "https://api.openai.com/v1"),
                api_key: lookup("OPENAI_API_KEY").filter(|v| !v.trim().is_empty()),
                text_model: text("OPENAI_MODEL_TEXT", "gpt-4o-mini"),
                embedding_model: text("OPENAI_MODEL_EMBED", "text-embedding-3-small"),
                embedding_dimensions: parsed(&lookup, "EMBEDDING_DIMENSIONS", 1536)?,
            },
            documents: DocumentStoreConfig {
                url: text("QDRANT_URL", "http://localhost:6333"),
                collection: text("QDRANT_COLLECTION", "chunks"),
            },
            graph: GraphStoreConfig {
                uri: required("NEO4J_URI")?,
                user: required("NEO4J_USER")?,
                password: required("NEO4J_PASSWORD")?,
            },
            retry: RetryConfig {
                max_retries: parsed(&lookup, "LLM_MAX_RETRIES", 3)?,
                initial_backoff_ms: 1000,
                max_backoff_ms: 10000,
            },
            interactive,
        })
    }
}

fn parsed<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}
