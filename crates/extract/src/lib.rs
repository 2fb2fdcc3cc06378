pub mod llm;
pub mod normalizer;
pub mod prompt;
pub mod retry;
pub mod sanitize;
pub mod schema;

pub use llm::{ChatModel, OpenAiClient};
pub use normalizer::{EntityRejection, normalize_entity, normalize_relation};
pub use retry::RetryPolicy;
pub use sanitize::{Identifier, sanitize_label, sanitize_relation};
pub use schema::{ExtractionResult, NormalizedEntity, NormalizedRelation, RawEntity, RawRelation};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON object found in model output")]
    NoJson,

    #[error("model output is not valid JSON: {0}")]
    Invalid(#[source] serde_json::Error),

    #[error("model output is JSON but not an object")]
    NotAnObject,

    #[error("extraction result has the wrong shape: {0}")]
    Shape(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("extraction model call failed: {0:#}")]
    Model(anyhow::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Recover the extraction result from model output.
///
/// The whole text is tried first; failing that, the span from the first
/// `{` to the last `}` is parsed.
pub fn parse_extraction(raw: &str) -> Result<ExtractionResult, ParseError> {
    let value = match serde_json::from_str::<Value>(raw) {
        Ok(value) => value,
        Err(_) => {
            let span = outer_braces(raw).ok_or(ParseError::NoJson)?;
            serde_json::from_str::<Value>(span).map_err(ParseError::Invalid)?
        }
    };

    if !value.is_object() {
        return Err(ParseError::NotAnObject);
    }

    serde_json::from_value(value).map_err(ParseError::Shape)
}

fn outer_braces(raw: &str) -> Option<&str> {
    let first = raw.find('{')?;
    let last = raw.rfind('}')?;
    (first < last).then(|| &raw[first..=last])
}

pub struct Extractor {
    model: Box<dyn ChatModel>,
}

impl Extractor {
    pub fn new(model: Box<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Extract entities and relations from a chunk of text
    pub async fn extract(&self, text: &str) -> Result<ExtractionResult, ExtractError> {
        let output = self
            .model
            .complete(prompt::EXTRACTION_SYSTEM_PROMPT, text)
            .await
            .map_err(ExtractError::Model)?;

        let result = parse_extraction(&output)?;
        debug!(
            entities = result.entities.len(),
            relations = result.relations.len(),
            "Parsed extraction"
        );
        Ok(result)
    }
}
