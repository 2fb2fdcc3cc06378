use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// An entity as the model returned it: a bare name, a mapping, or junk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawEntity {
    Name(String),
    Record(Map<String, Value>),
    Other(Value),
}

/// A relation as the model returned it. Only mappings can be normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawRelation {
    Record(Map<String, Value>),
    Other(Value),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub entities: Vec<RawEntity>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub relations: Vec<RawRelation>,
    /// Any other keys the model chose to add, kept for display
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEntity {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRelation {
    pub subject: String,
    pub object: String,
    pub predicate: String,
    pub subject_type: String,
    pub object_type: String,
}
