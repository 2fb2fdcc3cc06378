use serde_json::{Map, Value};
use std::fmt;

use crate::sanitize::DEFAULT_LABEL;
use crate::schema::{NormalizedEntity, NormalizedRelation, RawEntity, RawRelation};

// Probe order matters: the first key holding a usable value wins.
pub const SUBJECT_KEYS: &[&str] = &["subject", "source", "head", "entity1", "from", "subj"];
pub const OBJECT_KEYS: &[&str] = &["object", "target", "tail", "entity2", "to", "obj"];
pub const PREDICATE_KEYS: &[&str] = &["predicate", "relation", "rel", "type", "action"];
pub const SUBJECT_TYPE_KEYS: &[&str] = &["subject_type", "source_type"];
pub const OBJECT_TYPE_KEYS: &[&str] = &["object_type", "target_type"];

/// Why an entity could not be turned into a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRejection {
    /// Neither a string nor a mapping
    InvalidShape,
    MissingName,
}

impl fmt::Display for EntityRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRejection::InvalidShape => f.write_str("entity is neither a name nor a mapping"),
            EntityRejection::MissingName => f.write_str("entity has no name"),
        }
    }
}

/// Read a value as text if it carries any.
///
/// Strings count when they are not empty (whitespace included), numbers
/// are rendered, and a nested mapping counts through its `name`.
/// Everything else is missing.
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => match map.get("name") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        },
        _ => None,
    }
}

/// First usable value among `keys`, in order
pub fn probe(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| record.get(*key).and_then(text_of))
}

/// Map a loosely-shaped relation onto the canonical record.
///
/// Returns `None` for anything that is not a mapping, or when subject,
/// object or predicate cannot be resolved.
pub fn normalize_relation(raw: &RawRelation) -> Option<NormalizedRelation> {
    let RawRelation::Record(record) = raw else {
        return None;
    };

    let subject = probe(record, SUBJECT_KEYS)?;
    let object = probe(record, OBJECT_KEYS)?;
    let predicate = probe(record, PREDICATE_KEYS)?;

    Some(NormalizedRelation {
        subject,
        object,
        predicate,
        subject_type: probe(record, SUBJECT_TYPE_KEYS).unwrap_or_else(|| DEFAULT_LABEL.to_string()),
        object_type: probe(record, OBJECT_TYPE_KEYS).unwrap_or_else(|| DEFAULT_LABEL.to_string()),
    })
}

/// Bare names become `{name, type: Entity}`; mappings need a `name`.
pub fn normalize_entity(raw: &RawEntity) -> Result<NormalizedEntity, EntityRejection> {
    match raw {
        RawEntity::Name(name) if name.trim().is_empty() => Err(EntityRejection::MissingName),
        RawEntity::Name(name) => Ok(NormalizedEntity {
            name: name.clone(),
            entity_type: DEFAULT_LABEL.to_string(),
        }),
        RawEntity::Record(record) => {
            let name = record
                .get("name")
                .and_then(text_of)
                .filter(|name| !name.trim().is_empty())
                .ok_or(EntityRejection::MissingName)?;
            let entity_type = record
                .get("type")
                .and_then(text_of)
                .unwrap_or_else(|| DEFAULT_LABEL.to_string());
            Ok(NormalizedEntity { name, entity_type })
        }
        RawEntity::Other(_) => Err(EntityRejection::InvalidShape),
    }
}
