use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

pub const DEFAULT_LABEL: &str = "Entity";
pub const DEFAULT_RELATION: &str = "RELATED_TO";

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("static regex"));

/// A graph schema identifier (node label or relationship type).
///
/// Only the sanitizers below can build one, so every value is non-empty
/// and restricted to ASCII letters, digits and `_`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Backtick-quoted form for Cypher; also covers identifiers starting with a digit
    pub fn quoted(&self) -> String {
        format!("`{}`", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn tokens(raw: &str) -> Vec<&str> {
    // Replacing with a space only changes separators, so splitting the
    // regex matches out directly yields the same tokens.
    NON_ALPHANUMERIC
        .split(raw)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Turn a free-text entity type into a PascalCase node label.
///
/// `"gene-product 2"` becomes `GeneProduct2`. Empty or missing input, or
/// input without any letters or digits, becomes `Entity`.
pub fn sanitize_label<'a>(raw: impl Into<Option<&'a str>>) -> Identifier {
    let Some(raw) = raw.into() else {
        return Identifier(DEFAULT_LABEL.to_string());
    };

    let label: String = tokens(raw)
        .into_iter()
        .map(|token| {
            let mut chars = token.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    if label.is_empty() {
        Identifier(DEFAULT_LABEL.to_string())
    } else {
        Identifier(label)
    }
}

/// Turn a free-text predicate into an upper snake case relationship type.
///
/// `"binds to"` becomes `BINDS_TO`. Empty or missing input becomes `RELATED_TO`.
pub fn sanitize_relation<'a>(raw: impl Into<Option<&'a str>>) -> Identifier {
    let Some(raw) = raw.into() else {
        return Identifier(DEFAULT_RELATION.to_string());
    };
    if raw.is_empty() {
        return Identifier(DEFAULT_RELATION.to_string());
    }

    let parts = tokens(raw);
    if parts.is_empty() {
        // Same fallback as the label path, upper-cased
        return Identifier(DEFAULT_LABEL.to_ascii_uppercase());
    }

    Identifier(
        parts
            .iter()
            .map(|t| t.to_ascii_uppercase())
            .collect::<Vec<_>>()
            .join("_"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_safe(id: &Identifier) -> bool {
        !id.as_str().is_empty()
            && id
                .as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    #[test]
    fn test_label_defaults() {
        assert_eq!(sanitize_label("").as_str(), "Entity");
        assert_eq!(sanitize_label(None).as_str(), "Entity");
        assert_eq!(sanitize_label("!!! ---").as_str(), "Entity");
    }

    #[test]
    fn test_label_pascal_case() {
        assert_eq!(sanitize_label("gene-product 2").as_str(), "GeneProduct2");
        assert_eq!(sanitize_label("protein").as_str(), "Protein");
        assert_eq!(sanitize_label("  small   molecule ").as_str(), "SmallMolecule");
    }

    #[test]
    fn test_label_keeps_rest_of_token() {
        assert_eq!(sanitize_label("mRNA transcript").as_str(), "MRNATranscript");
        assert_eq!(sanitize_label("DNA").as_str(), "DNA");
    }

    #[test]
    fn test_label_drops_non_ascii() {
        assert_eq!(sanitize_label("β-catenin").as_str(), "Catenin");
        assert_eq!(sanitize_label("Person`) DETACH DELETE n //").as_str(), "PersonDETACHDELETEN");
    }

    #[test]
    fn test_relation_upper_snake_case() {
        assert_eq!(sanitize_relation("binds to").as_str(), "BINDS_TO");
        assert_eq!(sanitize_relation("is-a").as_str(), "IS_A");
        assert_eq!(sanitize_relation("inhibits").as_str(), "INHIBITS");
    }

    #[test]
    fn test_relation_defaults() {
        assert_eq!(sanitize_relation("").as_str(), "RELATED_TO");
        assert_eq!(sanitize_relation(None).as_str(), "RELATED_TO");
        assert_eq!(sanitize_relation("???").as_str(), "ENTITY");
    }

    #[test]
    fn test_outputs_are_safe_identifiers() {
        let inputs = ["", "a b c", "--x--", "9 lives", "ünïcödé", "x;y:z", "\n\t"];
        for input in inputs {
            assert!(is_safe(&sanitize_label(input)), "label for {input:?}");
            assert!(is_safe(&sanitize_relation(input)), "relation for {input:?}");
        }
    }

    #[test]
    fn test_quoted_for_cypher() {
        assert_eq!(sanitize_label("9 lives").quoted(), "`9Lives`");
    }
}
