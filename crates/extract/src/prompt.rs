pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"Extract biomedical/scientific entities and relations from the user's text.

Output ONLY a strict JSON object, no markdown, no explanations:
{
  "entities": [
    {"name": "EntityName", "type": "entity type, e.g. Gene, Protein, Disease, Chemical, Method"}
  ],
  "relations": [
    {"subject": "EntityName", "subject_type": "type", "predicate": "verb phrase, e.g. inhibits, binds to", "object": "EntityName", "object_type": "type"}
  ]
}

RULES:
- Every relation subject and object must also appear in "entities"
- Use names exactly as they appear in the text
- If nothing is found, return {"entities": [], "relations": []}"#;

