//! Per-provider dialects of the canonical IR schema.

use serde_json::{Map, Value};

const STRICT_UNSUPPORTED: &[&str] = &["$schema"];
const CONSTRAINED_UNSUPPORTED: &[&str] = &[
    "$schema",
    "additionalProperties",
    "title",
    "description",
    "minItems",
];

/// For providers that enforce the schema exactly: only `$schema` goes.
pub fn strict_schema(schema: &Value) -> Value {
    strip_keywords(schema, STRICT_UNSUPPORTED)
}

/// OpenAPI-3 subset accepted by constrained-decoding providers.
pub fn constrained_schema(schema: &Value) -> Value {
    strip_keywords(schema, CONSTRAINED_UNSUPPORTED)
}

fn strip_keywords(value: &Value, keywords: &[&str]) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, child) in map {
                if keywords.contains(&key.as_str()) {
                    continue;
                }
                let child = if key == "properties" {
                    strip_property_map(child, keywords)
                } else {
                    strip_keywords(child, keywords)
                };
                out.insert(key.clone(), child);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| strip_keywords(item, keywords))
                .collect(),
        ),
        other => other.clone(),
    }
}

// Keys of a `properties` map are field names, not keywords; a field called
// `title` or `description` must survive.
fn strip_property_map(value: &Value, keywords: &[&str]) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(name, schema)| (name.clone(), strip_keywords(schema, keywords)))
                .collect(),
        ),
        other => strip_keywords(other, keywords),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "title": "Doc",
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "title": { "type": "string", "description": "a field named title" },
                "rows": {
                    "type": "array",
                    "minItems": 1,
                    "items": { "type": "object", "additionalProperties": false }
                }
            }
        })
    }

    #[test]
    fn test_strict_schema_only_drops_dollar_schema() {
        let strict = strict_schema(&sample());
        assert!(strict.get("$schema").is_none());
        assert_eq!(strict["title"], "Doc");
        assert_eq!(strict["additionalProperties"], false);
        assert_eq!(strict["properties"]["rows"]["minItems"], 1);
    }

    #[test]
    fn test_constrained_schema_drops_unsupported_keywords() {
        let constrained = constrained_schema(&sample());
        assert!(constrained.get("$schema").is_none());
        assert!(constrained.get("title").is_none());
        assert!(constrained.get("additionalProperties").is_none());
        let rows = &constrained["properties"]["rows"];
        assert!(rows.get("minItems").is_none());
        assert!(rows["items"].get("additionalProperties").is_none());
        assert_eq!(rows["items"]["type"], "object");
    }

    #[test]
    fn test_property_named_like_a_keyword_is_kept() {
        let constrained = constrained_schema(&sample());
        let field = &constrained["properties"]["title"];
        assert_eq!(field["type"], "string");
        assert!(field.get("description").is_none());
    }

    #[test]
    fn test_adapters_are_idempotent() {
        let once = constrained_schema(&sample());
        assert_eq!(constrained_schema(&once), once);
        let strict = strict_schema(&sample());
        assert_eq!(strict_schema(&strict), strict);
    }
}
