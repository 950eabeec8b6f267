use once_cell::sync::Lazy;
use serde_json::Value;

const IR_SCHEMA_SOURCE: &str = include_str!("../../resources/ir_schema.json");

static IR_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(IR_SCHEMA_SOURCE).unwrap_or_else(|e| {
        tracing::error!("Embedded IR schema is not valid JSON: {}", e);
        Value::Object(Default::default())
    })
});

/// Canonical JSON Schema of a generated test design document.
pub fn ir_schema() -> &'static Value {
    &IR_SCHEMA
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_loaded_once() {
        let first = ir_schema();
        let second = ir_schema();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first["type"], "object");
        assert_eq!(
            first["properties"]["rows"]["items"]["properties"]["Priority"]["enum"],
            serde_json::json!(["High", "Medium", "Low"])
        );
    }

    #[test]
    fn test_tag_description_names_every_test_type() {
        let description = ir_schema()["properties"]["rows"]["items"]["properties"]["Tag"]
            ["description"]
            .as_str()
            .unwrap();
        for test_type in ["normal", "semi-normal", "abnormal"] {
            assert!(
                description
                    .split(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
                    .any(|word| word == test_type),
                "missing {test_type}"
            );
        }
    }
}
