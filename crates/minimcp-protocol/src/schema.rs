//! JSON Schema validation for tool arguments.
//!
//! A deliberately small validator covering the subset tool schemas use:
//! type checking, required fields, and per-property validation. Not a full
//! JSON Schema implementation.

use serde_json::Value;
use std::fmt;

/// Error returned when validation fails.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the invalid value (e.g. `arguments.words`).
    pub path: String,
    /// Description of what went wrong.
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validates a JSON value against a JSON Schema.
///
/// Returns all errors found rather than stopping at the first.
pub fn validate(schema: &Value, value: &Value) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    validate_internal(schema, value, "arguments", &mut errors);
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn validate_internal(schema: &Value, value: &Value, path: &str, errors: &mut Vec<ValidationError>) {
    let Some(schema_obj) = schema.as_object() else {
        return; // not an object schema, nothing to check
    };

    if let Some(type_val) = schema_obj.get("type") {
        if let Some(expected) = type_val.as_str() {
            if !type_matches(expected, value) {
                errors.push(ValidationError {
                    path: path.to_owned(),
                    message: format!("expected {expected}, got {}", type_name(value)),
                });
                return;
            }
        }
    }

    if let Some(obj) = value.as_object() {
        if let Some(required) = schema_obj.get("required").and_then(Value::as_array) {
            for field in required.iter().filter_map(Value::as_str) {
                if !obj.contains_key(field) {
                    errors.push(ValidationError {
                        path: format!("{path}.{field}"),
                        message: "required field is missing".to_owned(),
                    });
                }
            }
        }
        if let Some(properties) = schema_obj.get("properties").and_then(Value::as_object) {
            for (name, prop_schema) in properties {
                if let Some(prop_value) = obj.get(name) {
                    validate_internal(prop_schema, prop_value, &format!("{path}.{name}"), errors);
                }
            }
        }
    }
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "integer" => value.as_i64().is_some() || value.as_u64().is_some(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn search_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "words": {"type": "string"},
                "path": {"type": "string"}
            },
            "required": ["words"]
        })
    }

    #[test]
    fn test_valid_arguments() {
        assert!(validate(&search_schema(), &json!({"words": "MCP"})).is_ok());
        assert!(validate(&search_schema(), &json!({"words": "x", "path": "/tmp/c"})).is_ok());
    }

    #[test]
    fn test_missing_required_field() {
        let errors = validate(&search_schema(), &json!({})).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "arguments.words");
    }

    #[test]
    fn test_wrong_property_type() {
        let errors = validate(&search_schema(), &json!({"words": 42})).unwrap_err();
        assert!(errors[0].message.contains("expected string"));
    }

    #[test]
    fn test_non_object_arguments() {
        let errors = validate(&search_schema(), &json!([1, 2])).unwrap_err();
        assert!(errors[0].message.contains("expected object"));
    }
}
