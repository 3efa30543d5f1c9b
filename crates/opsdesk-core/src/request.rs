//! Command request schema
//!
//! Parses a raw JSON body into a [`CommandRequest`], collecting every
//! violation as an itemized [`ValidationIssue`] instead of stopping at the
//! first one.

use opsdesk_core_types::{schema::UNKNOWN, Sensitive, REDACTED};
use serde_json::{Map, Value};

use crate::model::ValidationIssue;

pub const CODE_INVALID_TYPE: &str = "invalid_type";
pub const CODE_TOO_SMALL: &str = "too_small";
pub const CODE_INVALID_JSON: &str = "invalid_json";

const ADMIN_KEY_FIELD: &str = "adminKey";

/// A schema-valid command
#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub entity: String,
    pub operation: String,
    pub data: Option<Map<String, Value>>,
    pub admin_key: Option<Sensitive<String>>,
}

impl CommandRequest {
    pub fn new(entity: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            operation: operation.into(),
            data: None,
            admin_key: None,
        }
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_admin_key(mut self, key: impl Into<String>) -> Self {
        self.admin_key = Some(Sensitive::new(key.into()));
        self
    }

    /// Validate a decoded body
    ///
    /// # Errors
    ///
    /// Returns every schema violation found in the body.
    pub fn parse(body: &Value) -> Result<Self, Vec<ValidationIssue>> {
        let obj = match body {
            Value::Object(obj) => obj,
            other => {
                return Err(vec![ValidationIssue::new(
                    CODE_INVALID_TYPE,
                    &[],
                    format!("Expected object, received {}", json_type(other)),
                )])
            }
        };

        let mut issues = Vec::new();
        let entity = required_string(obj, "entity", &mut issues);
        let operation = required_string(obj, "operation", &mut issues);

        let data = match obj.get("data") {
            None => None,
            Some(Value::Object(map)) => Some(map.clone()),
            Some(other) => {
                issues.push(ValidationIssue::new(
                    CODE_INVALID_TYPE,
                    &["data"],
                    format!("Expected object, received {}", json_type(other)),
                ));
                None
            }
        };

        let admin_key = match obj.get(ADMIN_KEY_FIELD) {
            None => None,
            Some(Value::String(key)) => Some(Sensitive::new(key.clone())),
            Some(other) => {
                issues.push(ValidationIssue::new(
                    CODE_INVALID_TYPE,
                    &[ADMIN_KEY_FIELD],
                    format!("Expected string, received {}", json_type(other)),
                ));
                None
            }
        };

        match (entity, operation) {
            (Some(entity), Some(operation)) if issues.is_empty() => Ok(Self {
                entity,
                operation,
                data,
                admin_key,
            }),
            _ => Err(issues),
        }
    }

    /// Issue list for a body that was not JSON at all
    pub fn invalid_json(reason: &str) -> Vec<ValidationIssue> {
        vec![ValidationIssue::new(
            CODE_INVALID_JSON,
            &[],
            format!("Malformed JSON body: {}", reason),
        )]
    }
}

/// Best-effort entity and operation names from a body that failed validation
///
/// Falls back to `"unknown"` for anything that is not a non-empty string.
pub fn raw_identifiers(body: &Value) -> (String, String) {
    let pick = |field: &str| {
        body.get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string()
    };
    (pick("entity"), pick("operation"))
}

/// Copy of a request body safe to persist: `adminKey` is replaced
pub fn redact_body(body: &Value) -> Value {
    let mut copy = body.clone();
    if let Some(key) = copy.get_mut(ADMIN_KEY_FIELD) {
        *key = Value::String(REDACTED.to_string());
    }
    copy
}

fn required_string(
    obj: &Map<String, Value>,
    field: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    match obj.get(field) {
        None => {
            issues.push(ValidationIssue::new(CODE_INVALID_TYPE, &[field], "Required"));
            None
        }
        Some(Value::String(s)) if s.is_empty() => {
            issues.push(ValidationIssue::new(
                CODE_TOO_SMALL,
                &[field],
                "String must contain at least 1 character(s)",
            ));
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            issues.push(ValidationIssue::new(
                CODE_INVALID_TYPE,
                &[field],
                format!("Expected string, received {}", json_type(other)),
            ));
            None
        }
    }
}

fn json_type(value: &Value) -> &'static str {
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

    #[test]
    fn test_minimal_request_parses() {
        let req = CommandRequest::parse(&json!({"entity": "users", "operation": "count"})).unwrap();
        assert_eq!(req.entity, "users");
        assert_eq!(req.operation, "count");
        assert!(req.data.is_none());
        assert!(req.admin_key.is_none());
    }

    #[test]
    fn test_non_object_body() {
        let issues = CommandRequest::parse(&json!([1, 2])).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "Expected object, received array");
    }

    #[test]
    fn test_null_data_is_rejected() {
        let issues =
            CommandRequest::parse(&json!({"entity": "users", "operation": "list", "data": null}))
                .unwrap_err();
        assert_eq!(issues[0].path, vec!["data".to_string()]);
    }

    #[test]
    fn test_redact_body_only_touches_admin_key() {
        let body = json!({"entity": "users", "adminKey": "hunter2", "data": {"id": 1}});
        let redacted = redact_body(&body);
        assert_eq!(redacted["adminKey"], REDACTED);
        assert_eq!(redacted["data"]["id"], 1);
        assert!(!redacted.to_string().contains("hunter2"));
    }

    #[test]
    fn test_raw_identifiers_fallback() {
        assert_eq!(
            raw_identifiers(&json!({"entity": "users", "operation": ""})),
            ("users".to_string(), UNKNOWN.to_string())
        );
        assert_eq!(
            raw_identifiers(&json!("nope")),
            (UNKNOWN.to_string(), UNKNOWN.to_string())
        );
    }
}
