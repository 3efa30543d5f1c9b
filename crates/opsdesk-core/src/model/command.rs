//! Handler results and the dispatcher's response envelope

use opsdesk_core_types::RequestId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::timestamp::now_iso;

/// Outcome of a single handler invocation
///
/// Exactly one of `data` (on success) or `error` (on failure) is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

impl CommandResult {
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: now_iso(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            timestamp: now_iso(),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// One itemized schema violation reported back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: String,
    pub path: Vec<String>,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(code: impl Into<String>, path: &[&str], message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            path: path.iter().map(|p| p.to_string()).collect(),
            message: message.into(),
        }
    }
}

/// Wire envelope returned by the command endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationIssue>>,
    pub timestamp: String,
    pub request_id: String,
}

impl CommandResponse {
    /// Wrap a handler result, stamping the request id
    pub fn from_result(result: CommandResult, request_id: &RequestId) -> Self {
        Self {
            success: result.success,
            data: result.data,
            error: result.error,
            details: None,
            timestamp: result.timestamp,
            request_id: request_id.to_string(),
        }
    }

    /// Failure raised by the dispatcher itself rather than a handler
    pub fn failure(error: impl Into<String>, request_id: &RequestId) -> Self {
        Self::from_result(CommandResult::failure(error), request_id)
    }

    pub fn with_details(mut self, details: Vec<ValidationIssue>) -> Self {
        self.details = Some(details);
        self
    }
}
