use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::timestamp::iso_millis;

/// A named configuration entry with an arbitrary JSON value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfig {
    pub id: i64,
    pub config_key: String,
    pub config_value: Value,
    pub description: Option<String>,
    pub is_active: bool,
    #[serde(with = "iso_millis")]
    pub created_at: i64,
    #[serde(with = "iso_millis")]
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSystemConfig {
    pub config_key: String,
    pub config_value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemConfigFilter {
    pub is_active: Option<bool>,
}
