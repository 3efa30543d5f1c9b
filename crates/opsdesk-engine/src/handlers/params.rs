//! Typed operation parameters
//!
//! Each operation's `data` object is decoded into a parameter struct with
//! serde, then checked against the field limits the console enforces. Any
//! failure becomes the operation's domain error message.

use opsdesk_core::errors::{ExError, OpsError};
use opsdesk_core::model::{
    user::DEFAULT_ROLE, AuditLogFilter, NewSystemConfig, NewUser, PageRequest, SortOrder,
    SystemConfigFilter, SystemConfigPatch, UserFilter, UserPatch, UserSortKey,
    DEFAULT_LIST_LIMIT,
};
use opsdesk_core::model::timestamp::parse_iso_millis;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::OnceLock;

pub const USERNAME_MAX: usize = 100;
pub const EMAIL_MAX: usize = 255;
pub const ROLE_MAX: usize = 50;
pub const CONFIG_KEY_MAX: usize = 100;
pub const DEFAULT_DAYS_TO_KEEP: u32 = 30;

/// Payload shorthand used by every handler
pub type Data<'a> = Option<&'a Map<String, Value>>;

/// Decode `data` (absent reads as `{}`) into `T`, or fail with `err`
pub fn decode<T: DeserializeOwned>(data: Data<'_>, err: OpsError) -> Result<T, ExError> {
    let object = Value::Object(data.cloned().unwrap_or_default());
    serde_json::from_value(object).map_err(|_| err.into())
}

/// Row id from `data.id`: a positive integer or a string holding one
pub fn parse_id(data: Data<'_>) -> Option<i64> {
    match data?.get("id")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .filter(|id| *id > 0)
}

/// Row id, or the supplied domain error
pub fn require_id(data: Data<'_>, err: OpsError) -> Result<i64, ExError> {
    parse_id(data).ok_or_else(|| err.into())
}

/// Non-empty string field, or the supplied domain error
pub fn require_str<'a>(data: Data<'a>, field: &str, err: OpsError) -> Result<&'a str, ExError> {
    data.and_then(|d| d.get(field))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| err.into())
}

fn default_limit() -> i64 {
    i64::from(DEFAULT_LIST_LIMIT)
}

fn page(limit: i64, offset: i64) -> Option<PageRequest> {
    let limit = u32::try_from(limit).ok()?;
    let offset = u64::try_from(offset).ok()?;
    PageRequest::new(limit, offset)
}

fn list_error() -> OpsError {
    OpsError::invalid_data("parameters for list operation")
}

fn char_len_within(value: &str, min: usize, max: usize) -> bool {
    let len = value.chars().count();
    len >= min && len <= max
}

fn email_pattern() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| {
            Regex::new(r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
                .ok()
        })
        .as_ref()
}

/// Address shape accepted for user email
pub fn is_valid_email(email: &str) -> bool {
    !email.starts_with('.')
        && !email.contains("..")
        && email_pattern().is_some_and(|re| re.is_match(email))
}

fn valid_email_field(email: &str) -> bool {
    char_len_within(email, 1, EMAIL_MAX) && is_valid_email(email)
}

// ---------- users ----------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUserList {
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
    #[serde(default)]
    sort_by: UserSortKey,
    #[serde(default)]
    sort_order: SortOrder,
    role: Option<String>,
    is_active: Option<bool>,
}

/// Parameters for `users.list`
#[derive(Debug, Clone, PartialEq)]
pub struct UserListParams {
    pub page: PageRequest,
    pub sort_by: UserSortKey,
    pub sort_order: SortOrder,
    pub filter: UserFilter,
}

impl UserListParams {
    pub fn parse(data: Data<'_>) -> Result<Self, ExError> {
        let raw: RawUserList = decode(data, list_error())?;
        Ok(Self {
            page: page(raw.limit, raw.offset).ok_or_else(|| ExError::from(list_error()))?,
            sort_by: raw.sort_by,
            sort_order: raw.sort_order,
            filter: UserFilter {
                role: raw.role,
                is_active: raw.is_active,
            },
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUserCount {
    role: Option<String>,
    is_active: Option<bool>,
}

/// Filter for `users.count`; malformed filters fail like a bad list
pub fn user_count_filter(data: Data<'_>) -> Result<UserFilter, ExError> {
    let raw: RawUserCount = decode(data, list_error())?;
    Ok(UserFilter {
        role: raw.role,
        is_active: raw.is_active,
    })
}

#[derive(Debug, Deserialize)]
struct RawUserCreate {
    username: String,
    email: String,
    role: Option<String>,
}

/// Validated `users.create` payload
pub fn new_user(data: Data<'_>) -> Result<NewUser, ExError> {
    let err = || OpsError::invalid_data("user data");
    let raw: RawUserCreate = decode(data, err())?;
    let role = raw.role.unwrap_or_else(|| DEFAULT_ROLE.to_string());

    let valid = char_len_within(&raw.username, 1, USERNAME_MAX)
        && valid_email_field(&raw.email)
        && char_len_within(&role, 0, ROLE_MAX);
    if !valid {
        return Err(err().into());
    }
    Ok(NewUser {
        username: raw.username,
        email: raw.email,
        role,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUserUpdate {
    username: Option<String>,
    email: Option<String>,
    role: Option<String>,
    is_active: Option<bool>,
}

/// Validated `users.update` payload: row id plus the patch
pub fn user_patch(data: Data<'_>) -> Result<(i64, UserPatch), ExError> {
    let err = || OpsError::invalid_data("user data for update");
    let id = require_id(data, err())?;
    let raw: RawUserUpdate = decode(data, err())?;

    let valid = raw
        .username
        .as_deref()
        .map_or(true, |u| char_len_within(u, 1, USERNAME_MAX))
        && raw.email.as_deref().map_or(true, valid_email_field)
        && raw
            .role
            .as_deref()
            .map_or(true, |r| char_len_within(r, 0, ROLE_MAX));
    if !valid {
        return Err(err().into());
    }
    Ok((
        id,
        UserPatch {
            username: raw.username,
            email: raw.email,
            role: raw.role,
            is_active: raw.is_active,
        },
    ))
}

// ---------- system_config ----------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfigList {
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
    is_active: Option<bool>,
}

/// Parameters for `system_config.list`
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigListParams {
    pub page: PageRequest,
    pub filter: SystemConfigFilter,
}

impl ConfigListParams {
    pub fn parse(data: Data<'_>) -> Result<Self, ExError> {
        let raw: RawConfigList = decode(data, list_error())?;
        Ok(Self {
            page: page(raw.limit, raw.offset).ok_or_else(|| ExError::from(list_error()))?,
            filter: SystemConfigFilter {
                is_active: raw.is_active,
            },
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfigCreate {
    config_key: String,
    config_value: Value,
    description: Option<String>,
}

/// Validated `system_config.create` payload
pub fn new_config(data: Data<'_>) -> Result<NewSystemConfig, ExError> {
    let err = || OpsError::invalid_data("config data");
    let raw: RawConfigCreate = decode(data, err())?;
    if !char_len_within(&raw.config_key, 1, CONFIG_KEY_MAX) {
        return Err(err().into());
    }
    Ok(NewSystemConfig {
        config_key: raw.config_key,
        config_value: raw.config_value,
        description: raw.description,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfigUpdate {
    #[serde(default, deserialize_with = "present")]
    config_value: Option<Value>,
    description: Option<String>,
    is_active: Option<bool>,
}

/// Treats an explicit `null` as a value to store rather than as absent
fn present<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// Validated `system_config.update` payload: row id plus the patch
pub fn config_patch(data: Data<'_>) -> Result<(i64, SystemConfigPatch), ExError> {
    let err = || OpsError::invalid_data("config data for update");
    let id = require_id(data, err())?;
    let raw: RawConfigUpdate = decode(data, err())?;
    Ok((
        id,
        SystemConfigPatch {
            config_value: raw.config_value,
            description: raw.description,
            is_active: raw.is_active,
        },
    ))
}

// ---------- audit_logs ----------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAuditFilter {
    entity: Option<String>,
    action: Option<String>,
    user_id: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

impl RawAuditFilter {
    fn into_filter(self) -> Option<AuditLogFilter> {
        let bound = |raw: Option<String>| match raw.filter(|s| !s.is_empty()) {
            Some(s) => parse_iso_millis(&s).map(Some),
            None => Some(None),
        };
        let non_empty = |s: Option<String>| s.filter(|v| !v.is_empty());
        Some(AuditLogFilter {
            start: bound(self.start_date)?,
            end: bound(self.end_date)?,
            entity: non_empty(self.entity),
            action: non_empty(self.action),
            user_id: non_empty(self.user_id),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawAuditList {
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
    #[serde(flatten)]
    filter: RawAuditFilter,
}

/// Parameters for `audit_logs.list`
#[derive(Debug, Clone, PartialEq)]
pub struct AuditListParams {
    pub page: PageRequest,
    pub filter: AuditLogFilter,
}

impl AuditListParams {
    pub fn parse(data: Data<'_>) -> Result<Self, ExError> {
        let raw: RawAuditList = decode(data, list_error())?;
        let page = page(raw.limit, raw.offset);
        match (page, raw.filter.into_filter()) {
            (Some(page), Some(filter)) => Ok(Self { page, filter }),
            _ => Err(list_error().into()),
        }
    }
}

/// Filter for `audit_logs.count`
pub fn audit_count_filter(data: Data<'_>) -> Result<AuditLogFilter, ExError> {
    let raw: RawAuditFilter = decode(data, list_error())?;
    raw.into_filter().ok_or_else(|| list_error().into())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCleanup {
    days_to_keep: Option<i64>,
}

/// Retention window for `audit_logs.cleanup`; only an absent value defaults
pub fn days_to_keep(data: Data<'_>) -> Result<u32, ExError> {
    let err = || OpsError::invalid_data("parameters for cleanup operation");
    let raw: RawCleanup = decode(data, err())?;
    match raw.days_to_keep {
        None => Ok(DEFAULT_DAYS_TO_KEEP),
        Some(days) => u32::try_from(days).map_err(|_| err().into()),
    }
}
