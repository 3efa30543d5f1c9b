use serde::{Deserialize, Serialize};

use super::timestamp::{iso_millis, iso_millis_opt};

/// Role assigned when a create request omits one
pub const DEFAULT_ROLE: &str = "user";

/// A console user row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    #[serde(with = "iso_millis_opt")]
    pub last_login_at: Option<i64>,
    #[serde(with = "iso_millis")]
    pub created_at: i64,
    #[serde(with = "iso_millis")]
    pub updated_at: i64,
}

/// Validated fields for inserting a user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub role: String,
}

/// Partial update; `None` leaves the column untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.role.is_none()
            && self.is_active.is_none()
    }
}

/// Filters shared by `list` and `count`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// Column a user listing is ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserSortKey {
    #[default]
    #[serde(rename = "id")]
    Id,
    #[serde(rename = "username")]
    Username,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "createdAt")]
    CreatedAt,
}

impl UserSortKey {
    /// SQL column backing this key
    pub fn column(&self) -> &'static str {
        match self {
            UserSortKey::Id => "id",
            UserSortKey::Username => "username",
            UserSortKey::Email => "email",
            UserSortKey::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_serializes_camel_case_iso() {
        let user = User {
            id: 1,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            role: DEFAULT_ROLE.to_string(),
            is_active: true,
            last_login_at: None,
            created_at: 0,
            updated_at: 1_000,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["isActive"], true);
        assert_eq!(json["createdAt"], "1970-01-01T00:00:00.000Z");
        assert_eq!(json["updatedAt"], "1970-01-01T00:00:01.000Z");
        assert!(json["lastLoginAt"].is_null());
    }

    #[test]
    fn test_sort_key_wire_names() {
        let key: UserSortKey = serde_json::from_str("\"createdAt\"").unwrap();
        assert_eq!(key, UserSortKey::CreatedAt);
        assert_eq!(key.column(), "created_at");
        assert!(serde_json::from_str::<UserSortKey>("\"password\"").is_err());
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(UserPatch::default().is_empty());
        let patch = UserPatch {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
