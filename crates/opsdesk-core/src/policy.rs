//! Admin-key policy trait and implementations
//!
//! This module defines the `AdminKeyPolicy` trait, which decides whether a
//! given (entity, operation) pair needs the shared admin secret and checks a
//! presented key against it.

use opsdesk_core_types::Sensitive;
use std::collections::BTreeSet;

/// Operations that require the admin key on every entity
pub const ADMIN_OPERATIONS: &[&str] = &["delete", "cleanup"];

/// Entities on which every operation requires the admin key
pub const ADMIN_ENTITIES: &[&str] = &["system_config"];

/// Policy trait for admin-key authorization
///
/// The dispatcher consults the policy after routing and before invoking the
/// handler; discovery uses `requires_admin_key` to publish the requirement
/// map for every supported operation.
pub trait AdminKeyPolicy: Send + Sync {
    /// Whether the operation needs the admin key
    fn requires_admin_key(&self, entity: &str, operation: &str) -> bool;

    /// Check a presented key for the operation
    ///
    /// # Returns
    /// * `true` - the operation is open, or the key matches the secret
    /// * `false` - the key is required and missing, wrong, or no secret is configured
    fn authorize(&self, entity: &str, operation: &str, presented: Option<&Sensitive<String>>)
        -> bool;
}

/// Rule-set policy backed by a configured secret
///
/// An operation requires the key when its name is an admin operation **or**
/// its entity is an admin entity (union semantics). With no secret
/// configured, every admin-required operation is rejected.
///
/// # Example
/// ```
/// use opsdesk_core::policy::{AdminKeyPolicy, StaticAdminKeyPolicy};
/// use opsdesk_core_types::Sensitive;
///
/// let policy = StaticAdminKeyPolicy::with_default_rules(Some(Sensitive::new("k".to_string())));
/// assert!(policy.requires_admin_key("users", "delete"));
/// assert!(policy.requires_admin_key("system_config", "list"));
/// assert!(!policy.requires_admin_key("users", "list"));
///
/// let key = Sensitive::new("k".to_string());
/// assert!(policy.authorize("users", "delete", Some(&key)));
/// assert!(!policy.authorize("users", "delete", None));
/// ```
#[derive(Debug, Clone)]
pub struct StaticAdminKeyPolicy {
    admin_operations: BTreeSet<String>,
    admin_entities: BTreeSet<String>,
    secret: Option<Sensitive<String>>,
}

impl StaticAdminKeyPolicy {
    /// Create a policy with explicit rule sets
    pub fn new<O, E>(operations: O, entities: E, secret: Option<Sensitive<String>>) -> Self
    where
        O: IntoIterator,
        O::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            admin_operations: operations.into_iter().map(Into::into).collect(),
            admin_entities: entities.into_iter().map(Into::into).collect(),
            // An empty secret would let an empty key through.
            secret: secret.filter(|s| !s.expose().is_empty()),
        }
    }

    /// Standard console rules: `delete`, `cleanup`, and all of `system_config`
    pub fn with_default_rules(secret: Option<Sensitive<String>>) -> Self {
        Self::new(
            ADMIN_OPERATIONS.iter().copied(),
            ADMIN_ENTITIES.iter().copied(),
            secret,
        )
    }

    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }
}

impl AdminKeyPolicy for StaticAdminKeyPolicy {
    fn requires_admin_key(&self, entity: &str, operation: &str) -> bool {
        self.admin_operations.contains(operation) || self.admin_entities.contains(entity)
    }

    fn authorize(
        &self,
        entity: &str,
        operation: &str,
        presented: Option<&Sensitive<String>>,
    ) -> bool {
        if !self.requires_admin_key(entity, operation) {
            return true;
        }
        match (&self.secret, presented) {
            (Some(secret), Some(key)) => secret.matches(key.expose()),
            _ => false,
        }
    }
}
