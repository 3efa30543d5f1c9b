//! Sensitive data marker for automatic redaction
//!
//! The `Sensitive<T>` wrapper keeps secrets such as the admin key out of
//! `Debug`/`Display` output, log lines and persisted request payloads.

use std::fmt;

/// Replacement text for redacted values
pub const REDACTED: &str = "***REDACTED***";

/// Wrapper for sensitive data that redacts itself in Debug and Display
///
/// # Example
///
/// ```
/// use opsdesk_core_types::Sensitive;
///
/// let key = Sensitive::new("s3cr3t");
/// assert_eq!(format!("{:?}", key), "***REDACTED***");
/// assert_eq!(key.expose(), &"s3cr3t");
/// ```
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    /// Wrap a sensitive value
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the underlying sensitive value
    ///
    /// Use this method sparingly and only when the sensitive data
    /// must be accessed (e.g., for authentication).
    pub fn expose(&self) -> &T {
        &self.0
    }

    /// Consume the wrapper and return the inner value
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", REDACTED)
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", REDACTED)
    }
}

impl<T: Clone> Clone for Sensitive<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: AsRef<[u8]>> Sensitive<T> {
    /// Compare the wrapped value against a candidate without exposing it
    ///
    /// Equal-length inputs are compared in constant time; only the length
    /// can be learned from timing.
    pub fn matches<C: AsRef<[u8]> + ?Sized>(&self, candidate: &C) -> bool {
        let expected = self.0.as_ref();
        let candidate = candidate.as_ref();
        if expected.len() != candidate.len() {
            return false;
        }
        expected
            .iter()
            .zip(candidate)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}
