use opsdesk_core_types::RequestId;
use thiserror::Error;

/// Result type alias using the canonical ExError
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, testing, and log correlation. Kinds fall into two groups:
/// domain kinds, which handlers turn into ordinary failure results, and
/// infrastructure kinds, which propagate to the dispatcher's catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Request shape / routing
    InvalidRequest,
    UnknownEntity,

    // Domain
    InvalidInput,
    NotFound,
    AlreadyExists,
    UnsupportedOperation,

    // Auth
    Unauthorised,

    // Infrastructure
    Persistence,
    Serialization,
    Concurrency,
    Config,
    Io,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidRequest => "ERR_INVALID_REQUEST",
            ExErrorKind::UnknownEntity => "ERR_UNKNOWN_ENTITY",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::UnsupportedOperation => "ERR_UNSUPPORTED_OPERATION",
            ExErrorKind::Unauthorised => "ERR_UNAUTHORISED",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Concurrency => "ERR_CONCURRENCY",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether this kind is a recoverable, handler-level business failure
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            ExErrorKind::InvalidInput
                | ExErrorKind::NotFound
                | ExErrorKind::AlreadyExists
                | ExErrorKind::UnsupportedOperation
        )
    }
}

/// Canonical structured error type
///
/// Carries classification fields for programmatic handling and context
/// (operation, entity, row id, request id) for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity: Option<String>,
    entity_id: Option<String>,
    request_id: Option<RequestId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity: None,
            entity_id: None,
            request_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity (resource type) context
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Add row id context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Whether the error is a domain failure rather than a fault
    pub fn is_domain(&self) -> bool {
        self.kind.is_domain()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Text shown to API callers: the message, or the code when no message was set
    pub fn user_message(&self) -> &str {
        if self.message.is_empty() {
            self.code()
        } else {
            &self.message
        }
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity) = &self.entity {
            write!(f, " (entity: {})", entity)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for command handling
///
/// The `Display` text of each variant is exactly what API callers see in the
/// `error` field of a failure response.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OpsError {
    /// A required identifier or key was absent
    #[error("{what} is required")]
    Required { what: String },

    /// A delete was issued without the row identifier
    #[error("{what} is required for deletion")]
    RequiredForDeletion { what: String },

    /// No row matched the supplied identifier
    #[error("{what} not found")]
    NotFound { what: String },

    /// Operation payload failed its parameter schema
    #[error("Invalid {what}")]
    InvalidData { what: String },

    /// Store reported a uniqueness violation
    #[error("{what} already exists")]
    AlreadyExists { what: String },

    /// Handler does not implement the requested operation
    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation { operation: String },

    /// Registry has no handler for the entity
    #[error("Unknown entity: {entity}")]
    UnknownEntity { entity: String },

    /// Admin key missing or wrong
    #[error("Unauthorized: Invalid or missing admin key")]
    Unauthorized,

    /// Request body failed the command schema
    #[error("Invalid request format")]
    InvalidRequestFormat,

    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl OpsError {
    pub fn required(what: impl Into<String>) -> Self {
        OpsError::Required { what: what.into() }
    }

    pub fn required_for_deletion(what: impl Into<String>) -> Self {
        OpsError::RequiredForDeletion { what: what.into() }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        OpsError::NotFound { what: what.into() }
    }

    pub fn invalid_data(what: impl Into<String>) -> Self {
        OpsError::InvalidData { what: what.into() }
    }

    pub fn already_exists(what: impl Into<String>) -> Self {
        OpsError::AlreadyExists { what: what.into() }
    }

    pub fn unsupported(operation: impl Into<String>) -> Self {
        OpsError::UnsupportedOperation {
            operation: operation.into(),
        }
    }
}

/// Conversion from OpsError to ExError
///
/// The domain message is preserved verbatim as the ExError message so that
/// `ExError::user_message()` returns the caller-facing text.
impl From<OpsError> for ExError {
    fn from(err: OpsError) -> Self {
        let message = err.to_string();
        match err {
            OpsError::Required { .. }
            | OpsError::RequiredForDeletion { .. }
            | OpsError::InvalidData { .. } => ExError::new(ExErrorKind::InvalidInput),
            OpsError::NotFound { .. } => ExError::new(ExErrorKind::NotFound),
            OpsError::AlreadyExists { .. } => ExError::new(ExErrorKind::AlreadyExists),
            OpsError::UnsupportedOperation { operation } => {
                ExError::new(ExErrorKind::UnsupportedOperation).with_op(operation)
            }
            OpsError::UnknownEntity { entity } => {
                ExError::new(ExErrorKind::UnknownEntity).with_entity(entity)
            }
            OpsError::Unauthorized => ExError::new(ExErrorKind::Unauthorised),
            OpsError::InvalidRequestFormat => ExError::new(ExErrorKind::InvalidRequest),
            OpsError::Serialization { .. } => ExError::new(ExErrorKind::Serialization),
            OpsError::Internal { .. } => ExError::new(ExErrorKind::Internal),
        }
        .with_message(message)
    }
}

/// Conversion from serde_json::Error to OpsError
impl From<serde_json::Error> for OpsError {
    fn from(err: serde_json::Error) -> Self {
        OpsError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Conversion from serde_json::Error to ExError
impl From<serde_json::Error> for ExError {
    fn from(err: serde_json::Error) -> Self {
        OpsError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_kinds() {
        assert!(ExErrorKind::NotFound.is_domain());
        assert!(ExErrorKind::AlreadyExists.is_domain());
        assert!(ExErrorKind::InvalidInput.is_domain());
        assert!(ExErrorKind::UnsupportedOperation.is_domain());
        assert!(!ExErrorKind::Persistence.is_domain());
        assert!(!ExErrorKind::Internal.is_domain());
        assert!(!ExErrorKind::Unauthorised.is_domain());
    }

    #[test]
    fn test_user_message_falls_back_to_code() {
        let err = ExError::new(ExErrorKind::Concurrency);
        assert_eq!(err.user_message(), "ERR_CONCURRENCY");

        let err = err.with_message("store lock poisoned");
        assert_eq!(err.user_message(), "store lock poisoned");
    }

    #[test]
    fn test_display_includes_context() {
        let err = ExError::new(ExErrorKind::NotFound)
            .with_op("get")
            .with_entity("users")
            .with_entity_id("7")
            .with_message("User not found");
        let text = err.to_string();
        assert!(text.starts_with("[ERR_NOT_FOUND]"));
        assert!(text.contains("'get'"));
        assert!(text.contains("(entity: users)"));
        assert!(text.contains("(entity_id: 7)"));
    }
}
