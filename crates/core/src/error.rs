//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Which uniqueness or self-protection rule a request collided with.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    UsernameTaken,
    EmailTaken,
    SelfDelete,
}

impl core::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConflictKind::UsernameTaken => f.write_str("username already taken"),
            ConflictKind::EmailTaken => f.write_str("email already taken"),
            ConflictKind::SelfDelete => f.write_str("cannot delete yourself"),
        }
    }
}

/// Domain-level error.
///
/// Keep this focused on deterministic, expected failures (validation,
/// conflicts, authentication and authorization outcomes). Storage failures
/// belong to the infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested record was not found.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Uniqueness or self-protection conflict.
    #[error("conflict: {0}")]
    Conflict(ConflictKind),

    /// Login failed. Deliberately says nothing about which part was wrong.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// No valid, unexpired session accompanied the request.
    #[error("authentication required")]
    Unauthenticated,

    /// Authenticated, but the caller's role does not permit the action.
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(kind: ConflictKind) -> Self {
        Self::Conflict(kind)
    }

    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound(entity)
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_credentials_message_is_generic() {
        let msg = DomainError::InvalidCredentials.to_string();
        assert!(!msg.contains("not found"));
        assert!(!msg.contains("wrong"));
    }

    #[test]
    fn not_found_names_the_entity() {
        assert_eq!(DomainError::not_found("user").to_string(), "user not found");
        assert_eq!(
            DomainError::conflict(ConflictKind::EmailTaken).to_string(),
            "conflict: email already taken"
        );
    }
}
