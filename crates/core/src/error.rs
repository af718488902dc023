//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (item
/// validation, identifier parsing). Store and transport failures belong to the adapters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. a blank part identifier).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// The bare message without the variant prefix, for user-facing failure lists.
    pub fn message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::InvalidId(msg) => msg.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_prefix() {
        let err = DomainError::validation("Quantity must be greater than 0");
        assert_eq!(err.to_string(), "validation failed: Quantity must be greater than 0");
    }

    #[test]
    fn message_strips_prefix() {
        assert_eq!(DomainError::validation("Part ID is required").message(), "Part ID is required");
        assert_eq!(DomainError::invalid_id("not a uuid").message(), "not a uuid");
    }
}
