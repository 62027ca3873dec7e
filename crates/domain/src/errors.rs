//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// Latitude or longitude outside the geographic range
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// Entity not found
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    /// Entity is already a member of the collection
    #[error("{entity_type} already present: {id}")]
    AlreadyPresent { entity_type: String, id: String },

    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// Operation not permitted
    #[error("Operation not permitted: {0}")]
    NotPermitted(String),

    /// A lifecycle transition that the state machine forbids
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },
}

impl DomainError {
    /// Create a not found error
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Create an already present error
    pub fn already_present(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::AlreadyPresent {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}
