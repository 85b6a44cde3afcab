//! Failure taxonomy surfaced by entity commands.

use crate::repo::RepoError;
use thiserror::Error;

pub type EntityResult<T> = Result<T, EntityError>;

/// Typed command failure handed to the boundary layer.
#[derive(Debug, Error)]
pub enum EntityError {
    /// Storage rejected the entity on a uniqueness constraint.
    #[error("duplicate {entity_type} entity")]
    DuplicateEntity { entity_type: String },
    #[error("{entity_type} not found: {guid}")]
    EntityNotFound { entity_type: String, guid: String },
    #[error("unknown entity type `{0}`")]
    UnknownEntityType(String),
    #[error("unknown attribute type `{attribute_type}` for entity type `{entity_type}`")]
    UnknownAttributeType {
        entity_type: String,
        attribute_type: String,
    },
    /// Catch-all for anything not classified above.
    #[error("failed to {operation}: {source}")]
    CommandExecution {
        operation: String,
        #[source]
        source: RepoError,
    },
}

impl EntityError {
    pub fn command(operation: impl Into<String>, source: RepoError) -> Self {
        Self::CommandExecution {
            operation: operation.into(),
            source,
        }
    }

    /// Stable short code for logs and boundary mapping.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateEntity { .. } => "duplicate_entity",
            Self::EntityNotFound { .. } => "entity_not_found",
            Self::UnknownEntityType(_) => "unknown_entity_type",
            Self::UnknownAttributeType { .. } => "unknown_attribute_type",
            Self::CommandExecution { .. } => "command_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EntityError;
    use crate::repo::RepoError;
    use std::error::Error;

    #[test]
    fn command_failure_keeps_operation_and_cause() {
        let err = EntityError::command("create item", RepoError::Backend("disk full".to_string()));
        assert_eq!(err.to_string(), "failed to create item: disk full");
        assert_eq!(err.code(), "command_failed");
        assert_eq!(err.source().unwrap().to_string(), "disk full");
    }
}
