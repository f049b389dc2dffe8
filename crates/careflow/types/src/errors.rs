//! Error types for the workflow engine

use crate::EntityId;

/// Errors that can occur in workflow operations
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Invalid transition in {workflow}: cannot move from {from} to {to}")]
    InvalidTransition {
        workflow: String,
        from: String,
        to: String,
    },

    #[error("Transition to {to} requires field: {field}")]
    MissingRequiredField { to: String, field: &'static str },

    #[error("No workflow configuration for status: {0}")]
    UnknownStatus(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Entity {id} belongs to workflow {actual}, expected {expected}")]
    WrongWorkflow {
        id: EntityId,
        expected: String,
        actual: String,
    },
}

/// Result type alias for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;
