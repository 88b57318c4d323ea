use std::fmt;

use thiserror::Error;

use crate::model::{ApprovalId, Status};
use crate::store::StoreError;

/// The record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Task,
    Approval,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Entity::Task => f.write_str("Task"),
            Entity::Approval => f.write_str("Approval record"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),
    #[error("At least one approver is required")]
    NoApprovers,
    #[error("Approver at position {0} is empty")]
    BlankApprover(usize),
    #[error("Approver '{0}' is listed more than once")]
    DuplicateApprover(String),
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },
    #[error("Approval {id} already processed ({status})")]
    Conflict { id: ApprovalId, status: Status },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Coarse classification, for callers that only need to tell errors apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound(Entity),
    Conflict,
    Store,
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::Validation(_) => ErrorKind::Validation,
            WorkflowError::NotFound { entity, .. } => ErrorKind::NotFound(*entity),
            WorkflowError::Conflict { .. } => ErrorKind::Conflict,
            WorkflowError::Store(_) => ErrorKind::Store,
        }
    }

    pub(crate) fn task_not_found(id: impl fmt::Display) -> Self {
        WorkflowError::NotFound {
            entity: Entity::Task,
            id: id.to_string(),
        }
    }

    pub(crate) fn approval_not_found(id: impl fmt::Display) -> Self {
        WorkflowError::NotFound {
            entity: Entity::Approval,
            id: id.to_string(),
        }
    }
}
