//! Errors surfaced through the message API, and their wire form.
//!
//! Every error becomes an [`ErrorResponse`] with a stable code so that a
//! transport in front of the router can tell validation, not-found and
//! conflict failures apart without parsing messages.

use libsignoff::{Entity, WorkflowError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid message format: {message}")]
    InvalidFormat { message: String },

    #[error("Handler not found for message type: {message_type}")]
    HandlerNotFound { message_type: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: String, code: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message,
            code: code.to_string(),
        }
    }
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        let (error_type, message, code) = match err {
            ApiError::Workflow(wf) => match wf {
                WorkflowError::Validation(_) => ("validation_error", wf.to_string(), "TASK_001"),
                WorkflowError::NotFound {
                    entity: Entity::Task,
                    ..
                } => ("task_not_found", wf.to_string(), "TASK_002"),
                WorkflowError::NotFound {
                    entity: Entity::Approval,
                    ..
                } => ("approval_not_found", wf.to_string(), "TASK_003"),
                WorkflowError::Conflict { .. } => ("approval_conflict", wf.to_string(), "TASK_004"),
                WorkflowError::Store(_) => (
                    "store_error",
                    "Store operation failed".to_string(),
                    "STORE_001",
                ),
            },
            ApiError::Serialization(_) => ("invalid_message", err.to_string(), "MSG_001"),
            ApiError::InvalidFormat { .. } => ("invalid_message", err.to_string(), "MSG_002"),
            ApiError::HandlerNotFound { .. } => {
                ("unsupported_message", err.to_string(), "MSG_003")
            }
            ApiError::Configuration { message } => ("internal_error", message.clone(), "INT_001"),
        };
        ErrorResponse::new(error_type, message, code)
    }
}

impl ApiError {
    pub fn invalid_format(message: impl Into<String>) -> Self {
        ApiError::InvalidFormat {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libsignoff::{StoreError, ValidationError};

    fn code(err: ApiError) -> String {
        ErrorResponse::from(&err).code
    }

    #[test]
    fn test_workflow_error_codes() {
        assert_eq!(
            code(WorkflowError::from(ValidationError::NoApprovers).into()),
            "TASK_001"
        );
        assert_eq!(
            code(
                WorkflowError::NotFound {
                    entity: Entity::Task,
                    id: "1".into()
                }
                .into()
            ),
            "TASK_002"
        );
        assert_eq!(
            code(
                WorkflowError::NotFound {
                    entity: Entity::Approval,
                    id: "1-a".into()
                }
                .into()
            ),
            "TASK_003"
        );
    }

    #[test]
    fn test_store_details_are_not_leaked() {
        let err: ApiError = WorkflowError::from(StoreError::Backend("disk on fire".into())).into();
        let response = ErrorResponse::from(&err);
        assert_eq!(response.code, "STORE_001");
        assert!(!response.message.contains("disk"));
    }

    #[test]
    fn test_message_errors() {
        let response = ErrorResponse::from(&ApiError::HandlerNotFound {
            message_type: "task".to_string(),
        });
        assert_eq!(response.error, "unsupported_message");
        assert_eq!(response.code, "MSG_003");
        assert_eq!(
            response.message,
            "Handler not found for message type: task"
        );
    }
}
