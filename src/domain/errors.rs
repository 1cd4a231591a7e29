//! Domain errors for the project assistant.

use thiserror::Error;

/// Domain-level errors that can occur while serving a conversation turn.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Operation '{operation}' failed: {cause}")]
    OperationFailed {
        operation: String,
        #[source]
        cause: Box<DomainError>,
    },

    #[error("Response contract violated after {attempts} attempts: {last_error}")]
    ContractViolation { attempts: u32, last_error: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Wrap an error raised inside a named operation.
    ///
    /// Errors that are already `OperationFailed` are passed through so the
    /// innermost operation name is the one reported.
    pub fn operation_failed(operation: impl Into<String>, cause: DomainError) -> Self {
        match cause {
            already @ DomainError::OperationFailed { .. } => already,
            cause => DomainError::OperationFailed {
                operation: operation.into(),
                cause: Box::new(cause),
            },
        }
    }

    /// Whether this error ends the current turn.
    ///
    /// Operation-level failures are fed back into the generation loop;
    /// everything else aborts the turn.
    pub const fn is_terminal(&self) -> bool {
        !matches!(
            self,
            DomainError::OperationFailed { .. }
                | DomainError::NotFound(_)
                | DomainError::InvalidArgument(_)
        )
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_failed_wraps_cause() {
        let err = DomainError::operation_failed(
            "create_task",
            DomainError::NotFound("plan 'Q9'".to_string()),
        );
        match &err {
            DomainError::OperationFailed { operation, cause } => {
                assert_eq!(operation, "create_task");
                assert!(matches!(**cause, DomainError::NotFound(_)));
            }
            other => panic!("expected OperationFailed, got {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "Operation 'create_task' failed: Not found: plan 'Q9'"
        );
    }

    #[test]
    fn test_operation_failed_is_not_nested() {
        let inner = DomainError::operation_failed(
            "get_plan",
            DomainError::Transport("connection reset".to_string()),
        );
        let outer = DomainError::operation_failed("create_task", inner);
        match outer {
            DomainError::OperationFailed { operation, .. } => assert_eq!(operation, "get_plan"),
            other => panic!("expected OperationFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_terminal_classification() {
        assert!(DomainError::ContractViolation {
            attempts: 4,
            last_error: "x".to_string()
        }
        .is_terminal());
        assert!(DomainError::Transport("down".to_string()).is_terminal());
        assert!(!DomainError::InvalidArgument("blank".to_string()).is_terminal());
        assert!(!DomainError::operation_failed(
            "send_notification",
            DomainError::InvalidArgument("blank".to_string())
        )
        .is_terminal());
    }
}
