//! Generation backend port.
//!
//! A backend turns instructions plus conversation history into assistant
//! text. While generating it may call back into the operations exposed for
//! the current turn.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::domain::errors::DomainResult;
use crate::domain::models::ChatTurn;

/// Description of an invocable operation, published to the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// JSON schema of the argument object.
    pub parameters: Value,
}

/// Operations available to the backend during one turn.
#[async_trait]
pub trait OperationInvoker: Send + Sync {
    /// Catalog of operations, in a stable order.
    fn operations(&self) -> Vec<OperationSpec>;

    /// Invoke an operation by name with a JSON argument object.
    ///
    /// Failures come back as `DomainError::OperationFailed` and are meant
    /// to be reported to the model, not to end the turn.
    async fn invoke(&self, name: &str, arguments: Value) -> DomainResult<Value>;
}

/// A text-generation backend with function calling.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Short identifier for logs.
    fn backend_id(&self) -> &'static str;

    /// Run one generation and return the assistant text fragments in order.
    ///
    /// Transport and backend errors are terminal for the turn.
    async fn generate(
        &self,
        instructions: &str,
        history: &[ChatTurn],
        operations: &dyn OperationInvoker,
    ) -> DomainResult<Vec<String>>;
}
