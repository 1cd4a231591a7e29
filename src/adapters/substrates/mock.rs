//! Scripted generation backend for tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::ChatTurn;
use crate::domain::ports::{GenerationBackend, OperationInvoker};

/// One scripted generation.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Emit a single fragment.
    Reply(String),
    /// Emit several fragments in order.
    Fragments(Vec<String>),
    /// Invoke an operation, then emit the given reply.
    ///
    /// The operation's JSON result (or error) is recorded in
    /// [`ScriptedBackend::operation_results`].
    Invoke {
        operation: String,
        arguments: Value,
        reply: String,
    },
    /// Fail the generation with `GenerationFailed`.
    Fail(String),
}

impl ScriptStep {
    pub fn reply(text: impl Into<String>) -> Self {
        Self::Reply(text.into())
    }

    pub fn invoke(operation: impl Into<String>, arguments: Value, reply: impl Into<String>) -> Self {
        Self::Invoke {
            operation: operation.into(),
            arguments,
            reply: reply.into(),
        }
    }
}

/// What the backend saw on one call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub instructions: String,
    pub history: Vec<ChatTurn>,
}

/// Backend that plays back a fixed script.
///
/// Once the script is exhausted the last step repeats, so a single
/// malformed reply models a backend that never recovers.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<ScriptStep>>,
    last: Mutex<Option<ScriptStep>>,
    calls: Mutex<Vec<RecordedCall>>,
    operation_results: Mutex<Vec<Result<Value, String>>>,
}

impl ScriptedBackend {
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            script: Mutex::new(steps.into_iter().collect()),
            ..Self::default()
        }
    }

    /// A backend that always replies with `text`.
    pub fn always(text: impl Into<String>) -> Self {
        Self::new([ScriptStep::reply(text)])
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn operation_results(&self) -> Vec<Result<Value, String>> {
        lock(&self.operation_results).clone()
    }

    fn next_step(&self) -> Option<ScriptStep> {
        let mut last = lock(&self.last);
        match lock(&self.script).pop_front() {
            Some(step) => {
                *last = Some(step.clone());
                Some(step)
            }
            None => last.clone(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    fn backend_id(&self) -> &'static str {
        "scripted"
    }

    async fn generate(
        &self,
        instructions: &str,
        history: &[ChatTurn],
        operations: &dyn OperationInvoker,
    ) -> DomainResult<Vec<String>> {
        lock(&self.calls).push(RecordedCall {
            instructions: instructions.to_string(),
            history: history.to_vec(),
        });

        let step = self
            .next_step()
            .ok_or_else(|| DomainError::GenerationFailed("script is empty".to_string()))?;

        match step {
            ScriptStep::Reply(text) => Ok(vec![text]),
            ScriptStep::Fragments(fragments) => Ok(fragments),
            ScriptStep::Invoke {
                operation,
                arguments,
                reply,
            } => {
                let result = operations
                    .invoke(&operation, arguments)
                    .await
                    .map_err(|e| e.to_string());
                lock(&self.operation_results).push(result);
                Ok(vec![reply])
            }
            ScriptStep::Fail(message) => Err(DomainError::GenerationFailed(message)),
        }
    }
}
