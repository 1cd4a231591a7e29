//! Generation backend implementations.

pub mod mock;
pub mod openai_chat;

pub use mock::{RecordedCall, ScriptStep, ScriptedBackend};
pub use openai_chat::ChatCompletionsBackend;
