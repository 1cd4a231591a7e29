//! Port trait definitions (Hexagonal Architecture)
//!
//! - PlannerApi / MailApi: remote task and mail system
//! - GenerationBackend: chat model with function calling
//! - OperationInvoker: operations a backend may call during a turn

pub mod generation;
pub mod planner;

pub use generation::{GenerationBackend, OperationInvoker, OperationSpec};
pub use planner::{MailApi, PlannerApi};
