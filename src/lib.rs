//! Project Assist - conversational assistant for Planner tasks and mail
//!
//! A user asks about their tasks in natural language. A chat-completions
//! backend answers by calling named planner and mail operations, and every
//! reply is checked against a two-field JSON contract before it is returned.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors and port traits
//! - **Service Layer** (`services`): task views, operation dispatch, the turn loop
//! - **Adapter Layer** (`adapters`): Graph client, chat backends, in-memory planner
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use project_assist::cli::{AppContext, Cli};
//!
//! let ctx = AppContext::bootstrap(&cli)?;
//! let orchestrator = ctx.orchestrator()?;
//! let mut history = ConversationHistory::new();
//! let response = orchestrator.run_turn(&mut history, "what is overdue?", ctx.turn_context()).await?;
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    AnnotatedTask, Config, ContentType, ConversationHistory, PriorityLabel, ProgressLabel,
    StructuredResponse, TaskRecord, TurnContext,
};
pub use domain::ports::{GenerationBackend, MailApi, OperationInvoker, PlannerApi};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{ActionDispatcher, ConversationOrchestrator, ResponseContractValidator, TaskStore};
