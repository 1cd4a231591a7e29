pub mod action_dispatcher;
pub mod orchestrator;
pub mod response_contract;
pub mod task_store;

pub use action_dispatcher::{ActionDispatcher, CreateTaskArgs, NotificationArgs, TurnOperations};
pub use orchestrator::{AGENT_INSTRUCTIONS, ConversationOrchestrator, FALLBACK_MESSAGE};
pub use response_contract::{ContractError, ResponseContractValidator, correction_prompt};
pub use task_store::TaskStore;
