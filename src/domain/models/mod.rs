pub mod config;
pub mod conversation;
pub mod credential;
pub mod planner;
pub mod response;
pub mod task;

pub use config::{
    ChatProvider, Config, ConversationConfig, GenerationConfig, GraphConfig, LoggingConfig,
    MailConfig,
};
pub use conversation::{ChatTurn, ConversationHistory, Role};
pub use credential::{AccessToken, TurnContext};
pub use planner::{
    DirectoryUser, OutgoingMail, RawAssignment, RawBucket, RawPlan, RawPlannerTask,
    RawTaskDetails,
};
pub use response::{ADAPTIVE_CARD_CONTENT_TYPE, ContentType, StructuredResponse};
pub use task::{
    AnnotatedTask, Assignment, Bucket, NewTask, Plan, PriorityLabel, ProgressFilter,
    ProgressLabel, TaskRecord, TaskScope,
};
