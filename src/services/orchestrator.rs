//! Conversation turn orchestration.
//!
//! A turn appends the user's input, asks the backend for a reply and checks
//! the reply against the response contract. Rejected replies stay in the
//! history and are followed by a correction turn until the retry bound is
//! exhausted.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ConversationConfig, ConversationHistory, StructuredResponse, TurnContext};
use crate::domain::ports::{GenerationBackend, MailApi, PlannerApi};
use crate::services::action_dispatcher::ActionDispatcher;
use crate::services::response_contract::{ContractError, ResponseContractValidator, correction_prompt};

/// Text returned by [`ConversationOrchestrator::respond`] when a turn fails.
pub const FALLBACK_MESSAGE: &str = "Sorry, I couldn't help right now.";

/// System instructions sent with every generation.
pub const AGENT_INSTRUCTIONS: &str = r#"You are a project assistant for Microsoft Planner and Outlook.
You can list, filter and create planner tasks and send email notifications by calling the available functions.
Task priority runs from 0 to 10 where lower is more urgent: 0-1 Urgent, 2-4 Important, 5-7 Medium, 8-10 Low.
Progress is Not started at 0%, In Progress between 1% and 99%, Completed at 100%.
When a function returns an error, explain the problem to the user instead of retrying blindly.

Always answer with a single JSON object and nothing else, in exactly this shape:
{"contentType": "Text" | "AdaptiveCard", "content": "<string>"}
Use "Text" for plain answers. Use "AdaptiveCard" when showing several tasks; the content is then an Adaptive Card 1.5 serialized as a JSON string.
Do not add other fields and do not wrap the object in markdown."#;

/// Where a turn currently stands.
#[derive(Debug)]
enum TurnState {
    AwaitingGeneration,
    Validating(String),
    Retrying(ContractError),
    Done(StructuredResponse),
    Failed(DomainError),
}

/// Drives one conversation turn at a time.
pub struct ConversationOrchestrator<B: GenerationBackend, P: PlannerApi, M: MailApi> {
    backend: Arc<B>,
    dispatcher: Arc<ActionDispatcher<P, M>>,
    max_contract_retries: u32,
    instructions: String,
}

impl<B: GenerationBackend, P: PlannerApi, M: MailApi> ConversationOrchestrator<B, P, M> {
    pub fn new(
        backend: Arc<B>,
        dispatcher: Arc<ActionDispatcher<P, M>>,
        config: &ConversationConfig,
    ) -> Self {
        Self {
            backend,
            dispatcher,
            max_contract_retries: config.max_contract_retries,
            instructions: AGENT_INSTRUCTIONS.to_string(),
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn max_contract_retries(&self) -> u32 {
        self.max_contract_retries
    }

    /// Run one turn and return the validated response.
    ///
    /// Every generated fragment and every correction prompt is appended to
    /// `history`, including those of rejected attempts. With a bound of N a
    /// backend that never complies is called N + 1 times before the turn
    /// fails with `ContractViolation`. Backend errors end the turn at once.
    #[instrument(
        skip_all,
        fields(conversation_id = %ctx.conversation_id, backend = self.backend.backend_id())
    )]
    pub async fn run_turn(
        &self,
        history: &mut ConversationHistory,
        input: &str,
        ctx: TurnContext,
    ) -> DomainResult<StructuredResponse> {
        history.push_user(input);
        let operations = self.dispatcher.for_turn(ctx);

        let mut retries: u32 = 0;
        let mut state = TurnState::AwaitingGeneration;
        loop {
            state = match state {
                TurnState::AwaitingGeneration => {
                    match self
                        .backend
                        .generate(&self.instructions, history.turns(), &operations)
                        .await
                    {
                        Ok(fragments) => {
                            let mut raw = String::new();
                            for fragment in fragments {
                                raw.push_str(&fragment);
                                history.push_assistant(fragment);
                            }
                            TurnState::Validating(raw)
                        }
                        Err(e) => TurnState::Failed(e),
                    }
                }
                TurnState::Validating(raw) => match ResponseContractValidator::validate(&raw) {
                    Ok(response) => TurnState::Done(response),
                    Err(e) => TurnState::Retrying(e),
                },
                TurnState::Retrying(error) => {
                    retries += 1;
                    if retries > self.max_contract_retries {
                        TurnState::Failed(DomainError::ContractViolation {
                            attempts: retries,
                            last_error: error.to_string(),
                        })
                    } else {
                        warn!(retry = retries, error = %error, "response rejected, requesting correction");
                        history.push_user(correction_prompt(&error));
                        TurnState::AwaitingGeneration
                    }
                }
                TurnState::Done(response) => {
                    info!(content_type = %response.content_type, retries, "turn completed");
                    return Ok(response);
                }
                TurnState::Failed(error) => {
                    warn!(error = %error, retries, "turn failed");
                    return Err(error);
                }
            };
        }
    }

    /// Run one turn, replacing any failure with a plain-text fallback.
    pub async fn respond(
        &self,
        history: &mut ConversationHistory,
        input: &str,
        ctx: TurnContext,
    ) -> StructuredResponse {
        match self.run_turn(history, input, ctx).await {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "turn failed, answering with fallback");
                StructuredResponse::text(FALLBACK_MESSAGE)
            }
        }
    }
}
