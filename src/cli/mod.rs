//! Command-line interface.
//!
//! [`AppContext`] wires configuration, logging and the live adapters once
//! per process; the command handlers borrow it.

pub mod commands;
pub mod output;
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use console::style;

use crate::adapters::graph::GraphClient;
use crate::adapters::substrates::ChatCompletionsBackend;
use crate::domain::models::{AccessToken, Config, TurnContext};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::{LogConfig, LoggerImpl};
use crate::services::{ActionDispatcher, ConversationOrchestrator};

pub use output::progress::{create_spinner, ProgressBarExt};
pub use types::{Cli, Commands, MailCommands, TasksCommands};

/// Dispatcher backed by the live planner and mail API.
pub type LiveDispatcher = ActionDispatcher<GraphClient, GraphClient>;

/// Orchestrator backed by the live chat-completions backend.
pub type LiveOrchestrator = ConversationOrchestrator<ChatCompletionsBackend, GraphClient, GraphClient>;

/// Process-wide state shared by the command handlers.
pub struct AppContext {
    pub config: Config,
    pub dispatcher: Arc<LiveDispatcher>,
    token: AccessToken,
    _logger: LoggerImpl,
}

impl AppContext {
    /// Load configuration, start logging and build the planner client.
    pub fn bootstrap(cli: &Cli) -> Result<Self> {
        let config = match cli.config {
            Some(ref path) => ConfigLoader::load_from_file(path),
            None => ConfigLoader::load(),
        }
        .context("Failed to load configuration")?;

        let logger = LoggerImpl::init(&LogConfig::from(&config.logging))
            .context("Failed to initialize logging")?;

        let token = cli
            .token
            .as_deref()
            .map(AccessToken::new)
            .filter(|token| !token.is_blank())
            .context("No access token; pass --token or set PROJECT_ASSIST_GRAPH_TOKEN")?;

        let graph = Arc::new(
            GraphClient::new(&config.graph, &config.mail).context("Failed to create planner client")?,
        );
        let dispatcher = Arc::new(ActionDispatcher::new(Arc::clone(&graph), graph));

        Ok(Self {
            config,
            dispatcher,
            token,
            _logger: logger,
        })
    }

    /// Context for a new turn, stamped with the current time.
    pub fn turn_context(&self) -> TurnContext {
        TurnContext::new(self.token.clone(), Utc::now())
    }

    /// Build the conversation orchestrator.
    ///
    /// Only conversational commands need a generation backend, so its
    /// credentials are checked here rather than in [`AppContext::bootstrap`].
    pub fn orchestrator(&self) -> Result<LiveOrchestrator> {
        let backend = ChatCompletionsBackend::new(self.config.generation.clone())
            .context("Failed to create generation backend")?;
        Ok(ConversationOrchestrator::new(
            Arc::new(backend),
            Arc::clone(&self.dispatcher),
            &self.config.conversation,
        ))
    }
}

/// Print an error and exit with status 1.
pub fn handle_error(err: anyhow::Error, json: bool) -> ! {
    if json {
        let chain: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = serde_json::json!({
            "error": err.to_string(),
            "causes": chain,
        });
        eprintln!("{body}");
    } else {
        eprintln!("{} {}", style("Error:").red().bold(), err);
        for cause in err.chain().skip(1) {
            eprintln!("  {} {}", style("caused by:").dim(), cause);
        }
    }
    std::process::exit(1)
}
