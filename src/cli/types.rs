//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "project-assist")]
#[command(about = "Project Assist - conversational helper for Planner tasks and mail", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Load configuration from this file instead of .project-assist/
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Bearer token for the planner and mail API
    #[arg(
        long,
        global = true,
        env = "PROJECT_ASSIST_GRAPH_TOKEN",
        hide_env_values = true
    )]
    pub token: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive conversation
    Chat,

    /// Ask a single question and print the response
    Ask {
        /// Message to send
        message: String,
    },

    /// Task commands that bypass the assistant
    #[command(subcommand)]
    Tasks(TasksCommands),

    /// Mail commands
    #[command(subcommand)]
    Mail(MailCommands),
}

#[derive(Subcommand)]
pub enum TasksCommands {
    /// List tasks
    List {
        /// Read another user's tasks instead of your own
        #[arg(short, long)]
        email: Option<String>,
    },

    /// List tasks with an exact priority (0-10, lower = more urgent)
    Priority {
        priority: i32,

        #[arg(short, long)]
        email: Option<String>,
    },

    /// List tasks by progress (not-started, in-progress, completed, incomplete)
    Progress {
        status: String,

        #[arg(short, long)]
        email: Option<String>,
    },

    /// List incomplete tasks past their due date
    Overdue {
        #[arg(short, long)]
        email: Option<String>,
    },

    /// List tasks that belong to a plan
    Plan {
        /// Plan name, matched case-insensitively as a substring
        name: String,

        #[arg(short, long)]
        email: Option<String>,
    },

    /// Create a task in the first bucket of a plan
    Create {
        /// Plan name, matched case-insensitively as a substring
        #[arg(short, long)]
        plan: String,

        /// Task title
        #[arg(short, long)]
        title: String,
    },
}

#[derive(Subcommand)]
pub enum MailCommands {
    /// Send an HTML mail
    Send {
        /// Recipient address
        #[arg(long)]
        to: String,

        #[arg(short, long)]
        subject: String,

        /// HTML body
        #[arg(short, long)]
        body: String,
    },
}
