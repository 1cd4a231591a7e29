//! Project Assist CLI entry point.

use clap::Parser;

use project_assist::cli::commands::{chat, mail, tasks};
use project_assist::cli::{handle_error, AppContext, Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match AppContext::bootstrap(&cli) {
        Ok(ctx) => match cli.command {
            Commands::Chat => chat::execute_chat(&ctx, cli.json).await,
            Commands::Ask { ref message } => chat::execute_ask(&ctx, message, cli.json).await,
            Commands::Tasks(command) => tasks::execute(command, &ctx, cli.json).await,
            Commands::Mail(command) => mail::execute(command, &ctx, cli.json).await,
        },
        Err(err) => Err(err),
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
