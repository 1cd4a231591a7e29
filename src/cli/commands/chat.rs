//! Conversational commands: `chat` and `ask`.

use std::io::Write;

use anyhow::{Context, Result};
use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::output::turn_spinner;
use crate::cli::{AppContext, LiveOrchestrator};
use crate::domain::models::{ConversationHistory, StructuredResponse, ADAPTIVE_CARD_CONTENT_TYPE};
use crate::services::FALLBACK_MESSAGE;

const EXIT_WORDS: [&str; 2] = ["exit", "quit"];

/// Answer a single message.
pub async fn execute_ask(ctx: &AppContext, message: &str, json: bool) -> Result<()> {
    let orchestrator = ctx.orchestrator()?;
    let mut history = ConversationHistory::new();
    run_turn(ctx, &orchestrator, &mut history, message, json).await
}

/// Read messages from stdin until EOF or an exit word, keeping history.
pub async fn execute_chat(ctx: &AppContext, json: bool) -> Result<()> {
    let orchestrator = ctx.orchestrator()?;
    let mut history = ConversationHistory::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if !json {
        println!(
            "{} Ask about your tasks. Type {} to leave.",
            style("project-assist").cyan().bold(),
            style("exit").bold()
        );
    }

    loop {
        if !json {
            print!("{} ", style("you>").green().bold());
            std::io::stdout().flush().context("Failed to flush stdout")?;
        }

        let Some(line) = lines.next_line().await.context("Failed to read from stdin")? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if EXIT_WORDS.iter().any(|word| input.eq_ignore_ascii_case(word)) {
            break;
        }

        run_turn(ctx, &orchestrator, &mut history, input, json).await?;
    }

    Ok(())
}

async fn run_turn(
    ctx: &AppContext,
    orchestrator: &LiveOrchestrator,
    history: &mut ConversationHistory,
    input: &str,
    json: bool,
) -> Result<()> {
    let spinner = turn_spinner(json);
    let response = orchestrator.respond(history, input, ctx.turn_context()).await;
    spinner.finish_and_clear();

    if !json && is_fallback(&response) {
        println!("{}", style(&response.content).yellow());
        return Ok(());
    }
    print_response(&response, json)
}

fn is_fallback(response: &StructuredResponse) -> bool {
    *response == StructuredResponse::text(FALLBACK_MESSAGE)
}

fn print_response(response: &StructuredResponse, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(response)?);
        return Ok(());
    }

    if response.is_card() {
        println!("{}", style(format!("[{ADAPTIVE_CARD_CONTENT_TYPE}]")).dim());
        println!("{}", pretty_card(&response.content));
    } else {
        println!("{}", response.content);
    }
    Ok(())
}

fn pretty_card(content: &str) -> String {
    serde_json::from_str::<serde_json::Value>(content)
        .ok()
        .and_then(|card| serde_json::to_string_pretty(&card).ok())
        .unwrap_or_else(|| content.to_string())
}
