//! Task commands that call the dispatcher directly.

use anyhow::{Context, Result};
use console::style;

use crate::cli::output::TableFormatter;
use crate::cli::{AppContext, TasksCommands};
use crate::domain::models::AnnotatedTask;
use crate::services::CreateTaskArgs;

/// Run a `tasks` subcommand.
pub async fn execute(command: TasksCommands, ctx: &AppContext, json: bool) -> Result<()> {
    let turn = ctx.turn_context();
    let dispatcher = &ctx.dispatcher;

    match command {
        TasksCommands::List { email } => {
            let tasks = dispatcher
                .list_tasks(&turn, email.as_deref())
                .await
                .context("Failed to list tasks")?;
            print_tasks(&tasks, json)
        }
        TasksCommands::Priority { priority, email } => {
            let tasks = dispatcher
                .filter_tasks_by_priority(&turn, email.as_deref(), priority)
                .await
                .context("Failed to filter tasks by priority")?;
            print_tasks(&tasks, json)
        }
        TasksCommands::Progress { status, email } => {
            let tasks = dispatcher
                .filter_tasks_by_progress(&turn, email.as_deref(), &status)
                .await
                .context("Failed to filter tasks by progress")?;
            print_tasks(&tasks, json)
        }
        TasksCommands::Overdue { email } => {
            let tasks = dispatcher
                .filter_overdue_tasks(&turn, email.as_deref())
                .await
                .context("Failed to list overdue tasks")?;
            print_tasks(&tasks, json)
        }
        TasksCommands::Plan { name, email } => {
            let tasks = dispatcher
                .list_tasks_in_plan(&turn, email.as_deref(), &name)
                .await
                .with_context(|| format!("Failed to list tasks in plan '{name}'"))?;
            print_tasks(&tasks, json)
        }
        TasksCommands::Create { plan, title } => {
            let args = CreateTaskArgs {
                plan_name: plan,
                title,
                ..CreateTaskArgs::default()
            };
            let created = dispatcher
                .create_task(&turn, &args)
                .await
                .context("Failed to create task")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&created)?);
            } else {
                println!(
                    "{} Created task {} ({})",
                    style("✓").green(),
                    style(&created.task.title).bold(),
                    style(&created.task.id).cyan()
                );
            }
            Ok(())
        }
    }
}

fn print_tasks(tasks: &[AnnotatedTask], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(tasks)?);
        return Ok(());
    }

    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    println!("{}", TableFormatter::new().format_tasks(tasks));
    println!("\n{} task(s)", tasks.len());
    Ok(())
}
