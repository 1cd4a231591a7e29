//! Mail commands.

use anyhow::{bail, Context, Result};
use indicatif::ProgressDrawTarget;

use crate::cli::output::progress::create_spinner_with_message;
use crate::cli::output::ProgressBarExt;
use crate::cli::{AppContext, MailCommands};
use crate::services::NotificationArgs;

/// Run a `mail` subcommand.
pub async fn execute(command: MailCommands, ctx: &AppContext, json: bool) -> Result<()> {
    match command {
        MailCommands::Send { to, subject, body } => {
            let args = NotificationArgs {
                to_address: to,
                subject,
                body,
            };

            let spinner = create_spinner_with_message(format!("Sending mail to {}", args.to_address));
            if json {
                spinner.set_draw_target(ProgressDrawTarget::hidden());
            }

            let sent = match ctx
                .dispatcher
                .send_notification(&ctx.turn_context(), &args)
                .await
            {
                Ok(sent) => sent,
                Err(err) => {
                    spinner.finish_and_clear();
                    return Err(err).context("Failed to send mail");
                }
            };

            if json {
                spinner.finish_and_clear();
                println!("{}", serde_json::json!({ "sent": sent, "to": args.to_address }));
            } else if sent {
                spinner.finish_success(format!("Mail sent to {}", args.to_address));
            } else {
                spinner.finish_error(format!("Mail to {} was not accepted", args.to_address));
            }

            if !sent {
                bail!("The mail system did not accept the message to {}", args.to_address);
            }
            Ok(())
        }
    }
}
