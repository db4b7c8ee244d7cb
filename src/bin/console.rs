//! Interactive console bot
//!
//! Reads lines from stdin, runs each as a turn and prints the replies.
//! Conversation state lives in SQLite, so an interrupted conversation picks
//! up where it left off on the next run.

use async_trait::async_trait;
use dialog_stack::choices::{Choice, FoundChoice};
use dialog_stack::db::Database;
use dialog_stack::runtime::{ActivitySender, ResourceResponse, SendError};
use dialog_stack::{
    Activity, ChoicePrompt, ConfirmPrompt, DialogManager, DialogSet, DialogTurnStatus,
    PromptOptions, RuntimeConfig, SqliteStateStore, StepAction, TextPrompt, WaterfallDialog,
};
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Prints outbound activities to stdout
struct ConsoleSender;

fn print_activity(activity: &Activity) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "bot> {}", activity.text())?;
    if let Some(suggested) = &activity.suggested_actions {
        let titles: Vec<&str> = suggested.actions.iter().map(|a| a.title.as_str()).collect();
        writeln!(out, "     [{}]", titles.join("] ["))?;
    }
    for attachment in &activity.attachments {
        writeln!(out, "     <{}>", attachment.content_type)?;
    }
    out.flush()
}

#[async_trait]
impl ActivitySender for ConsoleSender {
    async fn send(&self, activity: &Activity) -> Result<ResourceResponse, SendError> {
        print_activity(activity).map_err(|e| SendError::new(e.to_string()))?;
        Ok(ResourceResponse {
            id: uuid::Uuid::new_v4().to_string(),
        })
    }
}

fn profile_dialog(id: &str) -> WaterfallDialog {
    WaterfallDialog::new(id)
        .step(|_| StepAction::prompt("name", PromptOptions::text("What's your name?")))
        .step(|step| {
            if let Some(name) = step.result().cloned() {
                step.values.insert("name".to_string(), name);
            }
            StepAction::prompt(
                "colour",
                PromptOptions::text("What's your favourite colour?")
                    .with_retry_prompt(Activity::message("Please pick one of these colours."))
                    .with_choices(vec![
                        Choice::new("red").with_synonyms(["crimson", "scarlet"]),
                        Choice::new("green").with_synonyms(["lime", "emerald"]),
                        Choice::new("blue").with_synonyms(["navy", "azure"]),
                    ]),
            )
        })
        .step(|step| {
            let colour = step
                .result()
                .cloned()
                .and_then(|v| serde_json::from_value::<FoundChoice>(v).ok())
                .map(|found| found.value)
                .unwrap_or_default();
            let name = step
                .values
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            step.values.insert("colour".to_string(), json!(colour));
            StepAction::prompt(
                "confirm",
                PromptOptions::text(format!("So you're {name} and you like {colour}. Right?")),
            )
        })
        .step(|step| {
            if step.result() == Some(&json!(true)) {
                step.send_text("Great, got it.");
                StepAction::EndDialog(Some(serde_json::Value::Object(step.values.clone())))
            } else {
                step.send_text("No problem, say anything to start again.");
                StepAction::EndDialog(None)
            }
        })
}

fn build_dialogs(root: &str) -> Result<DialogSet, dialog_stack::DialogError> {
    DialogSet::new()
        .with(profile_dialog(root))?
        .with(TextPrompt::new("name"))?
        .with(ChoicePrompt::new("colour"))?
        .with(ConfirmPrompt::new("confirm"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dialog_stack=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = RuntimeConfig::from_env();

    // Ensure database directory exists
    if let Some(parent) = PathBuf::from(&config.db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    tracing::info!(path = %config.db_path, "Opening database");
    let db = Database::open(&config.db_path)?;

    let dialogs = Arc::new(build_dialogs(&config.root_dialog)?);
    let manager = DialogManager::new(
        dialogs,
        config.root_dialog.clone(),
        SqliteStateStore::new(db),
        ConsoleSender,
    )?;

    tracing::info!(
        conversation_id = %config.conversation_id,
        channel_id = %config.channel_id,
        root = %config.root_dialog,
        "Console ready"
    );
    println!("Type a message to talk to the bot. /cancel resets, /quit exits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim_end();
        if line == "/quit" {
            break;
        }

        let activity = Activity::message(line)
            .with_channel(config.channel_id.clone())
            .with_conversation(config.conversation_id.clone())
            .with_locale("en-US");
        let outcome = if line == "/cancel" {
            manager.cancel_all(activity).await
        } else {
            manager.on_turn(activity).await
        };

        match outcome {
            Ok(result) => match result.status {
                DialogTurnStatus::Complete => {
                    tracing::info!(result = ?result.result, "Conversation complete");
                }
                DialogTurnStatus::Cancelled => println!("bot> (cancelled)"),
                DialogTurnStatus::Empty | DialogTurnStatus::Waiting => {}
            },
            Err(e) => {
                tracing::error!(error = %e, "Turn failed");
                eprintln!("error: {e}");
            }
        }
    }

    Ok(())
}
