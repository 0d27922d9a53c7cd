//! Main chat loop.
//!
//! Reads lines, handles slash commands, and runs every other line through
//! the agent as one turn. Output goes through the readline `SharedWriter`
//! so replies never clobber the prompt.

use std::io::Write;

use console::style;
use tracing::debug;
use uuid::Uuid;

use parley_core::pipeline::state::InvocationOutcome;
use parley_types::chat::HistoryKind;

use crate::state::AppState;

use super::banner::{print_welcome_banner, short_id};
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};

/// Run the interactive chat loop.
pub async fn run_chat_loop(
    state: &AppState,
    session: Option<String>,
    user_type: &str,
) -> anyhow::Result<()> {
    let mut session_id = session
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::now_v7().to_string());

    let model = state.agent.model();
    let provider = model
        .map(|m| m.provider_name().to_string())
        .unwrap_or_else(|| state.llm_status.provider.clone());
    let model_id = model.and_then(|m| m.model_id());
    print_welcome_banner(&provider, model_id, user_type, &session_id);

    if let Some(info) = state.agent.get_session_info(&session_id).await {
        println!(
            "  {} Resuming session with {} turn{}",
            style("↺").cyan(),
            style(info.message_count).bold(),
            if info.message_count == 1 { "" } else { "s" }
        );
        println!();
    }

    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut input, mut out) = ChatInput::new(prompt)
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        let text = match input.read_line().await {
            InputEvent::Eof => break,
            InputEvent::Interrupted => {
                writeln!(out, "  {}", style("Press Ctrl+D to exit, or keep chatting.").dim())?;
                continue;
            }
            InputEvent::Message(text) if text.is_empty() => continue,
            InputEvent::Message(text) => text,
        };

        if let Some(cmd) = commands::parse(&text) {
            match cmd {
                ChatCommand::Help => commands::print_help(&mut out)?,
                ChatCommand::ClearScreen => input.clear(),
                ChatCommand::Exit => break,
                ChatCommand::New => {
                    session_id = Uuid::now_v7().to_string();
                    writeln!(
                        out,
                        "\n  {} New session {}\n",
                        style("+").cyan().bold(),
                        style(short_id(&session_id)).dim()
                    )?;
                }
                ChatCommand::History => print_history(state, &session_id, &mut out).await?,
                ChatCommand::Info => match state.agent.get_session_info(&session_id).await {
                    Some(info) => writeln!(
                        out,
                        "\n  {} {}\n  {} {}\n  {} {}\n",
                        style("Session:").bold(),
                        info.session_id,
                        style("Turns:").bold(),
                        info.message_count,
                        style("Role:").bold(),
                        info.user_type
                    )?,
                    None => writeln!(out, "\n  {}\n", style("No turns yet.").dim())?,
                },
                ChatCommand::Clear => {
                    state.agent.clear_session(&session_id).await;
                    writeln!(out, "\n  {} Session cleared.\n", style("✓").green())?;
                }
                ChatCommand::Unknown(name) => writeln!(
                    out,
                    "\n  {} Unknown command: {}. Type /help for available commands.\n",
                    style("?").yellow().bold(),
                    style(name).dim()
                )?,
            }
            continue;
        }

        let report = state
            .agent
            .turn_detailed(&text, &session_id, user_type)
            .await;
        debug!(outcome = ?report.outcome, message_count = ?report.message_count, "turn finished");

        writeln!(
            out,
            "\n  {} {}\n",
            style("Assistant >").cyan().bold(),
            report.reply.trim()
        )?;
        if matches!(
            report.outcome,
            Some(InvocationOutcome::Failed | InvocationOutcome::TimedOut)
        ) {
            writeln!(
                out,
                "  {}\n",
                style("The model call did not succeed. Run with -v for details.").dim()
            )?;
        }
    }

    input.flush();
    println!("\n  {}", style("Session ended.").dim());
    Ok(())
}

async fn print_history(
    state: &AppState,
    session_id: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let history = state.agent.get_history(session_id).await;
    writeln!(out)?;
    if history.is_empty() {
        writeln!(out, "  {}", style("No messages yet.").dim())?;
    }
    for entry in &history {
        let label = match entry.kind {
            HistoryKind::Human => style("You").green().bold(),
            HistoryKind::Ai => style("Assistant").cyan().bold(),
        };
        writeln!(out, "  {label} {}", preview(&entry.content, 100))?;
    }
    writeln!(out)?;
    Ok(())
}

/// Shorten `text` to at most `max` characters.
fn preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}
