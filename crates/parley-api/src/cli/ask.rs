//! One-shot `parley ask` command.

use anyhow::Result;
use console::style;
use uuid::Uuid;

use parley_core::pipeline::state::InvocationOutcome;

use crate::state::AppState;

/// Run a single turn and print the reply.
///
/// With `--json` the full turn report is printed instead, which includes the
/// session id for follow-up calls.
pub async fn ask(
    state: &AppState,
    message: &str,
    session: Option<String>,
    user_type: &str,
    json: bool,
) -> Result<()> {
    if message.trim().is_empty() {
        anyhow::bail!("Message cannot be empty");
    }
    let max = state.config.server.max_message_length;
    if message.chars().count() > max {
        anyhow::bail!("Message too long (max {max} characters)");
    }

    let session_id = session
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::now_v7().to_string());

    let report = state
        .agent
        .turn_detailed(message, &session_id, user_type)
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", report.reply);
    if matches!(
        report.outcome,
        Some(InvocationOutcome::Failed | InvocationOutcome::TimedOut)
    ) {
        eprintln!(
            "{}",
            style("model call did not succeed; run with -v for details").dim()
        );
    }
    eprintln!("{} {}", style("session:").dim(), style(&report.session_id).dim());
    Ok(())
}
