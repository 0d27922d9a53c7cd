//! Slash command parsing for the chat loop.
//!
//! Commands start with `/` and control the session rather than being sent
//! to the model.

use std::io::{self, Write};

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Forget the current session's conversation.
    Clear,
    /// Clear the terminal screen.
    ClearScreen,
    /// Exit the chat session.
    Exit,
    /// Drop the current session and start a fresh one.
    New,
    /// Show conversation history for this session.
    History,
    /// Show the session summary.
    Info,
    /// Unknown command.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let cmd = trimmed
        .split_whitespace()
        .next()
        .unwrap_or(trimmed)
        .to_lowercase();

    let parsed = match cmd.as_str() {
        "/help" | "/h" | "/?" => ChatCommand::Help,
        "/clear" | "/reset" => ChatCommand::Clear,
        "/cls" => ChatCommand::ClearScreen,
        "/exit" | "/quit" | "/q" => ChatCommand::Exit,
        "/new" => ChatCommand::New,
        "/history" => ChatCommand::History,
        "/info" => ChatCommand::Info,
        other => ChatCommand::Unknown(other.to_string()),
    };
    Some(parsed)
}

/// Write the help text listing all available commands.
pub fn print_help(out: &mut impl Write) -> io::Result<()> {
    let rows = [
        ("/help", "Show this help message"),
        ("/history", "Show conversation history"),
        ("/info", "Show session summary"),
        ("/clear", "Forget this session's conversation"),
        ("/new", "Start a new session"),
        ("/cls", "Clear the screen"),
        ("/exit", "End the chat session"),
    ];

    writeln!(out)?;
    writeln!(out, "  {}", style("Available commands:").bold())?;
    writeln!(out)?;
    for (name, help) in rows {
        writeln!(out, "  {:<10} {}", style(name).cyan(), help)?;
    }
    writeln!(out)?;
    writeln!(out, "  {}", style("Ctrl+D to exit").dim())?;
    writeln!(out)
}
