//! CLI command definitions for the `parley` binary.
//!
//! Uses clap derive macros for argument parsing. `serve` runs the REST API;
//! `chat` and `ask` drive the same agent from the terminal.

pub mod ask;
pub mod chat;
pub mod provider;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Role-aware conversational assistant.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config.toml (defaults to ~/.parley/config.toml).
    #[arg(long, global = true, env = "PARLEY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (overrides config).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config).
        #[arg(long)]
        host: Option<String>,
    },

    /// Start an interactive chat session.
    Chat {
        /// Continue an existing session id.
        #[arg(long)]
        session: Option<String>,

        /// Role of the person chatting: customer, support_agent, manager.
        #[arg(long, short = 'u', default_value = "customer")]
        user_type: String,
    },

    /// Send a single message and print the reply.
    Ask {
        /// The message to send.
        message: String,

        /// Session id to use (a fresh one is generated when absent).
        #[arg(long)]
        session: Option<String>,

        /// Role of the person asking.
        #[arg(long, short = 'u', default_value = "customer")]
        user_type: String,
    },

    /// Show model backends and whether each is ready to use.
    #[command(alias = "provider")]
    Providers,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

impl Commands {
    /// Tracing level used when neither `-v` nor `--quiet` is given.
    ///
    /// The server logs at its configured filter; terminal commands stay
    /// quiet so log lines do not interleave with the conversation.
    pub fn default_log_level(&self) -> Option<&'static str> {
        match self {
            Commands::Serve { .. } => None,
            _ => Some("warn"),
        }
    }
}

impl Cli {
    /// Level override passed to the tracing subscriber.
    pub fn log_level_override(&self) -> Option<&'static str> {
        if self.quiet {
            return Some("error");
        }
        match self.verbose {
            0 => self.command.default_log_level(),
            1 => Some("debug"),
            _ => Some("trace"),
        }
    }
}
