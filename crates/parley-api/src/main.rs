//! Parley CLI and REST API entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, loads configuration, initializes tracing and the
//! chat agent, then dispatches to a terminal command or starts the server.

mod cli;
mod http;
mod state;

use std::time::Duration;

use clap::Parser;
use clap_complete::generate;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use parley_infra::checkpoint::spawn_session_sweeper;
use parley_infra::config::{default_config_path, load_config};
use parley_observe::tracing_setup::{init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need config or state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "parley", &mut std::io::stdout());
        return Ok(());
    }

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = load_config(&config_path).await?;

    init_tracing(&config.logging, cli.log_level_override())
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;
    info!(path = %config_path.display(), "configuration loaded");

    let state = AppState::init(config).await?;

    let result = run(cli, state).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli, state: AppState) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port, host } => serve(state, host, port).await,

        Commands::Chat { session, user_type } => {
            cli::chat::loop_runner::run_chat_loop(&state, session, &user_type).await
        }

        Commands::Ask {
            message,
            session,
            user_type,
        } => cli::ask::ask(&state, &message, session, &user_type, cli.json).await,

        Commands::Providers => cli::provider::list_providers(&state, cli.json).await,

        Commands::Completions { .. } => unreachable!("handled above"),
    }
}

/// Bind the listener, run the idle-session sweeper, and serve until a
/// shutdown signal arrives.
async fn serve(state: AppState, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| state.config.server.host.clone());
    let port = port.unwrap_or(state.config.server.port);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let cancel = CancellationToken::new();
    let sessions = &state.config.sessions;
    let sweeper = match state.store() {
        Some(store) if sessions.ttl_secs > 0 => Some(spawn_session_sweeper(
            store.clone(),
            Duration::from_secs(sessions.ttl_secs),
            Duration::from_secs(sessions.cleanup_interval_secs.max(1)),
            cancel.clone(),
        )),
        _ => None,
    };

    if !state.llm_status.configured {
        warn!(
            provider = %state.llm_status.provider,
            missing = ?state.llm_status.missing,
            "model backend not configured; chat will answer with fallback replies"
        );
    }

    println!(
        "  {} Parley API listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());
    info!(%addr, "server started");

    let router = http::router::build_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cancel.cancel();
    if let Some(handle) = sweeper {
        if let Err(e) = handle.await {
            warn!(error = %e, "session sweeper did not stop cleanly");
        }
    }

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
