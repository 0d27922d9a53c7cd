//! `parley providers`: which model backends this build can use.
//!
//! For each known backend shows whether it is compiled in, whether it is the
//! configured one, and which credentials it is missing.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use serde::Serialize;

use parley_core::llm::registry::ProviderRegistry;
use parley_infra::llm::default_registry;
use parley_infra::secret::default_credentials;
use parley_types::llm::{ProviderKind, ProviderStatus};

use crate::state::AppState;

/// One row of the providers listing.
#[derive(Debug, Serialize)]
pub struct ProviderRow {
    pub provider: ProviderKind,
    pub compiled_in: bool,
    pub current: bool,
    pub configured: bool,
    pub missing: Vec<String>,
    pub default_model: &'static str,
}

/// Build the listing for every known backend.
pub async fn provider_rows(state: &AppState, registry: &ProviderRegistry) -> Vec<ProviderRow> {
    let credentials = default_credentials(&state.config.credentials);
    let current = ProviderRegistry::kind_for(&state.config.llm.provider_name);

    let mut rows = Vec::with_capacity(ProviderKind::ALL.len());
    for kind in ProviderKind::ALL {
        let status = if kind == current {
            (*state.llm_status).clone()
        } else {
            let mut cfg = state.config.llm.clone();
            cfg.provider_name = kind.to_string();
            cfg.credential_reference = None;
            cfg.model_id = None;
            registry.status(&cfg, &credentials).await
        };
        let ProviderStatus {
            configured, missing, ..
        } = status;
        rows.push(ProviderRow {
            provider: kind,
            compiled_in: registry.is_registered(kind),
            current: kind == current,
            configured,
            missing,
            default_model: kind.default_model(),
        });
    }
    rows
}

/// Print the providers listing.
pub async fn list_providers(state: &AppState, json: bool) -> Result<()> {
    let registry = default_registry();
    let rows = provider_rows(state, &registry).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!();
    println!("  {}", style("Model Backends").bold());
    println!();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Provider").fg(Color::White),
        Cell::new("Built").fg(Color::White),
        Cell::new("Active").fg(Color::White),
        Cell::new("Ready").fg(Color::White),
        Cell::new("Missing").fg(Color::White),
        Cell::new("Default Model").fg(Color::White),
    ]);

    for row in &rows {
        let built = if row.compiled_in {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no").fg(Color::DarkGrey)
        };
        let active = if row.current {
            Cell::new("*").fg(Color::Cyan)
        } else {
            Cell::new("")
        };
        let ready = if row.configured {
            Cell::new("ready").fg(Color::Green)
        } else {
            Cell::new("not ready").fg(Color::Yellow)
        };
        let missing = if row.missing.is_empty() {
            "-".to_string()
        } else {
            row.missing.join(", ")
        };

        table.add_row(vec![
            Cell::new(row.provider.to_string()).fg(Color::White),
            built,
            active,
            ready,
            Cell::new(missing).fg(Color::DarkGrey),
            Cell::new(row.default_model).fg(Color::DarkGrey),
        ]);
    }

    println!("{table}");
    println!();
    println!(
        "  {}",
        style("Set credentials via environment variables or [credentials] in config.toml.").dim()
    );
    println!();

    Ok(())
}
