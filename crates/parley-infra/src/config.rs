//! Configuration loader for Parley.
//!
//! Reads `config.toml` from the data directory (`~/.parley/` by default),
//! then applies environment overrides. Falls back to defaults when the file
//! is missing or malformed; only invalid override values are errors.

use std::path::{Path, PathBuf};

use parley_types::config::AppConfig;
use parley_types::error::ConfigError;

/// Resolve the data directory.
///
/// Priority:
/// 1. `PARLEY_HOME` environment variable
/// 2. `~/.parley`
/// 3. `.parley` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PARLEY_HOME") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".parley");
    }

    PathBuf::from(".parley")
}

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    resolve_data_dir().join("config.toml")
}

/// Read `path` into an [`AppConfig`].
///
/// - Missing file: defaults.
/// - Unreadable or unparsable file: warning, then defaults.
pub async fn load_config_file(path: &Path) -> AppConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            AppConfig::default()
        }
    }
}

/// Load the file at `path`, apply process environment overrides, validate.
pub async fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let mut config = load_config_file(path).await;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Apply environment overrides read through `lookup`.
///
/// Blank values are ignored. A value that does not parse is an error.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(provider) = get("LLM_PROVIDER") {
        config.llm.provider_name = provider.to_lowercase();
    }
    if let Some(model) = get("LLM_MODEL") {
        config.llm.model_id = Some(model);
    }
    if let Some(value) = get("LLM_TEMPERATURE") {
        config.llm.temperature = parse("LLM_TEMPERATURE", &value)?;
    }
    if let Some(value) = get("LLM_MAX_TOKENS") {
        config.llm.max_tokens = parse("LLM_MAX_TOKENS", &value)?;
    }
    if let Some(value) = get("LLM_TIMEOUT_SECS") {
        config.llm.request_timeout_secs = parse("LLM_TIMEOUT_SECS", &value)?;
    }
    if let Some(url) = get("OLLAMA_BASE_URL") {
        if config.llm.provider_name == "ollama" {
            config.llm.base_url = Some(url);
        }
    }
    if let Some(host) = get("PARLEY_HOST") {
        config.server.host = host;
    }
    if let Some(value) = get("PARLEY_PORT") {
        config.server.port = parse("PARLEY_PORT", &value)?;
    }
    if let Some(value) = get("SESSION_TTL") {
        config.sessions.ttl_secs = parse("SESSION_TTL", &value)?;
    }
    if let Some(value) = get("SESSION_CLEANUP_INTERVAL") {
        config.sessions.cleanup_interval_secs = parse("SESSION_CLEANUP_INTERVAL", &value)?;
    }
    if let Some(format) = get("LOG_FORMAT") {
        config.logging.json = format.eq_ignore_ascii_case("json");
    }
    Ok(())
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| ConfigError::Invalid(format!("{key}={value:?}: {e}")))
}
