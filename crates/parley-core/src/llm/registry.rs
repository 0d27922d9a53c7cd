//! Provider registry for startup-time backend selection.
//!
//! Backends register a constructor per [`ProviderKind`]. Which constructors
//! exist is decided at build time by the embedding crate; at startup the
//! registry turns a [`ProviderConfig`] plus a credential source into a
//! [`ChatModel`]. Resolution never fails: anything that prevents building a
//! live backend yields a disabled model and a warning.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{info, warn};

use parley_types::error::ConfigError;
use parley_types::llm::{LlmError, ProviderConfig, ProviderKind, ProviderStatus};
use parley_types::secret::Redacted;

use super::box_provider::BoxLlmProvider;
use super::model::{ChatModel, ModelSettings};
use crate::credential::{self, CredentialStore};

/// Everything a backend constructor needs.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub kind: ProviderKind,
    pub model: String,
    pub api_key: Option<Redacted>,
    pub base_url: Option<String>,
    pub request_timeout: Option<Duration>,
}

/// Constructor for one backend kind.
pub type ProviderFactory =
    Box<dyn Fn(&BackendSettings) -> Result<BoxLlmProvider, LlmError> + Send + Sync>;

/// Registry of backend constructors, keyed by kind.
pub struct ProviderRegistry {
    factories: HashMap<ProviderKind, ProviderFactory>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a constructor for `kind`, replacing any previous one.
    pub fn register<F>(&mut self, kind: ProviderKind, factory: F)
    where
        F: Fn(&BackendSettings) -> Result<BoxLlmProvider, LlmError> + Send + Sync + 'static,
    {
        self.factories.insert(kind, Box::new(factory));
    }

    pub fn is_registered(&self, kind: ProviderKind) -> bool {
        self.factories.contains_key(&kind)
    }

    /// Registered backends, in canonical order.
    pub fn available(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.is_registered(*kind))
            .collect()
    }

    /// Map a configured name to a kind. Unknown names fall back to OpenAI.
    pub fn kind_for(name: &str) -> ProviderKind {
        match name.parse::<ProviderKind>() {
            Ok(kind) => kind,
            Err(_) => {
                warn!(provider = %name, "unknown provider, defaulting to openai");
                ProviderKind::OpenAi
            }
        }
    }

    /// Build the chat model for `config`.
    pub async fn resolve<S: CredentialStore>(
        &self,
        config: &ProviderConfig,
        credentials: &S,
    ) -> ChatModel {
        let kind = Self::kind_for(&config.provider_name);

        let Some(factory) = self.factories.get(&kind) else {
            warn!(provider = %kind, "backend not available in this build");
            return ChatModel::disabled(kind.to_string(), "backend not available in this build");
        };

        let api_key = match credential_for(config, kind, credentials).await {
            Ok(key) => key,
            Err(e) => {
                warn!(provider = %kind, error = %e, "provider not configured, using fallback replies");
                return ChatModel::disabled(kind.to_string(), e.to_string());
            }
        };

        let settings = BackendSettings {
            kind,
            model: config.model_for(kind),
            api_key,
            base_url: config.base_url.clone(),
            request_timeout: (config.request_timeout_secs > 0)
                .then(|| Duration::from_secs(config.request_timeout_secs)),
        };

        match factory(&settings) {
            Ok(provider) => {
                info!(provider = %kind, model = %settings.model, "model backend ready");
                ChatModel::live(
                    provider,
                    ModelSettings {
                        model: settings.model,
                        temperature: config.temperature,
                        max_tokens: config.max_tokens,
                    },
                )
            }
            Err(e) => {
                warn!(provider = %kind, error = %e, "failed to construct backend");
                ChatModel::disabled(kind.to_string(), e.to_string())
            }
        }
    }

    /// Report whether `config` can produce a live model, and what is missing.
    pub async fn status<S: CredentialStore>(
        &self,
        config: &ProviderConfig,
        credentials: &S,
    ) -> ProviderStatus {
        let kind = Self::kind_for(&config.provider_name);
        let mut missing = Vec::new();

        if !self.is_registered(kind) {
            missing.push(format!("{kind} backend"));
        }
        if let Err(ConfigError::MissingCredential { variable, .. }) =
            credential_for(config, kind, credentials).await
        {
            missing.push(variable);
        }

        ProviderStatus {
            provider: kind.to_string(),
            configured: missing.is_empty(),
            missing,
        }
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve the API key for `kind`. Keyless backends still receive a key when
/// an explicit reference is configured and present.
async fn credential_for<S: CredentialStore>(
    config: &ProviderConfig,
    kind: ProviderKind,
    credentials: &S,
) -> Result<Option<Redacted>, ConfigError> {
    let Some(key) = config.credential_key(kind) else {
        return Ok(None);
    };
    match credential::lookup(credentials, &key).await {
        Some(value) => Ok(Some(value)),
        None if kind.requires_credential() => Err(ConfigError::MissingCredential {
            provider: kind.to_string(),
            variable: key,
        }),
        None => Ok(None),
    }
}
