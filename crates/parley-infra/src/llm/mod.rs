//! LLM provider implementations.
//!
//! Contains concrete implementations of the [`LlmProvider`] trait defined in
//! `parley-core`, plus [`default_registry`], which registers a constructor
//! for every backend compiled into this build.
//!
//! [`LlmProvider`]: parley_core::llm::provider::LlmProvider

#[cfg(feature = "anthropic")]
pub mod anthropic;
#[cfg(feature = "openai")]
pub mod openai_compat;

use parley_core::llm::registry::ProviderRegistry;
#[cfg(any(feature = "openai", feature = "anthropic"))]
use parley_core::llm::{box_provider::BoxLlmProvider, registry::BackendSettings};
#[cfg(any(feature = "openai", feature = "anthropic"))]
use parley_types::llm::{LlmError, ProviderKind};
#[cfg(any(feature = "openai", feature = "anthropic"))]
use secrecy::SecretString;

/// Registry with a constructor for each backend enabled by cargo features.
pub fn default_registry() -> ProviderRegistry {
    #[allow(unused_mut)]
    let mut registry = ProviderRegistry::new();

    #[cfg(feature = "openai")]
    for kind in [
        ProviderKind::OpenAi,
        ProviderKind::Groq,
        ProviderKind::Gemini,
        ProviderKind::Ollama,
    ] {
        registry.register(kind, build_openai_compatible);
    }

    #[cfg(feature = "anthropic")]
    registry.register(ProviderKind::Anthropic, build_anthropic);

    registry
}

#[cfg(any(feature = "openai", feature = "anthropic"))]
fn secret(settings: &BackendSettings) -> Option<SecretString> {
    settings
        .api_key
        .as_ref()
        .map(|key| SecretString::from(key.expose().to_string()))
}

#[cfg(any(feature = "openai", feature = "anthropic"))]
fn require_secret(settings: &BackendSettings) -> Result<SecretString, LlmError> {
    secret(settings).ok_or(LlmError::AuthenticationFailed)
}

#[cfg(feature = "openai")]
fn build_openai_compatible(settings: &BackendSettings) -> Result<BoxLlmProvider, LlmError> {
    use self::openai_compat::OpenAiCompatibleProvider;

    let model = settings.model.as_str();
    let base_url = settings.base_url.as_deref();
    let provider = match settings.kind {
        ProviderKind::OpenAi => OpenAiCompatibleProvider::openai(require_secret(settings)?, model, base_url),
        ProviderKind::Groq => OpenAiCompatibleProvider::groq(require_secret(settings)?, model, base_url),
        ProviderKind::Gemini => OpenAiCompatibleProvider::gemini(require_secret(settings)?, model, base_url),
        ProviderKind::Ollama => OpenAiCompatibleProvider::ollama(secret(settings), model, base_url),
        ProviderKind::Anthropic => {
            return Err(LlmError::InvalidRequest(
                "anthropic is not an OpenAI-compatible backend".to_string(),
            ));
        }
    };
    Ok(BoxLlmProvider::new(provider))
}

#[cfg(feature = "anthropic")]
fn build_anthropic(settings: &BackendSettings) -> Result<BoxLlmProvider, LlmError> {
    use self::anthropic::AnthropicProvider;

    let mut provider = AnthropicProvider::new(
        require_secret(settings)?,
        settings.model.clone(),
        settings.request_timeout,
    )?;
    if let Some(base_url) = settings.base_url.as_deref() {
        provider = provider.with_base_url(base_url);
    }
    Ok(BoxLlmProvider::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::credential::NoCredentials;
    use parley_types::llm::ProviderConfig;

    #[cfg(all(feature = "openai", feature = "anthropic"))]
    #[test]
    fn test_default_registry_has_all_backends() {
        let registry = default_registry();
        assert_eq!(registry.available(), ProviderKind::ALL.to_vec());
    }

    #[cfg(feature = "openai")]
    #[tokio::test]
    async fn test_ollama_resolves_without_credentials() {
        let registry = default_registry();
        let config = ProviderConfig {
            provider_name: "ollama".to_string(),
            ..ProviderConfig::default()
        };
        let model = registry.resolve(&config, &NoCredentials).await;
        assert!(model.is_live());
        assert_eq!(model.provider_name(), "ollama");
        assert_eq!(model.model_id(), Some("llama3.2"));
    }

    #[tokio::test]
    async fn test_missing_key_disables_model() {
        let registry = default_registry();
        let config = ProviderConfig {
            provider_name: "anthropic".to_string(),
            ..ProviderConfig::default()
        };
        let model = registry.resolve(&config, &NoCredentials).await;
        assert!(!model.is_live());
        assert_eq!(model.provider_name(), "anthropic");
    }

    #[cfg(feature = "openai")]
    #[test]
    fn test_openai_factory_requires_key() {
        let settings = BackendSettings {
            kind: ProviderKind::OpenAi,
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            base_url: None,
            request_timeout: None,
        };
        assert!(matches!(
            build_openai_compatible(&settings),
            Err(LlmError::AuthenticationFailed)
        ));
    }

    #[cfg(feature = "anthropic")]
    #[test]
    fn test_anthropic_factory_builds() {
        let settings = BackendSettings {
            kind: ProviderKind::Anthropic,
            model: "claude-3-5-sonnet-20240620".to_string(),
            api_key: Some(parley_types::secret::Redacted::new("sk-ant-test")),
            base_url: Some("http://localhost:9999".to_string()),
            request_timeout: Some(std::time::Duration::from_secs(5)),
        };
        let provider = build_anthropic(&settings).unwrap();
        assert_eq!(provider.name(), "anthropic");
    }
}
