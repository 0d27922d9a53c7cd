//! Configuration and per-backend defaults for OpenAI-compatible providers.
//!
//! Each backend that speaks the OpenAI chat completions protocol gets a
//! function returning an [`OpenAiCompatConfig`] with the correct base URL and
//! limits. A configured base URL always wins over the default.

use secrecy::SecretString;

use parley_types::llm::ProviderCapabilities;

/// Configuration for an OpenAI-compatible backend.
///
/// Used to construct an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Provider name as reported to callers (e.g. "openai", "groq").
    pub provider_name: String,
    /// Base URL for the API (e.g. "https://api.openai.com/v1").
    pub base_url: String,
    pub api_key: SecretString,
    pub model: String,
    pub capabilities: ProviderCapabilities,
}

fn build(
    provider_name: &str,
    default_base: &str,
    base_url: Option<&str>,
    api_key: SecretString,
    model: &str,
    capabilities: ProviderCapabilities,
) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: provider_name.into(),
        base_url: base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| default_base.to_string()),
        api_key,
        model: model.into(),
        capabilities,
    }
}

/// OpenAI. Base URL `https://api.openai.com/v1`; 128K context, 16K output.
pub fn openai_defaults(api_key: SecretString, model: &str, base_url: Option<&str>) -> OpenAiCompatConfig {
    build(
        "openai",
        "https://api.openai.com/v1",
        base_url,
        api_key,
        model,
        ProviderCapabilities {
            max_context_tokens: 128_000,
            max_output_tokens: 16_384,
        },
    )
}

/// Groq. Base URL `https://api.groq.com/openai/v1`; 8K context models by default.
pub fn groq_defaults(api_key: SecretString, model: &str, base_url: Option<&str>) -> OpenAiCompatConfig {
    build(
        "groq",
        "https://api.groq.com/openai/v1",
        base_url,
        api_key,
        model,
        ProviderCapabilities {
            max_context_tokens: 8_192,
            max_output_tokens: 8_192,
        },
    )
}

/// Google Gemini through its OpenAI-compatible endpoint.
///
/// Base URL `https://generativelanguage.googleapis.com/v1beta/openai`;
/// 1M context, 64K output.
pub fn gemini_defaults(api_key: SecretString, model: &str, base_url: Option<&str>) -> OpenAiCompatConfig {
    build(
        "gemini",
        "https://generativelanguage.googleapis.com/v1beta/openai",
        base_url,
        api_key,
        model,
        ProviderCapabilities {
            max_context_tokens: 1_000_000,
            max_output_tokens: 65_536,
        },
    )
}

/// Local Ollama server.
///
/// `base_url` is the server root (default `http://localhost:11434`); the
/// OpenAI-compatible API lives under `/v1`. Ollama ignores the API key, so a
/// placeholder is sent when none is configured.
pub fn ollama_defaults(api_key: Option<SecretString>, model: &str, base_url: Option<&str>) -> OpenAiCompatConfig {
    let root = base_url
        .unwrap_or("http://localhost:11434")
        .trim_end_matches('/');
    let base = if root.ends_with("/v1") {
        root.to_string()
    } else {
        format!("{root}/v1")
    };
    OpenAiCompatConfig {
        provider_name: "ollama".into(),
        base_url: base,
        api_key: api_key.unwrap_or_else(|| SecretString::from("ollama")),
        model: model.into(),
        capabilities: ProviderCapabilities {
            max_context_tokens: 128_000,
            max_output_tokens: 4_096,
        },
    }
}
