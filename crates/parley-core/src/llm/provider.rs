//! LlmProvider trait definition.
//!
//! This is the core abstraction that all model backends implement. It uses
//! RPITIT for `complete`; see [`super::box_provider`] for dynamic dispatch.

use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities};

/// Trait for LLM provider backends (OpenAI-compatible, Anthropic, ...).
///
/// Implementations may fail for any reason: network, authentication, quota,
/// malformed output. Callers treat every `Err` the same way.
///
/// Implementations live in parley-infra.
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "anthropic", "groq").
    fn name(&self) -> &str;

    /// Context and output limits of the configured model.
    fn capabilities(&self) -> &ProviderCapabilities;

    /// Send the full ordered conversation and receive one reply.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
