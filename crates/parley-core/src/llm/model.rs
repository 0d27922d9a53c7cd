//! The chat model handed to the turn pipeline.
//!
//! A `ChatModel` is either a live backend plus its request settings, or a
//! disabled marker recording why no backend could be built. Callers check
//! [`ChatModel::is_live`] before invoking.

use std::sync::Arc;

use tracing::{Instrument, debug, field, info_span};

use parley_types::chat::ConversationMessage;
use parley_types::llm::{CompletionRequest, LlmError};

use super::box_provider::BoxLlmProvider;

/// Per-request settings applied to every invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Live backend or the reason there is none.
#[derive(Debug, Clone)]
pub enum ChatModel {
    Live {
        provider: Arc<BoxLlmProvider>,
        settings: ModelSettings,
    },
    Disabled {
        provider_name: String,
        reason: String,
    },
}

impl ChatModel {
    pub fn live(provider: BoxLlmProvider, settings: ModelSettings) -> Self {
        ChatModel::Live {
            provider: Arc::new(provider),
            settings,
        }
    }

    pub fn disabled(provider_name: impl Into<String>, reason: impl Into<String>) -> Self {
        ChatModel::Disabled {
            provider_name: provider_name.into(),
            reason: reason.into(),
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, ChatModel::Live { .. })
    }

    pub fn provider_name(&self) -> &str {
        match self {
            ChatModel::Live { provider, .. } => provider.name(),
            ChatModel::Disabled { provider_name, .. } => provider_name,
        }
    }

    pub fn model_id(&self) -> Option<&str> {
        match self {
            ChatModel::Live { settings, .. } => Some(&settings.model),
            ChatModel::Disabled { .. } => None,
        }
    }

    /// Why the model is disabled, if it is.
    pub fn disabled_reason(&self) -> Option<&str> {
        match self {
            ChatModel::Live { .. } => None,
            ChatModel::Disabled { reason, .. } => Some(reason),
        }
    }

    /// Send the full ordered conversation and return the assistant reply.
    pub async fn invoke(
        &self,
        messages: &[ConversationMessage],
    ) -> Result<ConversationMessage, LlmError> {
        let (provider, settings) = match self {
            ChatModel::Live { provider, settings } => (provider, settings),
            ChatModel::Disabled { reason, .. } => {
                return Err(LlmError::Unavailable(reason.clone()));
            }
        };

        let request = CompletionRequest {
            model: settings.model.clone(),
            messages: messages.iter().map(ConversationMessage::to_message).collect(),
            max_tokens: settings.max_tokens,
            temperature: Some(settings.temperature),
            stop_sequences: None,
        };

        let span = info_span!(
            "gen_ai.chat",
            gen_ai.operation.name = "chat",
            gen_ai.system = provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            gen_ai.usage.input_tokens = field::Empty,
            gen_ai.usage.output_tokens = field::Empty,
            gen_ai.response.finish_reasons = field::Empty,
        );

        let response = provider
            .complete(&request)
            .instrument(span.clone())
            .await?;

        span.record("gen_ai.usage.input_tokens", response.usage.input_tokens);
        span.record("gen_ai.usage.output_tokens", response.usage.output_tokens);
        span.record(
            "gen_ai.response.finish_reasons",
            field::display(&response.stop_reason),
        );
        debug!(
            provider = provider.name(),
            response_id = %response.id,
            "completion received"
        );

        Ok(ConversationMessage::assistant(response.content))
    }
}
