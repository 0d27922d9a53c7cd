//! Scripted providers for core unit tests.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parley_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities, StopReason, Usage,
};

use super::box_provider::BoxLlmProvider;
use super::model::{ChatModel, ModelSettings};
use super::provider::LlmProvider;

pub enum Script {
    /// Reply with this text.
    Reply(&'static str),
    /// Echo the last message back, prefixed with the message count.
    Echo,
    /// Fail every call.
    Fail,
    /// Sleep, then reply.
    Slow(Duration),
}

pub struct ScriptedProvider {
    script: Script,
    caps: ProviderCapabilities,
    pub calls: AtomicUsize,
    pub last_request: Mutex<Option<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            caps: ProviderCapabilities {
                max_context_tokens: 8_000,
                max_output_tokens: 1_000,
            },
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.caps
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        let content = match &self.script {
            Script::Reply(text) => text.to_string(),
            Script::Echo => {
                let last = request.messages.last().map(|m| m.content.as_str()).unwrap_or("");
                format!("{}:{last}", request.messages.len())
            }
            Script::Fail => {
                return Err(LlmError::Provider {
                    message: "boom".into(),
                });
            }
            Script::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                "late".to_string()
            }
        };
        Ok(CompletionResponse {
            id: "scripted-1".into(),
            content,
            model: request.model.clone(),
            stop_reason: StopReason::EndTurn,
            usage: Usage::default(),
        })
    }
}

pub fn scripted_model(script: Script) -> ChatModel {
    ChatModel::live(
        BoxLlmProvider::new(ScriptedProvider::new(script)),
        ModelSettings {
            model: "scripted-model".into(),
            temperature: 0.7,
            max_tokens: 1000,
        },
    )
}

/// Lets a test keep a handle on the provider it hands to a model.
pub struct SharedProvider(pub Arc<ScriptedProvider>);

impl LlmProvider for SharedProvider {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        self.0.capabilities()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.0.complete(request).await
    }
}

pub fn shared_model(provider: Arc<ScriptedProvider>) -> ChatModel {
    ChatModel::live(
        BoxLlmProvider::new(SharedProvider(provider)),
        ModelSettings {
            model: "scripted-model".into(),
            temperature: 0.7,
            max_tokens: 1000,
        },
    )
}
