//! The three turn stages.
//!
//! Each stage takes the turn's [`PipelineState`], checks it is at the stage it
//! expects, does its work, and advances the state. Stages return `Result`;
//! only [`invoke_model`] is infallible with respect to the model itself.

use std::time::Duration;

use tracing::{debug, warn};

use parley_types::chat::{ConversationMessage, SessionInfo};
use parley_types::error::TurnError;
use parley_types::llm::LlmError;

use super::fallback;
use super::state::{InvocationOutcome, PipelineState, TurnStage};
use crate::llm::model::ChatModel;
use crate::prompt::system_prompt_for;
use crate::session::checkpoint::Checkpointer;
use crate::session::store::SessionStore;

/// Stage 1: load the thread, make sure it starts with the role's system
/// instruction, and append the human message.
pub async fn prepare_context<C: Checkpointer>(
    state: &mut PipelineState,
    store: &SessionStore<C>,
    message: &str,
) -> Result<(), TurnError> {
    state.require(TurnStage::Start)?;

    state.thread = store.load_thread(&state.session_id).await?;
    state.is_new_session = state.thread.is_empty();
    if state
        .thread
        .ensure_system_prompt(system_prompt_for(&state.user_type))
    {
        debug!(session_id = %state.session_id, user_type = %state.user_type, "system prompt inserted");
    }
    state.thread.push(ConversationMessage::human(message));

    state.advance(TurnStage::ContextPrepared)
}

/// Stage 2: obtain exactly one assistant message.
///
/// A disabled model yields the deterministic fallback reply. Any invocation
/// error, or exceeding `deadline`, yields the technical-difficulties reply.
pub async fn invoke_model(
    state: &mut PipelineState,
    model: &ChatModel,
    deadline: Option<Duration>,
) -> Result<InvocationOutcome, TurnError> {
    state.require(TurnStage::ContextPrepared)?;

    let (reply, outcome) = if !model.is_live() {
        (
            ConversationMessage::assistant(fallback::disabled_reply(&state.user_type)),
            InvocationOutcome::Disabled,
        )
    } else {
        match call_with_deadline(model, &state.thread.messages, deadline).await {
            Ok(reply) => (reply, InvocationOutcome::Live),
            Err(e) => {
                warn!(
                    session_id = %state.session_id,
                    provider = model.provider_name(),
                    error = %e,
                    "model invocation failed"
                );
                let outcome = match e {
                    LlmError::Timeout { .. } => InvocationOutcome::TimedOut,
                    _ => InvocationOutcome::Failed,
                };
                (
                    ConversationMessage::assistant(fallback::TECHNICAL_DIFFICULTIES),
                    outcome,
                )
            }
        }
    };

    state.thread.push(reply);
    state.outcome = Some(outcome);
    state.advance(TurnStage::ModelInvoked)?;
    Ok(outcome)
}

async fn call_with_deadline(
    model: &ChatModel,
    messages: &[ConversationMessage],
    deadline: Option<Duration>,
) -> Result<ConversationMessage, LlmError> {
    match deadline {
        Some(limit) => tokio::time::timeout(limit, model.invoke(messages))
            .await
            .unwrap_or_else(|_| {
                Err(LlmError::Timeout {
                    after_ms: limit.as_millis() as u64,
                })
            }),
        None => model.invoke(messages).await,
    }
}

/// Stage 3: mark the turn processed, persist the thread, and count the turn.
pub async fn bookkeep<C: Checkpointer>(
    state: &mut PipelineState,
    store: &SessionStore<C>,
) -> Result<SessionInfo, TurnError> {
    state.require(TurnStage::ModelInvoked)?;

    state.processed = true;
    let info = store.commit_turn(&state.thread, &state.user_type).await?;

    state.advance(TurnStage::Bookkept)?;
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{Script, ScriptedProvider, scripted_model, shared_model};
    use crate::prompt::UserType;
    use crate::session::testing::MockCheckpointer;
    use parley_types::chat::MessageRole;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_prepare_context_fresh_session() {
        let store = SessionStore::new(MockCheckpointer::new());
        let mut state = PipelineState::new("s1", "manager");
        prepare_context(&mut state, &store, "hello").await.unwrap();

        assert!(state.is_new_session);
        assert_eq!(state.stage, TurnStage::ContextPrepared);
        let messages = &state.thread.messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[0].content, UserType::Manager.system_prompt());
        assert_eq!(messages[1].role, MessageRole::Human);
        assert_eq!(messages[1].content, "hello");
    }

    #[tokio::test]
    async fn test_prepare_context_existing_session_keeps_prompt() {
        let checkpointer = MockCheckpointer::new();
        let mut thread = parley_types::chat::ConversationThread::new("s1");
        thread.push(ConversationMessage::system(UserType::Customer.system_prompt()));
        thread.push(ConversationMessage::human("one"));
        thread.push(ConversationMessage::assistant("reply"));
        checkpointer.insert(thread);
        let store = SessionStore::new(checkpointer);

        let mut state = PipelineState::new("s1", "manager");
        prepare_context(&mut state, &store, "two").await.unwrap();
        assert!(!state.is_new_session);
        assert_eq!(state.thread.count(MessageRole::System), 1);
        assert_eq!(
            state.thread.system_prompt(),
            Some(UserType::Customer.system_prompt())
        );
        assert_eq!(state.thread.messages.len(), 4);
    }

    #[tokio::test]
    async fn test_invoke_model_sends_full_thread() {
        let provider = Arc::new(ScriptedProvider::new(Script::Reply("hi!")));
        let model = shared_model(provider.clone());
        let store = SessionStore::new(MockCheckpointer::new());
        let mut state = PipelineState::new("s1", "customer");
        prepare_context(&mut state, &store, "hello").await.unwrap();

        let outcome = invoke_model(&mut state, &model, None).await.unwrap();
        assert_eq!(outcome, InvocationOutcome::Live);
        assert_eq!(state.thread.last_assistant().unwrap().content, "hi!");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        let request = provider.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, MessageRole::System);
    }

    #[tokio::test]
    async fn test_invoke_model_failure_appends_fixed_reply() {
        let store = SessionStore::new(MockCheckpointer::new());
        let mut state = PipelineState::new("s1", "customer");
        prepare_context(&mut state, &store, "hello").await.unwrap();

        let outcome = invoke_model(&mut state, &scripted_model(Script::Fail), None)
            .await
            .unwrap();
        assert_eq!(outcome, InvocationOutcome::Failed);
        assert_eq!(
            state.thread.last_assistant().unwrap().content,
            fallback::TECHNICAL_DIFFICULTIES
        );
    }

    #[tokio::test]
    async fn test_invoke_model_deadline() {
        let store = SessionStore::new(MockCheckpointer::new());
        let mut state = PipelineState::new("s1", "customer");
        prepare_context(&mut state, &store, "hello").await.unwrap();

        let model = scripted_model(Script::Slow(Duration::from_secs(5)));
        let outcome = invoke_model(&mut state, &model, Some(Duration::from_millis(20)))
            .await
            .unwrap();
        assert_eq!(outcome, InvocationOutcome::TimedOut);
        assert_eq!(
            state.thread.last_assistant().unwrap().content,
            fallback::TECHNICAL_DIFFICULTIES
        );
    }

    #[tokio::test]
    async fn test_invoke_model_disabled() {
        let store = SessionStore::new(MockCheckpointer::new());
        let mut state = PipelineState::new("s1", "support_agent");
        prepare_context(&mut state, &store, "hello").await.unwrap();

        let model = ChatModel::disabled("openai", "missing key");
        let outcome = invoke_model(&mut state, &model, None).await.unwrap();
        assert_eq!(outcome, InvocationOutcome::Disabled);
        let reply = &state.thread.last_assistant().unwrap().content;
        assert!(fallback::is_fallback(reply));
        assert!(reply.contains("support_agent"));
    }

    #[tokio::test]
    async fn test_stages_out_of_order_rejected() {
        let store = SessionStore::new(MockCheckpointer::new());
        let mut state = PipelineState::new("s1", "customer");
        let err = invoke_model(&mut state, &scripted_model(Script::Echo), None)
            .await
            .unwrap_err();
        assert!(matches!(err, TurnError::StageOrder { .. }));
        assert!(bookkeep(&mut state, &store).await.is_err());
        assert!(!state.processed);
    }

    #[tokio::test]
    async fn test_bookkeep_persists_and_counts() {
        let checkpointer = Arc::new(MockCheckpointer::new());
        let store = SessionStore::new(checkpointer.clone());
        let mut state = PipelineState::new("s1", "customer");
        prepare_context(&mut state, &store, "hello").await.unwrap();
        invoke_model(&mut state, &scripted_model(Script::Echo), None)
            .await
            .unwrap();
        let info = bookkeep(&mut state, &store).await.unwrap();

        assert!(state.processed);
        assert_eq!(state.stage, TurnStage::Bookkept);
        assert_eq!(info.message_count, 1);
        assert_eq!(checkpointer.thread("s1").unwrap().messages.len(), 3);
    }
}
