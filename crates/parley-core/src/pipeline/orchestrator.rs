//! `ChatAgent`: the public face of the turn pipeline.
//!
//! A turn runs the three stages in order over a fresh [`PipelineState`].
//! Errors travel between stages as [`TurnError`] values and are collapsed
//! into one of the two fixed replies here, at the outermost boundary. The
//! agent never returns an error and never panics on a failed turn.
//!
//! The agent does not serialize turns within a session. Callers that may
//! run concurrent turns for the same session id must serialize them.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde::Serialize;
use tracing::{Instrument, error, info, info_span};

use parley_types::chat::{HistoryEntry, SessionInfo};
use parley_types::error::TurnError;

use super::fallback;
use super::stages;
use super::state::{InvocationOutcome, PipelineState, TurnStage};
use crate::llm::model::ChatModel;
use crate::session::checkpoint::Checkpointer;
use crate::session::store::SessionStore;

/// Collaborators wired into an agent.
pub struct AgentRuntime<C: Checkpointer> {
    pub model: ChatModel,
    pub store: Arc<SessionStore<C>>,
    /// Upper bound on the model call. `None` waits indefinitely.
    pub deadline: Option<Duration>,
}

impl<C: Checkpointer> AgentRuntime<C> {
    pub fn new(model: ChatModel, store: Arc<SessionStore<C>>) -> Self {
        Self {
            model,
            store,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }
}

/// What happened during one turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnReport {
    pub reply: String,
    pub session_id: String,
    /// `None` when the turn failed before the model stage finished.
    pub outcome: Option<InvocationOutcome>,
    pub is_new_session: bool,
    /// Session turn count after this turn; `None` if it was not counted.
    pub message_count: Option<u32>,
}

/// Turn orchestrator over an injected session store.
pub struct ChatAgent<C: Checkpointer> {
    runtime: OnceLock<AgentRuntime<C>>,
}

impl<C: Checkpointer> ChatAgent<C> {
    /// An agent with nothing wired. Every turn answers with the
    /// technical-difficulties reply until [`ChatAgent::initialize`] is called.
    pub fn new() -> Self {
        Self {
            runtime: OnceLock::new(),
        }
    }

    /// A ready agent.
    pub fn with_runtime(runtime: AgentRuntime<C>) -> Self {
        let agent = Self::new();
        let _ = agent.runtime.set(runtime);
        agent
    }

    /// Wire the model and store. Succeeds once.
    pub fn initialize(&self, runtime: AgentRuntime<C>) -> Result<(), TurnError> {
        let provider = runtime.model.provider_name().to_string();
        let live = runtime.model.is_live();
        self.runtime
            .set(runtime)
            .map_err(|_| TurnError::AlreadyInitialized)?;
        info!(provider = %provider, live, "chat agent initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.runtime.get().is_some()
    }

    pub fn model(&self) -> Option<&ChatModel> {
        self.runtime.get().map(|rt| &rt.model)
    }

    pub fn store(&self) -> Option<&Arc<SessionStore<C>>> {
        self.runtime.get().map(|rt| &rt.store)
    }

    /// Run one turn and return the assistant reply. Always non-empty.
    pub async fn turn(&self, message: &str, session_id: &str, user_type: &str) -> String {
        self.turn_detailed(message, session_id, user_type).await.reply
    }

    /// Run one turn and report how it went.
    pub async fn turn_detailed(
        &self,
        message: &str,
        session_id: &str,
        user_type: &str,
    ) -> TurnReport {
        let span = info_span!("chat.turn", session_id = %session_id, user_type = %user_type);
        async {
            let mut state = PipelineState::new(session_id, user_type);
            let result = self.run_turn(&mut state, message).await;

            let (reply, message_count) = match result {
                Ok((reply, info)) => (reply, Some(info.message_count)),
                Err(TurnError::EmptyResponse) => {
                    error!("turn produced no assistant message");
                    (fallback::NO_RESPONSE.to_string(), None)
                }
                Err(e) => {
                    error!(error = %e, stage = %state.stage, "turn failed");
                    (fallback::TECHNICAL_DIFFICULTIES.to_string(), None)
                }
            };

            TurnReport {
                reply,
                session_id: session_id.to_string(),
                outcome: state.outcome,
                is_new_session: state.is_new_session,
                message_count,
            }
        }
        .instrument(span)
        .await
    }

    async fn run_turn(
        &self,
        state: &mut PipelineState,
        message: &str,
    ) -> Result<(String, SessionInfo), TurnError> {
        let rt = self.runtime.get().ok_or(TurnError::NotInitialized)?;

        stages::prepare_context(state, &rt.store, message).await?;
        stages::invoke_model(state, &rt.model, rt.deadline).await?;
        let info = stages::bookkeep(state, &rt.store).await?;

        let reply = state
            .thread
            .last_assistant()
            .map(|m| m.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or(TurnError::EmptyResponse)?;
        state.advance(TurnStage::Done)?;

        info!(
            message_count = info.message_count,
            outcome = ?state.outcome,
            "turn complete"
        );
        Ok((reply, info))
    }

    /// True if a thread or summary exists for the session.
    pub async fn session_exists(&self, session_id: &str) -> bool {
        match self.runtime.get() {
            Some(rt) => rt.store.exists(session_id).await,
            None => false,
        }
    }

    /// Visible history of a session. Empty if unknown or unreadable.
    pub async fn get_history(&self, session_id: &str) -> Vec<HistoryEntry> {
        match self.runtime.get() {
            Some(rt) => rt.store.get_history(session_id).await,
            None => Vec::new(),
        }
    }

    pub async fn get_session_info(&self, session_id: &str) -> Option<SessionInfo> {
        match self.runtime.get() {
            Some(rt) => rt.store.get_info(session_id).await,
            None => None,
        }
    }

    /// Forget a session. Always succeeds from the caller's view.
    pub async fn clear_session(&self, session_id: &str) {
        if let Some(rt) = self.runtime.get() {
            rt.store.clear(session_id).await;
        }
    }
}

impl<C: Checkpointer> Default for ChatAgent<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{Script, ScriptedProvider, scripted_model, shared_model};
    use crate::prompt::UserType;
    use crate::session::testing::MockCheckpointer;
    use parley_types::chat::{HistoryKind, MessageRole};
    use std::sync::atomic::Ordering;

    fn agent_with(model: ChatModel) -> (ChatAgent<Arc<MockCheckpointer>>, Arc<MockCheckpointer>) {
        let checkpointer = Arc::new(MockCheckpointer::new());
        let store = Arc::new(SessionStore::new(checkpointer.clone()));
        (
            ChatAgent::with_runtime(AgentRuntime::new(model, store)),
            checkpointer,
        )
    }

    #[tokio::test]
    async fn test_first_turn_inserts_one_system_prompt() {
        let (agent, checkpointer) = agent_with(scripted_model(Script::Reply("hello back")));
        let reply = agent.turn("hi", "s1", "customer").await;
        assert_eq!(reply, "hello back");

        let thread = checkpointer.thread("s1").unwrap();
        assert_eq!(thread.messages.len(), 3);
        assert_eq!(thread.messages[0].role, MessageRole::System);
        assert_eq!(thread.messages[0].content, UserType::Customer.system_prompt());
        assert_eq!(thread.messages[1].role, MessageRole::Human);
        assert_eq!(thread.messages[2].role, MessageRole::Assistant);

        agent.turn("again", "s1", "manager").await;
        let thread = checkpointer.thread("s1").unwrap();
        assert_eq!(thread.count(MessageRole::System), 1);
        assert_eq!(thread.messages.len(), 5);
    }

    #[tokio::test]
    async fn test_history_and_count_after_n_turns() {
        let (agent, _) = agent_with(scripted_model(Script::Echo));
        for i in 0..4 {
            agent.turn(&format!("m{i}"), "s1", "customer").await;
        }
        let history = agent.get_history("s1").await;
        assert_eq!(history.len(), 8);
        for (i, pair) in history.chunks(2).enumerate() {
            assert_eq!(pair[0].kind, HistoryKind::Human);
            assert_eq!(pair[0].content, format!("m{i}"));
            assert_eq!(pair[1].kind, HistoryKind::Ai);
        }
        let info = agent.get_session_info("s1").await.unwrap();
        assert_eq!(info.message_count, 4);
    }

    #[tokio::test]
    async fn test_single_turn_history_is_exact() {
        let (agent, _) = agent_with(scripted_model(Script::Reply("Hi there")));
        let reply = agent.turn("Hello", "s1", "customer").await;
        let history: Vec<_> = agent
            .get_history("s1")
            .await
            .into_iter()
            .map(|e| (e.kind, e.content))
            .collect();
        assert_eq!(
            history,
            vec![
                (HistoryKind::Human, "Hello".to_string()),
                (HistoryKind::Ai, reply),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_session_id_is_a_regular_key() {
        let (agent, checkpointer) = agent_with(scripted_model(Script::Echo));
        let reply = agent.turn("Hello", "", "customer").await;
        assert_eq!(reply, "2:Hello");
        assert!(agent.session_exists("").await);
        assert!(checkpointer.thread("").is_some());

        let history: Vec<_> = agent
            .get_history("")
            .await
            .into_iter()
            .map(|e| (e.kind, e.content))
            .collect();
        assert_eq!(
            history,
            vec![
                (HistoryKind::Human, "Hello".to_string()),
                (HistoryKind::Ai, "2:Hello".to_string()),
            ]
        );

        let info = agent.get_session_info("").await.unwrap();
        assert_eq!(info.session_id, "");
        assert_eq!(info.message_count, 1);
        assert_eq!(info.user_type, "customer");
    }

    #[tokio::test]
    async fn test_provider_sees_growing_context() {
        let provider = Arc::new(ScriptedProvider::new(Script::Echo));
        let (agent, _) = agent_with(shared_model(provider.clone()));
        assert_eq!(agent.turn("a", "s1", "customer").await, "2:a");
        assert_eq!(agent.turn("b", "s1", "customer").await, "4:b");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unconfigured_system_uses_fallback() {
        let (agent, _) = agent_with(ChatModel::disabled("openai", "missing OPENAI_API_KEY"));
        let reply = agent.turn("Hi", "s1", "manager").await;
        assert!(fallback::is_fallback(&reply));
        assert!(reply.contains("manager"));

        let info = agent.get_session_info("s1").await.unwrap();
        assert_eq!(
            info,
            SessionInfo {
                session_id: "s1".into(),
                message_count: 1,
                user_type: "manager".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_failing_provider_still_counts() {
        let (agent, _) = agent_with(scripted_model(Script::Fail));
        let reply = agent.turn("hello", "s1", "customer").await;
        assert_eq!(reply, fallback::TECHNICAL_DIFFICULTIES);
        assert_eq!(agent.get_session_info("s1").await.unwrap().message_count, 1);

        agent.turn("hello", "s1", "customer").await;
        assert_eq!(agent.get_session_info("s1").await.unwrap().message_count, 2);
    }

    #[tokio::test]
    async fn test_role_changes_across_turns_each_count() {
        let (agent, checkpointer) = agent_with(scripted_model(Script::Echo));
        for role in ["customer", "support_agent", "manager"] {
            agent.turn("q", "s2", role).await;
        }
        let info = agent.get_session_info("s2").await.unwrap();
        assert_eq!(info.message_count, 3);
        assert_eq!(info.user_type, "customer");
        let thread = checkpointer.thread("s2").unwrap();
        assert_eq!(thread.system_prompt(), Some(UserType::Customer.system_prompt()));
    }

    #[tokio::test]
    async fn test_clear_session() {
        let (agent, _) = agent_with(scripted_model(Script::Echo));
        agent.turn("q", "s1", "customer").await;
        assert!(agent.session_exists("s1").await);

        agent.clear_session("s1").await;
        assert!(!agent.session_exists("s1").await);
        assert!(agent.get_history("s1").await.is_empty());
        assert!(agent.get_session_info("s1").await.is_none());

        agent.clear_session("s1").await;
        agent.clear_session("ghost").await;
    }

    #[tokio::test]
    async fn test_uninitialized_agent() {
        let agent: ChatAgent<MockCheckpointer> = ChatAgent::new();
        assert!(!agent.is_initialized());
        assert_eq!(
            agent.turn("hi", "s1", "customer").await,
            fallback::TECHNICAL_DIFFICULTIES
        );
        assert!(!agent.session_exists("s1").await);
        assert!(agent.get_history("s1").await.is_empty());
        assert!(agent.get_session_info("s1").await.is_none());
        agent.clear_session("s1").await;
    }

    #[tokio::test]
    async fn test_initialize_once() {
        let agent: ChatAgent<MockCheckpointer> = ChatAgent::new();
        let store = Arc::new(SessionStore::new(MockCheckpointer::new()));
        agent
            .initialize(AgentRuntime::new(scripted_model(Script::Echo), store.clone()))
            .unwrap();
        assert!(agent.is_initialized());
        assert_eq!(agent.turn("x", "s1", "customer").await, "2:x");

        let err = agent
            .initialize(AgentRuntime::new(scripted_model(Script::Echo), store))
            .unwrap_err();
        assert!(matches!(err, TurnError::AlreadyInitialized));
    }

    #[tokio::test]
    async fn test_store_failure_collapses_to_fixed_reply() {
        let (agent, checkpointer) = agent_with(scripted_model(Script::Echo));
        checkpointer.set_fail_save(true);
        let report = agent.turn_detailed("q", "s1", "customer").await;
        assert_eq!(report.reply, fallback::TECHNICAL_DIFFICULTIES);
        assert!(report.message_count.is_none());
        assert!(agent.get_session_info("s1").await.is_none());

        checkpointer.set_fail_save(false);
        checkpointer.set_fail_load(true);
        assert_eq!(
            agent.turn("q", "s1", "customer").await,
            fallback::TECHNICAL_DIFFICULTIES
        );
    }

    #[tokio::test]
    async fn test_empty_model_reply_uses_no_response() {
        let (agent, _) = agent_with(scripted_model(Script::Reply("   ")));
        let report = agent.turn_detailed("q", "s1", "customer").await;
        assert_eq!(report.reply, fallback::NO_RESPONSE);
    }

    #[tokio::test]
    async fn test_deadline_counts_as_failure() {
        let checkpointer = Arc::new(MockCheckpointer::new());
        let store = Arc::new(SessionStore::new(checkpointer));
        let agent = ChatAgent::with_runtime(
            AgentRuntime::new(scripted_model(Script::Slow(Duration::from_secs(5))), store)
                .with_deadline(Some(Duration::from_millis(20))),
        );
        let report = agent.turn_detailed("q", "s1", "customer").await;
        assert_eq!(report.reply, fallback::TECHNICAL_DIFFICULTIES);
        assert_eq!(report.outcome, Some(InvocationOutcome::TimedOut));
        assert_eq!(report.message_count, Some(1));
    }

    #[tokio::test]
    async fn test_turn_report() {
        let (agent, _) = agent_with(scripted_model(Script::Reply("ok")));
        let first = agent.turn_detailed("q", "s1", "customer").await;
        assert!(first.is_new_session);
        assert_eq!(first.outcome, Some(InvocationOutcome::Live));
        assert_eq!(first.message_count, Some(1));

        let second = agent.turn_detailed("q", "s1", "customer").await;
        assert!(!second.is_new_session);
        assert_eq!(second.message_count, Some(2));
    }

    #[tokio::test]
    async fn test_parallel_sessions() {
        let (agent, _) = agent_with(scripted_model(Script::Echo));
        let agent = Arc::new(agent);
        let mut handles = Vec::new();
        for i in 0..8 {
            let agent = agent.clone();
            handles.push(tokio::spawn(async move {
                let id = format!("s{i}");
                agent.turn("a", &id, "customer").await;
                agent.turn("b", &id, "customer").await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        for i in 0..8 {
            let info = agent.get_session_info(&format!("s{i}")).await.unwrap();
            assert_eq!(info.message_count, 2);
        }
    }
}
