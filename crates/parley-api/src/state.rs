//! Application state wiring the agent, configuration, and per-session locks.
//!
//! AppState holds the concrete instances used by both the CLI and the REST
//! API. The agent is generic over its checkpointer; AppState pins it to the
//! in-memory implementation.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;

use parley_core::llm::model::ChatModel;
use parley_core::pipeline::{AgentRuntime, ChatAgent};
use parley_core::session::store::SessionStore;
use parley_infra::checkpoint::MemoryCheckpointer;
use parley_infra::llm::default_registry;
use parley_infra::secret::default_credentials;
use parley_types::config::AppConfig;
use parley_types::llm::{ProviderKind, ProviderStatus};

/// Concrete agent pinned to the in-memory checkpointer.
pub type Agent = ChatAgent<MemoryCheckpointer>;

pub type Store = SessionStore<MemoryCheckpointer>;

/// One async mutex per session id.
///
/// The core does not serialize turns within a session; the HTTP layer runs
/// each turn under its session's lock. Entries are dropped once no turn
/// holds or waits on them.
#[derive(Default)]
pub struct SessionLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `session_id`.
    pub async fn with_lock<F, T>(&self, session_id: &str, f: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        let lock = self
            .locks
            .entry(session_id.to_string())
            .or_default()
            .value()
            .clone();

        let result = {
            let _guard = lock.lock().await;
            f.await
        };

        drop(lock);
        self.locks
            .remove_if(session_id, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    /// Number of sessions with a turn in flight or queued.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<Agent>,
    pub config: Arc<AppConfig>,
    /// Whether the configured backend can run, as checked at startup.
    pub llm_status: Arc<ProviderStatus>,
    /// Backends compiled into this build.
    pub available_providers: Arc<Vec<ProviderKind>>,
    pub session_locks: Arc<SessionLocks>,
}

impl AppState {
    /// Resolve the model backend, build the session store, and initialize
    /// the agent.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let registry = default_registry();
        let credentials = default_credentials(&config.credentials);

        let llm_status = registry.status(&config.llm, &credentials).await;
        let model = registry.resolve(&config.llm, &credentials).await;

        let state = Self::with_model(config, model, llm_status, registry.available())?;
        Ok(state)
    }

    /// Wire state around an already-resolved model.
    pub fn with_model(
        config: AppConfig,
        model: ChatModel,
        llm_status: ProviderStatus,
        available_providers: Vec<ProviderKind>,
    ) -> anyhow::Result<Self> {
        let store = Arc::new(SessionStore::new(MemoryCheckpointer::new()));
        let deadline = (config.llm.request_timeout_secs > 0)
            .then(|| Duration::from_secs(config.llm.request_timeout_secs));

        let agent = ChatAgent::new();
        agent.initialize(AgentRuntime::new(model, store).with_deadline(deadline))?;

        Ok(Self {
            agent: Arc::new(agent),
            config: Arc::new(config),
            llm_status: Arc::new(llm_status),
            available_providers: Arc::new(available_providers),
            session_locks: Arc::new(SessionLocks::new()),
        })
    }

    /// The agent's session store.
    pub fn store(&self) -> Option<&Arc<Store>> {
        self.agent.store()
    }

    /// Number of known sessions.
    pub fn active_sessions(&self) -> usize {
        self.store().map(|s| s.len()).unwrap_or(0)
    }
}
