//! Checkpointer trait.
//!
//! A checkpointer persists whole conversation threads keyed by session id.
//! The thread it holds is authoritative for a session's content.
//! Implementations live in parley-infra.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parley_types::chat::ConversationThread;
use parley_types::error::StoreError;

/// Trait for conversation thread persistence.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition). Each call is
/// atomic on its own; nothing spans calls, so conditional removal goes
/// through `delete_if_idle` rather than `load` followed by `delete`.
pub trait Checkpointer: Send + Sync {
    /// Load a thread. Returns None if the session has never been saved.
    fn load(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<ConversationThread>, StoreError>> + Send;

    /// Save a thread, replacing any previous version for its session.
    fn save(
        &self,
        thread: &ConversationThread,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Delete a thread. No-op if the session does not exist.
    fn delete(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Delete a thread only if it was last updated before `cutoff`.
    /// The check and the removal happen as one step. Returns true if a
    /// thread was removed.
    fn delete_if_idle(
        &self,
        session_id: &str,
        cutoff: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<bool, StoreError>> + Send;

    /// List the ids of every stored session.
    fn list_sessions(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<String>, StoreError>> + Send;
}

impl<C: Checkpointer> Checkpointer for Arc<C> {
    async fn load(&self, session_id: &str) -> Result<Option<ConversationThread>, StoreError> {
        (**self).load(session_id).await
    }

    async fn save(&self, thread: &ConversationThread) -> Result<(), StoreError> {
        (**self).save(thread).await
    }

    async fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        (**self).delete(session_id).await
    }

    async fn delete_if_idle(
        &self,
        session_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        (**self).delete_if_idle(session_id, cutoff).await
    }

    async fn list_sessions(&self) -> Result<Vec<String>, StoreError> {
        (**self).list_sessions().await
    }
}
