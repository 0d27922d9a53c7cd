//! In-process checkpointer.
//!
//! Threads live in a `DashMap` and are cloned in and out, so no shard guard
//! outlives a call. Contents are lost when the process exits.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use parley_core::session::checkpoint::Checkpointer;
use parley_types::chat::ConversationThread;
use parley_types::error::StoreError;

#[derive(Debug, Default)]
pub struct MemoryCheckpointer {
    threads: DashMap<String, ConversationThread>,
}

impl MemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}

impl Checkpointer for MemoryCheckpointer {
    async fn load(&self, session_id: &str) -> Result<Option<ConversationThread>, StoreError> {
        Ok(self.threads.get(session_id).map(|t| t.value().clone()))
    }

    async fn save(&self, thread: &ConversationThread) -> Result<(), StoreError> {
        self.threads
            .insert(thread.session_id.clone(), thread.clone());
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        self.threads.remove(session_id);
        Ok(())
    }

    async fn delete_if_idle(
        &self,
        session_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        // remove_if holds the shard lock across the check
        Ok(self
            .threads
            .remove_if(session_id, |_, t| t.updated_at < cutoff)
            .is_some())
    }

    async fn list_sessions(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.threads.iter().map(|e| e.key().clone()).collect())
    }
}
