//! In-memory checkpointer for core unit tests.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use parley_types::chat::ConversationThread;
use parley_types::error::StoreError;

use super::checkpoint::Checkpointer;

#[derive(Default)]
pub struct MockCheckpointer {
    threads: DashMap<String, ConversationThread>,
    pub fail_load: AtomicBool,
    pub fail_save: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl MockCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, thread: ConversationThread) {
        self.threads.insert(thread.session_id.clone(), thread);
    }

    pub fn thread(&self, session_id: &str) -> Option<ConversationThread> {
        self.threads.get(session_id).map(|t| t.value().clone())
    }

    pub fn set_fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }
}

impl Checkpointer for MockCheckpointer {
    async fn load(&self, session_id: &str) -> Result<Option<ConversationThread>, StoreError> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(StoreError::Unreadable {
                session_id: session_id.to_string(),
                message: "injected".to_string(),
            });
        }
        Ok(self.thread(session_id))
    }

    async fn save(&self, thread: &ConversationThread) -> Result<(), StoreError> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected".to_string()));
        }
        self.insert(thread.clone());
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected".to_string()));
        }
        self.threads.remove(session_id);
        Ok(())
    }

    async fn delete_if_idle(
        &self,
        session_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected".to_string()));
        }
        Ok(self
            .threads
            .remove_if(session_id, |_, t| t.updated_at < cutoff)
            .is_some())
    }

    async fn list_sessions(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.threads.iter().map(|r| r.key().clone()).collect())
    }
}
