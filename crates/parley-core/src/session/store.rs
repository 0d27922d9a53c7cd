//! Session store: checkpointed threads plus a `SessionInfo` registry.
//!
//! The checkpointer owns the authoritative thread. The registry is a
//! `DashMap` cache of per-session summaries that can always be rebuilt from
//! the thread. Registry values are cloned on read; no guard is held across
//! `.await`.
//!
//! Query methods never surface storage errors. A read failure is logged and
//! reported as "no such session".

use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, info, warn};

use parley_types::chat::{ConversationThread, HistoryEntry, MessageRole, SessionInfo};
use parley_types::error::StoreError;

use super::checkpoint::Checkpointer;
use crate::prompt::UserType;

/// Conversation memory keyed by session id.
pub struct SessionStore<C: Checkpointer> {
    checkpointer: C,
    registry: DashMap<String, SessionInfo>,
}

impl<C: Checkpointer> SessionStore<C> {
    pub fn new(checkpointer: C) -> Self {
        Self {
            checkpointer,
            registry: DashMap::new(),
        }
    }

    /// Access the underlying checkpointer.
    pub fn checkpointer(&self) -> &C {
        &self.checkpointer
    }

    /// Number of sessions tracked in the registry.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// True if the session has a registry entry or a stored thread.
    pub async fn exists(&self, session_id: &str) -> bool {
        if self.registry.contains_key(session_id) {
            return true;
        }
        match self.checkpointer.load(session_id).await {
            Ok(thread) => thread.is_some(),
            Err(e) => {
                warn!(session_id, error = %e, "checkpoint read failed, treating session as absent");
                false
            }
        }
    }

    /// Human and assistant messages in order. Empty for unknown sessions.
    pub async fn get_history(&self, session_id: &str) -> Vec<HistoryEntry> {
        match self.checkpointer.load(session_id).await {
            Ok(Some(thread)) => thread.history(),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(session_id, error = %e, "checkpoint read failed, returning empty history");
                Vec::new()
            }
        }
    }

    /// Summary for a session, rebuilt from the thread if the registry lost it.
    pub async fn get_info(&self, session_id: &str) -> Option<SessionInfo> {
        if let Some(info) = self.registry.get(session_id).map(|r| r.value().clone()) {
            return Some(info);
        }

        let thread = match self.checkpointer.load(session_id).await {
            Ok(Some(thread)) => thread,
            Ok(None) => return None,
            Err(e) => {
                warn!(session_id, error = %e, "checkpoint read failed, session info unavailable");
                return None;
            }
        };

        let info = reconstruct_info(&thread)?;
        debug!(session_id, message_count = info.message_count, "rebuilt session info from thread");
        // A concurrent commit may have created the entry meanwhile; keep it.
        let cached = self
            .registry
            .entry(session_id.to_string())
            .or_insert(info)
            .value()
            .clone();
        Some(cached)
    }

    /// Stored thread for a session, or a fresh empty one.
    pub async fn load_thread(&self, session_id: &str) -> Result<ConversationThread, StoreError> {
        Ok(self
            .checkpointer
            .load(session_id)
            .await?
            .unwrap_or_else(|| ConversationThread::new(session_id)))
    }

    /// Persist a finished turn and count it.
    ///
    /// The thread is saved first; the registry is only touched once the save
    /// succeeded, so a failed save counts nothing.
    pub async fn commit_turn(
        &self,
        thread: &ConversationThread,
        user_type: &str,
    ) -> Result<SessionInfo, StoreError> {
        self.checkpointer.save(thread).await?;

        let session_id = thread.session_id.clone();
        let info = self
            .registry
            .entry(session_id.clone())
            .and_modify(|info| info.message_count += 1)
            .or_insert_with(|| SessionInfo {
                session_id,
                message_count: (thread.count(MessageRole::Assistant) as u32).max(1),
                user_type: user_type.to_string(),
            })
            .value()
            .clone();
        debug!(session_id = %info.session_id, message_count = info.message_count, "turn committed");
        Ok(info)
    }

    /// Remove a session's thread and summary. Idempotent; never fails.
    pub async fn clear(&self, session_id: &str) {
        self.registry.remove(session_id);
        match self.checkpointer.delete(session_id).await {
            Ok(()) => info!(session_id, "session cleared"),
            Err(e) => warn!(session_id, error = %e, "failed to delete checkpoint"),
        }
    }

    /// Clear every session whose thread has been idle longer than `ttl`.
    /// Returns the number of sessions removed. Sessions touched while the
    /// sweep runs are kept.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let ttl = match chrono::Duration::from_std(ttl) {
            Ok(ttl) => ttl,
            Err(_) => return 0,
        };
        let cutoff = Utc::now() - ttl;

        let ids = match self.checkpointer.list_sessions().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "failed to list sessions for eviction");
                return 0;
            }
        };

        let mut evicted = 0;
        for id in ids {
            // A turn committed after the listing refreshes updated_at and
            // makes the conditional delete a no-op.
            match self.checkpointer.delete_if_idle(&id, cutoff).await {
                Ok(true) => {
                    self.registry.remove(&id);
                    debug!(session_id = %id, "idle session evicted");
                    evicted += 1;
                }
                Ok(false) => {}
                Err(e) => warn!(session_id = %id, error = %e, "failed to evict idle session"),
            }
        }
        evicted
    }
}

/// Rebuild a summary from a thread: one assistant message per completed
/// turn, role recovered from the system instruction.
///
/// Lossy: the raw tag is not stored in the thread, so a session created as
/// `"Admin"` comes back as `"customer"`. Do not expect this to reproduce the
/// registry entry it replaces.
fn reconstruct_info(thread: &ConversationThread) -> Option<SessionInfo> {
    let user_type = UserType::from_system_prompt(thread.system_prompt()?)?;
    Some(SessionInfo {
        session_id: thread.session_id.clone(),
        message_count: thread.count(MessageRole::Assistant) as u32,
        user_type: user_type.as_tag().to_string(),
    })
}
