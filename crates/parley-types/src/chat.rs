//! Conversation, session, and history types for Parley.
//!
//! A session is one conversation thread keyed by a caller-chosen identifier.
//! The thread is the authoritative record; [`SessionInfo`] is the lightweight
//! summary kept alongside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

// Re-export MessageRole from llm module (it's used in both chat and llm contexts).
pub use crate::llm::MessageRole;
use crate::llm::Message;

/// A single message within a conversation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Human, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Provider-facing view of this message.
    pub fn to_message(&self) -> Message {
        Message::new(self.role, self.content.clone())
    }
}

/// Ordered, append-only message list for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationThread {
    pub session_id: String,
    pub messages: Vec<ConversationMessage>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationThread {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// True when position 0 holds a system message.
    pub fn has_system_prompt(&self) -> bool {
        self.messages
            .first()
            .is_some_and(|m| m.role == MessageRole::System)
    }

    /// Content of the position-0 system message, if present.
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .first()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
    }

    /// Insert `prompt` at position 0 unless a system message is already
    /// there. Returns true if it was inserted.
    pub fn ensure_system_prompt(&mut self, prompt: &str) -> bool {
        if self.has_system_prompt() {
            return false;
        }
        self.messages.insert(0, ConversationMessage::system(prompt));
        self.updated_at = Utc::now();
        true
    }

    pub fn push(&mut self, message: ConversationMessage) {
        self.updated_at = message.created_at.max(self.updated_at);
        self.messages.push(message);
    }

    pub fn last_assistant(&self) -> Option<&ConversationMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
    }

    pub fn count(&self, role: MessageRole) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }

    /// Non-system messages in order, as exposed to callers.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.messages
            .iter()
            .filter_map(|m| {
                let kind = match m.role {
                    MessageRole::System => return None,
                    MessageRole::Human => HistoryKind::Human,
                    MessageRole::Assistant => HistoryKind::Ai,
                };
                Some(HistoryEntry {
                    kind,
                    content: m.content.clone(),
                    timestamp: Some(m.created_at),
                })
            })
            .collect()
    }
}

/// Summary metadata for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    /// Completed turns, failed invocations included.
    pub message_count: u32,
    /// Raw role tag supplied on the turn that created the session.
    pub user_type: String,
}

/// Speaker of a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Human,
    Ai,
}

impl fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryKind::Human => write!(f, "human"),
            HistoryKind::Ai => write!(f, "ai"),
        }
    }
}

impl FromStr for HistoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(HistoryKind::Human),
            "ai" => Ok(HistoryKind::Ai),
            other => Err(format!("invalid history kind: '{other}'")),
        }
    }
}

/// One visible entry of a session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "type")]
    pub kind: HistoryKind,
    pub content: String,
    pub timestamp: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_thread() -> ConversationThread {
        let mut thread = ConversationThread::new("s1");
        thread.push(ConversationMessage::system("be helpful"));
        thread.push(ConversationMessage::human("hello"));
        thread.push(ConversationMessage::assistant("hi there"));
        thread
    }

    #[test]
    fn test_has_system_prompt() {
        assert!(sample_thread().has_system_prompt());
        assert_eq!(sample_thread().system_prompt(), Some("be helpful"));

        let mut thread = ConversationThread::new("s2");
        thread.push(ConversationMessage::human("hello"));
        assert!(!thread.has_system_prompt());
        assert!(thread.system_prompt().is_none());
    }

    #[test]
    fn test_ensure_system_prompt_once() {
        let mut thread = ConversationThread::new("s1");
        assert!(thread.ensure_system_prompt("first"));
        thread.push(ConversationMessage::human("hello"));
        assert!(!thread.ensure_system_prompt("second"));
        assert_eq!(thread.count(MessageRole::System), 1);
        assert_eq!(thread.system_prompt(), Some("first"));
    }

    #[test]
    fn test_history_skips_system() {
        let history = sample_thread().history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].kind, HistoryKind::Human);
        assert_eq!(history[0].content, "hello");
        assert_eq!(history[1].kind, HistoryKind::Ai);
        assert!(history[1].timestamp.is_some());
    }

    #[test]
    fn test_last_assistant_and_count() {
        let mut thread = sample_thread();
        thread.push(ConversationMessage::human("again"));
        thread.push(ConversationMessage::assistant("second"));
        assert_eq!(thread.last_assistant().unwrap().content, "second");
        assert_eq!(thread.count(MessageRole::Assistant), 2);
        assert_eq!(thread.count(MessageRole::System), 1);
    }

    #[test]
    fn test_push_bumps_updated_at() {
        let mut thread = ConversationThread::new("s1");
        let before = thread.updated_at;
        thread.push(ConversationMessage::human("x"));
        assert!(thread.updated_at >= before);
    }

    #[test]
    fn test_history_entry_serialize() {
        let entry = HistoryEntry {
            kind: HistoryKind::Ai,
            content: "ok".into(),
            timestamp: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "ai");
        assert_eq!(json["content"], "ok");
        assert!(json["timestamp"].is_null());
    }

    #[test]
    fn test_history_kind_roundtrip() {
        for kind in [HistoryKind::Human, HistoryKind::Ai] {
            let parsed: HistoryKind = kind.to_string().parse().unwrap();
            assert_eq!(kind, parsed);
        }
    }

    #[test]
    fn test_message_role_reexport() {
        let role: MessageRole = "human".parse().unwrap();
        assert_eq!(role, MessageRole::Human);
    }

    #[test]
    fn test_thread_serde_roundtrip() {
        let thread = sample_thread();
        let json = serde_json::to_string(&thread).unwrap();
        let back: ConversationThread = serde_json::from_str(&json).unwrap();
        assert_eq!(back, thread);
    }
}
