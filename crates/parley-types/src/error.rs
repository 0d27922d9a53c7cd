use thiserror::Error;

/// Errors from the conversation checkpoint store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("checkpoint for session '{session_id}' is unreadable: {message}")]
    Unreadable { session_id: String, message: String },

    #[error("checkpoint for session '{session_id}' is corrupted: {message}")]
    Corrupted { session_id: String, message: String },

    #[error("checkpoint backend error: {0}")]
    Backend(String),
}

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {message}")]
    Io { path: String, message: String },

    #[error("failed to parse config '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("provider '{provider}' requires credential '{variable}'")]
    MissingCredential { provider: String, variable: String },
}

/// Errors inside a single turn. These never reach callers of the turn
/// operation; they collapse to a fixed reply at the agent boundary.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("agent is not initialized")]
    NotInitialized,

    #[error("agent is already initialized")]
    AlreadyInitialized,

    #[error("stage out of order: expected '{expected}', found '{actual}'")]
    StageOrder { expected: String, actual: String },

    #[error("state error: {0}")]
    Store(#[from] StoreError),

    #[error("turn produced no assistant message")]
    EmptyResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Corrupted {
            session_id: "abc".to_string(),
            message: "bad json".to_string(),
        };
        assert!(err.to_string().contains("abc"));
        assert!(err.to_string().contains("bad json"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingCredential {
            provider: "groq".to_string(),
            variable: "GROQ_API_KEY".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "provider 'groq' requires credential 'GROQ_API_KEY'"
        );
    }

    #[test]
    fn test_turn_error_from_store_error() {
        let err: TurnError = StoreError::Backend("disk full".to_string()).into();
        assert!(matches!(err, TurnError::Store(_)));
        assert_eq!(err.to_string(), "state error: checkpoint backend error: disk full");
    }

    #[test]
    fn test_stage_order_display() {
        let err = TurnError::StageOrder {
            expected: "context_prepared".to_string(),
            actual: "start".to_string(),
        };
        assert!(err.to_string().contains("context_prepared"));
    }
}
