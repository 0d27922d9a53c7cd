//! Credential lookup port.
//!
//! The provider registry asks a `CredentialStore` for API keys by name
//! (e.g. `OPENAI_API_KEY`). Implementations live in parley-infra.

use parley_types::secret::Redacted;

/// Read-only source of named credentials.
pub trait CredentialStore: Send + Sync {
    /// Look up a credential. Blank values are treated as absent by callers.
    fn get(&self, key: &str) -> impl std::future::Future<Output = Option<Redacted>> + Send;
}

/// Store with no credentials. Only keyless backends resolve against it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialStore for NoCredentials {
    async fn get(&self, _key: &str) -> Option<Redacted> {
        None
    }
}

/// Look up `key`, discarding blank values.
pub async fn lookup<S: CredentialStore>(store: &S, key: &str) -> Option<Redacted> {
    store.get(key).await.filter(|value| !value.is_blank())
}
