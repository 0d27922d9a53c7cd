//! Environment variable credential store.
//!
//! Looks the key up directly as a variable name (e.g. `OPENAI_API_KEY`).
//! Values that are not valid Unicode are treated as absent.

use parley_core::credential::CredentialStore;
use parley_types::secret::Redacted;

/// Read-only view of the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentialStore;

impl EnvCredentialStore {
    pub fn new() -> Self {
        Self
    }
}

impl CredentialStore for EnvCredentialStore {
    async fn get(&self, key: &str) -> Option<Redacted> {
        match std::env::var(key) {
            Ok(val) => Some(Redacted::new(val)),
            Err(std::env::VarError::NotPresent) => None,
            Err(std::env::VarError::NotUnicode(_)) => None,
        }
    }
}
