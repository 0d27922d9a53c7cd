//! Credential store implementations.
//!
//! - `env`: process environment variables (highest priority)
//! - `layered`: layering of two stores, first hit wins
//! - [`StaticCredentialStore`]: in-memory map, typically the `[credentials]`
//!   table of `config.toml`

pub mod env;
pub mod layered;

use std::collections::HashMap;

use parley_core::credential::CredentialStore;
use parley_types::secret::Redacted;

pub use self::env::EnvCredentialStore;
pub use self::layered::LayeredCredentialStore;

/// Fixed set of credentials held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialStore {
    values: HashMap<String, Redacted>,
}

impl StaticCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a credential.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), Redacted::new(value));
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<&HashMap<String, String>> for StaticCredentialStore {
    fn from(map: &HashMap<String, String>) -> Self {
        Self {
            values: map
                .iter()
                .map(|(k, v)| (k.clone(), Redacted::new(v.clone())))
                .collect(),
        }
    }
}

impl CredentialStore for StaticCredentialStore {
    async fn get(&self, key: &str) -> Option<Redacted> {
        self.values.get(key).cloned()
    }
}

/// Default resolution chain: environment first, then the config file.
pub fn default_credentials(
    from_config: &HashMap<String, String>,
) -> LayeredCredentialStore<EnvCredentialStore, StaticCredentialStore> {
    LayeredCredentialStore::new(EnvCredentialStore::new(), StaticCredentialStore::from(from_config))
}
