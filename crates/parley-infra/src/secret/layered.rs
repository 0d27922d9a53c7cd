//! Two credential stores in priority order.

use parley_core::credential::CredentialStore;
use parley_types::secret::Redacted;

/// Checks `primary` first, then `fallback`. Blank values in the primary do
/// not shadow the fallback.
#[derive(Debug, Clone, Default)]
pub struct LayeredCredentialStore<A, B> {
    primary: A,
    fallback: B,
}

impl<A, B> LayeredCredentialStore<A, B> {
    pub fn new(primary: A, fallback: B) -> Self {
        Self { primary, fallback }
    }
}

impl<A: CredentialStore, B: CredentialStore> CredentialStore for LayeredCredentialStore<A, B> {
    async fn get(&self, key: &str) -> Option<Redacted> {
        match self.primary.get(key).await {
            Some(value) if !value.is_blank() => Some(value),
            _ => self.fallback.get(key).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::StaticCredentialStore;

    #[tokio::test]
    async fn test_primary_wins() {
        let store = LayeredCredentialStore::new(
            StaticCredentialStore::new().with("KEY", "first"),
            StaticCredentialStore::new().with("KEY", "second"),
        );
        assert_eq!(store.get("KEY").await.unwrap().expose(), "first");
    }

    #[tokio::test]
    async fn test_falls_through_missing_and_blank() {
        let store = LayeredCredentialStore::new(
            StaticCredentialStore::new().with("BLANK", "  "),
            StaticCredentialStore::new()
                .with("BLANK", "filled")
                .with("ONLY_FALLBACK", "x"),
        );
        assert_eq!(store.get("BLANK").await.unwrap().expose(), "filled");
        assert_eq!(store.get("ONLY_FALLBACK").await.unwrap().expose(), "x");
        assert!(store.get("NOWHERE").await.is_none());
    }
}
