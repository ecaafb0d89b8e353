//! In-memory credential vault.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::application::ports::{CredentialVault, VaultError};

/// In-memory implementation of `CredentialVault`.
///
/// Nothing survives the process. Suitable for tests, tooling and hosts that
/// persist the token themselves.
#[derive(Default)]
pub struct InMemoryVault {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryVault {
    /// Create an empty vault.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a vault pre-seeded with one entry.
    #[must_use]
    pub fn with_entry(account: &str, token: &str) -> Self {
        let vault = Self::new();
        vault
            .entries
            .write()
            .insert(account.to_string(), token.to_string());
        vault
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the vault is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl CredentialVault for InMemoryVault {
    fn get(&self, account: &str) -> Option<String> {
        self.entries.read().get(account).cloned()
    }

    fn set(&self, account: &str, token: &str) -> Result<(), VaultError> {
        self.entries
            .write()
            .insert(account.to_string(), token.to_string());
        Ok(())
    }

    fn delete(&self, account: &str) {
        self.entries.write().remove(account);
    }
}

impl std::fmt::Debug for InMemoryVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVault")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::TOKEN_ACCOUNT;

    #[test]
    fn set_get_delete() {
        let vault = InMemoryVault::new();
        assert!(vault.get(TOKEN_ACCOUNT).is_none());

        vault.set(TOKEN_ACCOUNT, "tok").unwrap();
        assert_eq!(vault.get(TOKEN_ACCOUNT).as_deref(), Some("tok"));

        vault.set(TOKEN_ACCOUNT, "newer").unwrap();
        assert_eq!(vault.get(TOKEN_ACCOUNT).as_deref(), Some("newer"));
        assert_eq!(vault.len(), 1);

        vault.delete(TOKEN_ACCOUNT);
        vault.delete(TOKEN_ACCOUNT);
        assert!(vault.is_empty());
    }

    #[test]
    fn debug_hides_tokens() {
        let vault = InMemoryVault::with_entry(TOKEN_ACCOUNT, "secret");
        assert!(!format!("{vault:?}").contains("secret"));
    }
}
