//! Secure in-memory storage for provider API keys and endpoint overrides.
//!
//! ```rust
//! use tprovider::{ProviderId, SecureCredentialManager};
//!
//! let credentials = SecureCredentialManager::new();
//! credentials
//!     .set_api_key(ProviderId::Perplexity, "pplx-123")
//!     .expect("key should set");
//!
//! assert!(credentials.has_api_key(ProviderId::Perplexity).expect("lock"));
//! assert_eq!(format!("{credentials:?}"), "SecureCredentialManager { api_keys: [Perplexity], endpoints: [] }");
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::{ProviderError, ProviderId};

#[derive(PartialEq, Eq)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn expose(&self) -> &str {
        self.value.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        unsafe {
            self.value.as_mut_vec().fill(0);
        }
    }
}

#[derive(Default)]
struct CredentialTable {
    api_keys: HashMap<ProviderId, SecretString>,
    endpoints: HashMap<ProviderId, String>,
}

#[derive(Default)]
pub struct SecureCredentialManager {
    table: Mutex<CredentialTable>,
}

impl SecureCredentialManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_api_key(
        &self,
        provider: ProviderId,
        api_key: impl Into<String>,
    ) -> Result<(), ProviderError> {
        let api_key = SecretString::new(api_key);
        if api_key.is_empty() {
            return Err(ProviderError::configuration("api key must not be empty"));
        }

        self.table()?.api_keys.insert(provider, api_key);
        Ok(())
    }

    /// Overrides the URL a provider posts to. Required for the custom family.
    pub fn set_endpoint(
        &self,
        provider: ProviderId,
        url: impl Into<String>,
    ) -> Result<(), ProviderError> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(ProviderError::configuration("endpoint url must not be empty"));
        }

        self.table()?.endpoints.insert(provider, url.trim().to_string());
        Ok(())
    }

    pub fn has_api_key(&self, provider: ProviderId) -> Result<bool, ProviderError> {
        Ok(self.table()?.api_keys.contains_key(&provider))
    }

    pub fn endpoint(&self, provider: ProviderId) -> Result<Option<String>, ProviderError> {
        Ok(self.table()?.endpoints.get(&provider).cloned())
    }

    pub fn with_api_key<R>(
        &self,
        provider: ProviderId,
        f: impl FnOnce(&str) -> R,
    ) -> Result<Option<R>, ProviderError> {
        let table = self.table()?;
        Ok(table
            .api_keys
            .get(&provider)
            .map(|secret| f(secret.expose())))
    }

    pub(crate) fn api_key(&self, provider: ProviderId) -> Result<Option<String>, ProviderError> {
        self.with_api_key(provider, str::to_string)
    }

    pub fn clear(&self, provider: ProviderId) -> Result<bool, ProviderError> {
        let mut table = self.table()?;
        let removed_key = table.api_keys.remove(&provider).is_some();
        let removed_endpoint = table.endpoints.remove(&provider).is_some();
        Ok(removed_key || removed_endpoint)
    }

    fn table(&self) -> Result<MutexGuard<'_, CredentialTable>, ProviderError> {
        self.table
            .lock()
            .map_err(|_| ProviderError::configuration("credential manager lock poisoned"))
    }
}

impl std::fmt::Debug for SecureCredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("SecureCredentialManager");
        match self.table.lock() {
            Ok(table) => {
                let mut keys = table.api_keys.keys().copied().collect::<Vec<_>>();
                let mut endpoints = table.endpoints.keys().copied().collect::<Vec<_>>();
                keys.sort_by_key(|id| id.to_string());
                endpoints.sort_by_key(|id| id.to_string());
                debug.field("api_keys", &keys).field("endpoints", &endpoints);
            }
            Err(_) => {
                debug.field("table", &"<poisoned>");
            }
        }
        debug.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProviderErrorKind;

    #[test]
    fn empty_values_are_rejected_as_configuration_errors() {
        let credentials = SecureCredentialManager::new();
        let error = credentials
            .set_api_key(ProviderId::OpenAi, "  ")
            .expect_err("blank key should fail");
        assert_eq!(error.kind, ProviderErrorKind::Configuration);

        let error = credentials
            .set_endpoint(ProviderId::Custom, "")
            .expect_err("blank url should fail");
        assert_eq!(error.kind, ProviderErrorKind::Configuration);
    }

    #[test]
    fn keys_are_readable_through_closures_only_and_clearable() {
        let credentials = SecureCredentialManager::new();
        credentials
            .set_api_key(ProviderId::Anthropic, "sk-ant-1")
            .expect("key should set");
        credentials
            .set_endpoint(ProviderId::Custom, " http://localhost:1234/v1/chat ")
            .expect("url should set");

        let len = credentials
            .with_api_key(ProviderId::Anthropic, str::len)
            .expect("lock");
        assert_eq!(len, Some(8));
        assert_eq!(
            credentials.endpoint(ProviderId::Custom).expect("lock").as_deref(),
            Some("http://localhost:1234/v1/chat")
        );

        assert!(credentials.clear(ProviderId::Anthropic).expect("lock"));
        assert!(!credentials.has_api_key(ProviderId::Anthropic).expect("lock"));
        assert!(!credentials.clear(ProviderId::Anthropic).expect("lock"));
    }

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let secret = SecretString::new("sk-very-secret");
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
    }
}
