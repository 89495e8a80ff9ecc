//! In-process provider configuration store.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::AuthError;

use super::config::ProviderConfig;

/// Registry of configured identity providers.
///
/// Mirrors the provider-configuration store interface: lookup by id and an
/// ordered enumeration of enabled providers for login-page rendering.
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, ProviderConfig>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace a provider configuration.
    pub fn upsert(&self, config: ProviderConfig) -> Result<(), AuthError> {
        let mut providers = self
            .providers
            .write()
            .map_err(|_| AuthError::Store("provider registry lock poisoned".to_string()))?;
        providers.insert(config.id.clone(), config);
        Ok(())
    }

    /// Remove a provider configuration.
    pub fn remove(&self, id: &str) -> Result<bool, AuthError> {
        let mut providers = self
            .providers
            .write()
            .map_err(|_| AuthError::Store("provider registry lock poisoned".to_string()))?;
        Ok(providers.remove(id).is_some())
    }

    /// Fetch a provider usable for login. Unknown or disabled providers are
    /// a configuration error; they must never reach request building or
    /// response validation.
    pub fn get(&self, id: &str) -> Result<ProviderConfig, AuthError> {
        let providers = self
            .providers
            .read()
            .map_err(|_| AuthError::Store("provider registry lock poisoned".to_string()))?;

        match providers.get(id) {
            Some(p) if p.enabled => Ok(p.clone()),
            Some(_) => Err(AuthError::Config(format!("provider {id} is disabled"))),
            None => Err(AuthError::Config(format!("unknown provider {id}"))),
        }
    }

    /// Enabled providers ordered by (sequence, name), for the login page.
    pub fn enabled_ordered(&self) -> Result<Vec<ProviderConfig>, AuthError> {
        let providers = self
            .providers
            .read()
            .map_err(|_| AuthError::Store("provider registry lock poisoned".to_string()))?;

        let mut enabled: Vec<ProviderConfig> =
            providers.values().filter(|p| p.enabled).cloned().collect();
        enabled.sort_by(|a, b| a.sequence.cmp(&b.sequence).then_with(|| a.name.cmp(&b.name)));
        Ok(enabled)
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
