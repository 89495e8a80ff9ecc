//! Password / SAML coexistence policy.
//!
//! When coexistence is disallowed, a non-exempt account may hold a password
//! or a federated binding but never both. The guard enforces this at every
//! credential mutation; the reconcile sweep repairs records that predate the
//! policy.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::AuthError;

use super::store::AccountStore;

/// Coexistence policy configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PasswordPolicy {
    /// Allow an account to keep a password alongside a federated binding.
    #[serde(default)]
    pub allow_saml_and_password: bool,
}

/// Routes credential mutations through the coexistence policy.
pub struct PasswordPolicyGuard {
    store: Arc<dyn AccountStore>,
    policy: PasswordPolicy,
}

impl PasswordPolicyGuard {
    pub fn new(store: Arc<dyn AccountStore>, policy: PasswordPolicy) -> Self {
        Self { store, policy }
    }

    /// Set or clear an account's password.
    ///
    /// Rejected with [`AuthError::PolicyViolation`] when the account is
    /// non-exempt, federated, and coexistence is disallowed. Clearing is
    /// always permitted.
    pub fn set_password(&self, id: Uuid, password: Option<String>) -> Result<(), AuthError> {
        let account = self
            .store
            .find_by_id(id)
            .map_err(AuthError::from)?
            .ok_or_else(|| AuthError::Store(format!("no account {id}")))?;

        let setting = password.as_deref().is_some_and(|p| !p.is_empty());
        if setting
            && !self.policy.allow_saml_and_password
            && !account.is_exempt()
            && account.has_saml_binding()
        {
            return Err(AuthError::PolicyViolation {
                logins: account.login,
            });
        }

        self.store.write_password(id, password).map_err(AuthError::from)
    }

    /// Bind or unbind a federated identity.
    ///
    /// Binding a non-exempt account that still holds a password is rejected
    /// under disallowed coexistence; the caller must clear the password
    /// first, an existing credential is never silently destroyed.
    pub fn set_provider_binding(
        &self,
        id: Uuid,
        binding: Option<(String, String)>,
    ) -> Result<(), AuthError> {
        let account = self
            .store
            .find_by_id(id)
            .map_err(AuthError::from)?
            .ok_or_else(|| AuthError::Store(format!("no account {id}")))?;

        if binding.is_some()
            && !self.policy.allow_saml_and_password
            && !account.is_exempt()
            && account.has_password()
        {
            return Err(AuthError::PolicyViolation {
                logins: account.login,
            });
        }

        self.store
            .write_provider_binding(id, binding)
            .map_err(AuthError::from)
    }

    /// Sweep all accounts and clear passwords that violate the policy.
    ///
    /// Idempotent; returns the number of accounts repaired. A no-op while
    /// coexistence is allowed.
    pub fn reconcile(&self) -> Result<usize, AuthError> {
        if self.policy.allow_saml_and_password {
            return Ok(0);
        }

        let mut repaired = 0;
        for account in self.store.accounts().map_err(AuthError::from)? {
            if account.is_exempt() || !account.has_saml_binding() || !account.has_password() {
                continue;
            }
            debug!(login = %account.login, "clearing password on federated account");
            self.store
                .write_password(account.id, None)
                .map_err(AuthError::from)?;
            repaired += 1;
        }
        Ok(repaired)
    }
}
