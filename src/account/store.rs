//! Account storage interface and the in-memory implementation.

use anyhow::{anyhow, bail, Result};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use super::types::LocalAccount;

/// Storage seam for local accounts.
///
/// Write operations here are raw: the coexistence policy lives in
/// [`super::policy::PasswordPolicyGuard`], which deployments should route
/// all credential mutations through.
pub trait AccountStore: Send + Sync {
    fn find_by_id(&self, id: Uuid) -> Result<Option<LocalAccount>>;

    /// Look up the account bound to `(provider, subject)`.
    fn find_by_provider_binding(
        &self,
        provider_id: &str,
        subject_id: &str,
    ) -> Result<Option<LocalAccount>>;

    fn accounts(&self) -> Result<Vec<LocalAccount>>;

    /// Overwrite the password credential, `None` to clear it.
    fn write_password(&self, id: Uuid, password: Option<String>) -> Result<()>;

    /// Overwrite the federated binding, `None` to unbind.
    fn write_provider_binding(&self, id: Uuid, binding: Option<(String, String)>) -> Result<()>;
}

/// In-memory account store.
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<Uuid, LocalAccount>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, account: LocalAccount) -> Result<()> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| anyhow!("account store lock poisoned"))?;
        accounts.insert(account.id, account);
        Ok(())
    }
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStore for InMemoryAccountStore {
    fn find_by_id(&self, id: Uuid) -> Result<Option<LocalAccount>> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| anyhow!("account store lock poisoned"))?;
        Ok(accounts.get(&id).cloned())
    }

    fn find_by_provider_binding(
        &self,
        provider_id: &str,
        subject_id: &str,
    ) -> Result<Option<LocalAccount>> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| anyhow!("account store lock poisoned"))?;
        Ok(accounts
            .values()
            .find(|a| {
                a.saml_provider_id.as_deref() == Some(provider_id)
                    && a.saml_subject_id.as_deref() == Some(subject_id)
            })
            .cloned())
    }

    fn accounts(&self) -> Result<Vec<LocalAccount>> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| anyhow!("account store lock poisoned"))?;
        Ok(accounts.values().cloned().collect())
    }

    fn write_password(&self, id: Uuid, password: Option<String>) -> Result<()> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| anyhow!("account store lock poisoned"))?;
        let account = accounts
            .get_mut(&id)
            .ok_or_else(|| anyhow!("no account {id}"))?;
        account.password = password;
        Ok(())
    }

    fn write_provider_binding(&self, id: Uuid, binding: Option<(String, String)>) -> Result<()> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| anyhow!("account store lock poisoned"))?;

        if let Some((provider, subject)) = &binding {
            let taken = accounts
                .values()
                .any(|a| {
                    a.id != id
                        && a.saml_provider_id.as_deref() == Some(provider.as_str())
                        && a.saml_subject_id.as_deref() == Some(subject.as_str())
                });
            if taken {
                bail!("identity {subject} at provider {provider} is already bound");
            }
        }

        let account = accounts
            .get_mut(&id)
            .ok_or_else(|| anyhow!("no account {id}"))?;
        match binding {
            Some((provider, subject)) => {
                account.saml_provider_id = Some(provider);
                account.saml_subject_id = Some(subject);
            }
            None => {
                account.saml_provider_id = None;
                account.saml_subject_id = None;
            }
        }
        Ok(())
    }
}
