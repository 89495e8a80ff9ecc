//! Local account records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A local user account, possibly bound to a federated identity.
///
/// The password field holds whatever opaque credential hash the deployment
/// uses; this crate only cares whether one is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalAccount {
    pub id: Uuid,
    pub login: String,

    /// Opaque password credential, `None` when password login is disabled.
    pub password: Option<String>,

    /// Provider side of the federated binding.
    pub saml_provider_id: Option<String>,

    /// Matching value side of the federated binding.
    pub saml_subject_id: Option<String>,

    pub superuser: bool,
    pub admin: bool,
}

impl LocalAccount {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            login: login.into(),
            password: None,
            saml_provider_id: None,
            saml_subject_id: None,
            superuser: false,
            admin: false,
        }
    }

    /// Both halves of the binding must be present for it to count.
    pub fn has_saml_binding(&self) -> bool {
        self.saml_provider_id.is_some() && self.saml_subject_id.is_some()
    }

    pub fn has_password(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Superusers and admins are exempt from the coexistence policy.
    pub fn is_exempt(&self) -> bool {
        self.superuser || self.admin
    }
}
