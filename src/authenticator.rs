//! The authentication engine: wires providers, response validation, account
//! binding, and token issuance into the two entry points a front end needs.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::account::AccountStore;
use crate::error::AuthError;
use crate::provider::ProviderRegistry;
use crate::saml::{
    build_context, build_login_redirect, extract_attributes, resolve_matching_value,
    validate_response, ValidatedAssertion,
};
use crate::token::TokenStore;

/// Result of a completed federated sign-in.
///
/// The token is the bearer credential for subsequent requests; it is a
/// secret and must not be logged.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    /// Database / realm the account lives in.
    pub database: String,
    pub login: String,
    pub token: String,
}

/// SAML service-provider authentication engine.
pub struct SamlAuthenticator {
    database: String,
    providers: Arc<ProviderRegistry>,
    accounts: Arc<dyn AccountStore>,
    tokens: Arc<TokenStore>,
}

impl SamlAuthenticator {
    pub fn new(
        database: impl Into<String>,
        providers: Arc<ProviderRegistry>,
        accounts: Arc<dyn AccountStore>,
        tokens: Arc<TokenStore>,
    ) -> Self {
        Self {
            database: database.into(),
            providers,
            accounts,
            tokens,
        }
    }

    /// Build the IdP redirect URL that starts a login against one provider.
    pub fn login_url<S: Serialize>(
        &self,
        provider_id: &str,
        relay_state: &S,
    ) -> Result<String, AuthError> {
        let config = self.providers.get(provider_id)?;
        let ctx = build_context(&config)?;
        build_login_redirect(&ctx, relay_state)
    }

    /// Validate a posted SAML response and sign the bound account in.
    pub fn authenticate(
        &self,
        provider_id: &str,
        raw_response: &str,
    ) -> Result<AuthOutcome, AuthError> {
        let config = self.providers.get(provider_id)?;
        let ctx = build_context(&config)?;
        let validated = validate_response(&ctx, raw_response)?;
        self.complete_login(provider_id, &ctx.matching_attribute, validated)
    }

    /// Check a presented bearer credential for an account.
    ///
    /// Matches against any provider's token for the account; a stale value
    /// from before the latest re-login no longer matches anything.
    pub fn check_credential(&self, user_id: Uuid, presented: &str) -> Result<(), AuthError> {
        match self.tokens.find_by_user_and_value(user_id, presented)? {
            Some(_) => Ok(()),
            None => Err(AuthError::AccessDenied),
        }
    }

    /// Resolve the matching value out of a validated assertion and sign in.
    fn complete_login(
        &self,
        provider_id: &str,
        matching_attribute: &str,
        validated: ValidatedAssertion,
    ) -> Result<AuthOutcome, AuthError> {
        let attrs = extract_attributes(&validated.assertion);
        let value = resolve_matching_value(&validated.assertion, &attrs, matching_attribute)?;
        if value.is_empty() {
            debug!(provider = %provider_id, "assertion matching value is empty");
            return Err(AuthError::AccessDenied);
        }
        self.sign_in(provider_id, &value, validated.raw_response)
    }

    /// Look up the bound account and issue its bearer token.
    fn sign_in(
        &self,
        provider_id: &str,
        subject_id: &str,
        raw_response: String,
    ) -> Result<AuthOutcome, AuthError> {
        let account = match self
            .accounts
            .find_by_provider_binding(provider_id, subject_id)?
        {
            Some(account) => account,
            None => {
                // Identity is valid at the IdP but bound to no local account;
                // provisioning is an administrative act, not a login side
                // effect.
                debug!(provider = %provider_id, "no account bound to federated identity");
                return Err(AuthError::AccessDenied);
            }
        };

        let token = self.tokens.upsert(account.id, provider_id, raw_response)?;
        info!(user_id = %account.id, login = %account.login, provider = %provider_id, "federated sign-in");

        Ok(AuthOutcome {
            database: self.database.clone(),
            login: account.login,
            token: token.value,
        })
    }
}
