//! SAML2 service-provider authentication engine.
//!
//! Implements the SP side of web-browser SSO: signed AuthnRequests over the
//! HTTP-Redirect binding, validation of posted responses (signature, status,
//! assertion), attribute-based mapping of federated identities onto local
//! accounts, and bearer token issuance backed by an embedded database. A
//! password/SAML coexistence policy keeps non-exempt federated accounts from
//! also holding a password.
//!
//! [`SamlAuthenticator`] is the front door; the web layer supplies the HTTP
//! plumbing and calls [`SamlAuthenticator::login_url`] and
//! [`SamlAuthenticator::authenticate`].

pub mod account;
pub mod authenticator;
pub mod error;
pub mod provider;
pub mod saml;
pub mod token;

pub use account::{
    AccountStore, InMemoryAccountStore, LocalAccount, PasswordPolicy, PasswordPolicyGuard,
};
pub use authenticator::{AuthOutcome, SamlAuthenticator};
pub use error::AuthError;
pub use provider::{ProviderConfig, ProviderRegistry, MATCHING_ATTRIBUTE_NAME_ID};
pub use saml::{TrustContext, ValidatedAssertion};
pub use token::{SamlToken, TokenStore};
