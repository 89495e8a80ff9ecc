//! Error taxonomy for the authentication pipeline.
//!
//! Every component boundary returns a kind a caller can match on. Pipeline
//! errors (signature, status, assertion, attribute resolution) are terminal
//! for the login attempt; the web layer is expected to collapse them into a
//! generic access-denied response while the detail is logged.

use thiserror::Error;

/// Errors produced by the SAML authentication engine.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Provider metadata or key material is unusable. Administrator-visible.
    #[error("provider configuration error: {0}")]
    Config(String),

    /// The response could not be parsed or its signature did not verify
    /// against the configured IdP trust. The underlying cause is preserved
    /// in the message for diagnostics.
    #[error("SAML signature verification failed: {0}")]
    Signature(String),

    /// The response carried a non-success protocol status.
    #[error("SAML response status is not success: {0}")]
    Status(String),

    /// The single-sign-on assertion could not be accepted.
    #[error("SAML assertion rejected: {0}")]
    Assertion(String),

    /// The configured matching attribute was absent from the assertion.
    #[error("matching attribute {selector:?} not found in assertion")]
    AttributeNotFound { selector: String },

    /// No account matched, or a credential check failed. Deliberately
    /// carries no detail; it must be indistinguishable from a failed
    /// password login.
    #[error("access denied")]
    AccessDenied,

    /// An account mutation would violate the password/SAML coexistence
    /// policy. Raised synchronously to the caller attempting the write.
    #[error("accounts may not hold both a password and a SAML binding: {logins}")]
    PolicyViolation { logins: String },

    /// Underlying store failure (token database, account store).
    #[error("store error: {0}")]
    Store(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Store(format!("{err:#}"))
    }
}
