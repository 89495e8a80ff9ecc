//! AuthnRequest construction.

use samael::schema::NameIdPolicy;
use serde::Serialize;
use tracing::debug;

use crate::error::AuthError;

use super::trust::TrustContext;

/// Build the redirect URL that sends the browser to the IdP with a signed
/// AuthnRequest.
///
/// Must be called freshly for every login attempt: request identifiers are
/// single-use, so the produced URL must never be cached or replayed. The
/// relay state is JSON-encoded into the RelayState channel and comes back
/// unmodified with the IdP's response; no server-side request state is kept.
pub fn build_login_redirect<S: Serialize>(
    ctx: &TrustContext,
    relay_state: &S,
) -> Result<String, AuthError> {
    let mut request = ctx
        .sp
        .make_authentication_request(&ctx.idp_sso_url)
        .map_err(|e| AuthError::Config(format!("cannot build authentication request: {e}")))?;

    // No NameID format constraint; the IdP may create a new federated
    // identity for us.
    request.name_id_policy = Some(NameIdPolicy {
        format: None,
        sp_name_qualifier: None,
        allow_create: Some(true),
    });

    let relay = serde_json::to_string(relay_state)
        .map_err(|e| AuthError::Config(format!("relay state is not serializable: {e}")))?;

    // Redirect binding: deflate + base64 + URL encoding, signed RSA-SHA256.
    let url = request
        .signed_redirect(&relay, &ctx.signing_key_der)
        .map_err(|e| AuthError::Config(format!("cannot sign authentication request: {e}")))?
        .ok_or_else(|| {
            AuthError::Config("signing the authentication request produced no URL".to_string())
        })?;

    debug!(provider = %ctx.provider_id, "built AuthnRequest redirect");
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saml::testdata;
    use crate::saml::trust::build_context;
    use std::collections::HashMap;

    fn relay() -> HashMap<String, String> {
        let mut state = HashMap::new();
        state.insert("redirect".to_string(), "/dashboard".to_string());
        state
    }

    #[test]
    fn test_redirect_url_shape() {
        let ctx = build_context(&testdata::provider_config()).unwrap();
        let url = build_login_redirect(&ctx, &relay()).unwrap();

        assert!(url.starts_with("https://idp.example.com/sso?"));
        assert!(url.contains("SAMLRequest="));
        assert!(url.contains("RelayState="));
        // Signature method is pinned to RSA-SHA256.
        assert!(url.contains("SigAlg="));
        assert!(url.contains("rsa-sha256"));
        assert!(url.contains("Signature="));
    }

    #[test]
    fn test_fresh_request_per_call() {
        let ctx = build_context(&testdata::provider_config()).unwrap();
        let first = build_login_redirect(&ctx, &relay()).unwrap();
        let second = build_login_redirect(&ctx, &relay()).unwrap();
        // Request IDs are single-use, so two calls never produce the same URL.
        assert_ne!(first, second);
    }

    #[test]
    fn test_relay_state_round_trip_encoding() {
        let ctx = build_context(&testdata::provider_config()).unwrap();
        let url = build_login_redirect(&ctx, &serde_json::json!({"next": "/a?b=c"})).unwrap();
        assert!(url.contains("RelayState="));
    }
}
