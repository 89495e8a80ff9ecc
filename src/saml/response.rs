//! AuthnResponse validation.
//!
//! Each step is a hard gate: structural parse, signature verification
//! against the configured IdP trust, protocol status, assertion acceptance.
//! Any failure is terminal for the login attempt and leaves no partial
//! trust behind.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use samael::schema::{Assertion, Response};
use tracing::{info, warn};

use crate::error::AuthError;

use super::trust::TrustContext;

const STATUS_SUCCESS: &str = "urn:oasis:names:tc:SAML:2.0:status:Success";

/// An assertion that passed signature verification and the status check.
///
/// Carries the raw posted response alongside: on successful sign-in that
/// payload becomes the bearer token value, so it is a secret from here on.
#[derive(Debug)]
pub struct ValidatedAssertion {
    pub assertion: Assertion,
    pub raw_response: String,
}

/// Validate a raw (base64, as posted) SAML response against a trust context.
pub fn validate_response(
    ctx: &TrustContext,
    raw_response: &str,
) -> Result<ValidatedAssertion, AuthError> {
    let decoded = BASE64
        .decode(raw_response)
        .map_err(|e| AuthError::Signature(format!("response is not valid base64: {e}")))?;
    let xml = String::from_utf8(decoded)
        .map_err(|e| AuthError::Signature(format!("response is not valid UTF-8: {e}")))?;
    let response: Response = xml
        .parse()
        .map_err(|e| AuthError::Signature(format!("cannot parse SAML response: {e}")))?;

    // Signature verification, condition checks, and assertion binding in one
    // pass; failures are classified against the parsed response so a
    // non-success status is never reported as a signature problem.
    match ctx.sp.parse_xml_response(&xml, None) {
        Ok(assertion) => {
            check_status(&response)?;
            info!(provider = %ctx.provider_id, "SAML response validated");
            Ok(ValidatedAssertion {
                assertion,
                raw_response: raw_response.to_string(),
            })
        }
        Err(err) => {
            check_status(&response)?;
            if response.assertion.is_none() {
                warn!(provider = %ctx.provider_id, "SAML response carries no assertion");
                return Err(AuthError::Assertion(
                    "response contains no assertion".to_string(),
                ));
            }
            warn!(provider = %ctx.provider_id, error = %err, "SAML response rejected");
            Err(AuthError::Signature(err.to_string()))
        }
    }
}

/// Enforce the protocol status. A missing status block fails closed.
fn check_status(response: &Response) -> Result<(), AuthError> {
    let status = response
        .status
        .as_ref()
        .ok_or_else(|| AuthError::Status("response carries no status".to_string()))?;

    let value = status.status_code.value.as_deref();
    if value != Some(STATUS_SUCCESS) {
        let detail = status
            .status_message
            .as_ref()
            .and_then(|m| m.value.clone())
            .or_else(|| value.map(str::to_string))
            .unwrap_or_else(|| "unknown status".to_string());
        return Err(AuthError::Status(detail));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saml::testdata;
    use crate::saml::trust::build_context;

    #[test]
    fn test_signed_response_accepted() {
        let ctx = build_context(&testdata::provider_config()).unwrap();
        let validated = validate_response(&ctx, testdata::SIGNED_SUCCESS_RESPONSE_B64).unwrap();

        let name_id = validated
            .assertion
            .subject
            .as_ref()
            .and_then(|s| s.name_id.as_ref())
            .map(|n| n.value.clone())
            .unwrap();
        assert_eq!(name_id, "alice@example.com");
        // The posted payload is preserved verbatim for token issuance.
        assert_eq!(validated.raw_response, testdata::SIGNED_SUCCESS_RESPONSE_B64);
    }

    #[test]
    fn test_signed_response_tamper_rejected() {
        let ctx = build_context(&testdata::provider_config()).unwrap();
        // Re-encode with the subject swapped; the digest no longer matches.
        let xml = String::from_utf8(BASE64.decode(testdata::SIGNED_SUCCESS_RESPONSE_B64).unwrap())
            .unwrap()
            .replace("alice@example.com", "mallory@example.com");
        let err = validate_response(&ctx, &testdata::encode(&xml)).unwrap_err();
        assert!(matches!(err, AuthError::Signature(_)));
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let ctx = build_context(&testdata::provider_config()).unwrap();
        let err = validate_response(&ctx, "%%% not base64 %%%").unwrap_err();
        assert!(matches!(err, AuthError::Signature(_)));
    }

    #[test]
    fn test_garbage_xml_rejected() {
        let ctx = build_context(&testdata::provider_config()).unwrap();
        let raw = testdata::encode("this is not a SAML response");
        let err = validate_response(&ctx, &raw).unwrap_err();
        assert!(matches!(err, AuthError::Signature(_)));
    }

    #[test]
    fn test_unsigned_response_rejected() {
        let ctx = build_context(&testdata::provider_config()).unwrap();
        let xml = testdata::success_response(Some("alice@example.com"), "");
        let err = validate_response(&ctx, &testdata::encode(&xml)).unwrap_err();
        // Status is success but nothing is signed: the signature gate fails.
        assert!(matches!(err, AuthError::Signature(_)));
    }

    #[test]
    fn test_non_success_status_rejected() {
        let ctx = build_context(&testdata::provider_config()).unwrap();
        let xml = testdata::failure_response("urn:oasis:names:tc:SAML:2.0:status:Responder");
        let err = validate_response(&ctx, &testdata::encode(&xml)).unwrap_err();
        assert!(matches!(err, AuthError::Status(_)));
    }

    #[test]
    fn test_missing_status_rejected() {
        let ctx = build_context(&testdata::provider_config()).unwrap();
        let xml = testdata::success_response(Some("alice@example.com"), "")
            .replace(
                "<samlp:Status><samlp:StatusCode Value=\"urn:oasis:names:tc:SAML:2.0:status:Success\"/></samlp:Status>",
                "",
            );
        let err = validate_response(&ctx, &testdata::encode(&xml)).unwrap_err();
        assert!(matches!(err, AuthError::Status(_)));
    }
}
