//! SAML protocol layer: trust context construction, AuthnRequest building,
//! response validation, and attribute handling.

pub mod attributes;
pub mod request;
pub mod response;
pub mod trust;

#[cfg(test)]
pub mod testdata;

pub use attributes::{
    extract_attributes, resolve_matching_value, AttributeKey, AttributeMap, NAME_FORMAT_BASIC,
};
pub use request::build_login_redirect;
pub use response::{validate_response, ValidatedAssertion};
pub use trust::{build_context, TrustContext};
