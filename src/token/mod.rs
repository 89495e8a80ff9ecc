//! Bearer token persistence.

pub mod store;

pub use store::{SamlToken, TokenStore};
