//! Identity-provider configuration.
//!
//! A [`ProviderConfig`] holds everything needed to build a trust context for
//! one IdP; the [`ProviderRegistry`] is the in-process view of the provider
//! configuration store.

pub mod config;
pub mod registry;

pub use config::{ProviderConfig, MATCHING_ATTRIBUTE_NAME_ID};
pub use registry::ProviderRegistry;
