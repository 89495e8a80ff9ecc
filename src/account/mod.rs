//! Local accounts, their storage seam, and the credential coexistence policy.

pub mod policy;
pub mod store;
pub mod types;

pub use policy::{PasswordPolicy, PasswordPolicyGuard};
pub use store::{AccountStore, InMemoryAccountStore};
pub use types::LocalAccount;
