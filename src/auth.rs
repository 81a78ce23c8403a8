//! Credential models: the access-token record, the authentication request, and secret wrappers.

pub mod credential;
pub mod secret;

pub use credential::*;
pub use secret::*;
