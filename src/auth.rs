//! Credential-bearing values: redacted secrets and per-request bearer tokens.

pub mod secret;
pub mod token;

pub use secret::*;
pub use token::*;
