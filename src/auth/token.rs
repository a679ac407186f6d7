//! Bearer token issued by the authorization provider.

// self
use crate::{_prelude::*, auth::Secret};

/// Access token produced fresh for a single vote traversal; never cached or persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(Secret);
impl AccessToken {
	/// Wraps a raw token value.
	pub fn new(value: impl Into<String>) -> Self {
		Self(Secret::new(value))
	}

	/// Returns the raw token value for the `Authorization` header.
	pub fn expose(&self) -> &str {
		self.0.expose()
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AccessToken").field(&"<redacted>").finish()
	}
}
