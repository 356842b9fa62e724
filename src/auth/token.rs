//! Bearer token model and the lifecycle states the broker reports.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Lifecycle status of the broker's cached token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenStatus {
	/// No token has ever been obtained.
	Empty,
	/// A token is cached and has not expired.
	Valid,
	/// The cached token's expiration has passed.
	Expired,
	/// The caller discarded the token after a downstream authentication failure.
	Invalidated,
}
impl TokenStatus {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenStatus::Empty => "empty",
			TokenStatus::Valid => "valid",
			TokenStatus::Expired => "expired",
			TokenStatus::Invalidated => "invalidated",
		}
	}
}
impl Display for TokenStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Opaque credential presented on protected API calls.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearerToken {
	/// Token value; callers must avoid logging it.
	pub value: TokenSecret,
	/// Expiry instant, inherited from the temporary credentials that minted the token.
	pub expires_at: OffsetDateTime,
}
impl BearerToken {
	/// Creates a token record.
	pub fn new(value: impl Into<String>, expires_at: OffsetDateTime) -> Self {
		Self { value: TokenSecret::new(value), expires_at }
	}

	/// Returns `true` when the token is non-empty and unexpired at `instant`.
	pub fn is_valid_at(&self, instant: OffsetDateTime) -> bool {
		!self.value.is_empty() && instant < self.expires_at
	}

	/// Expiration as whole seconds since the Unix epoch.
	pub fn expiration_epoch_seconds(&self) -> i64 {
		self.expires_at.unix_timestamp()
	}

	/// Value for an `Authorization` header.
	pub fn authorization_header(&self) -> String {
		format!("Bearer {}", self.value.expose())
	}
}
impl Debug for BearerToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BearerToken")
			.field("value", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
