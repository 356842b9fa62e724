//! Temporary credentials issued for a federated identity.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Short-lived access key, secret key, and session token tuple.
///
/// A value belongs to exactly one pipeline run. It is consumed by the token exchange and dropped
/// with the run; nothing merges fields from one run into another.
#[derive(Clone, PartialEq, Eq)]
pub struct TemporaryCredentials {
	/// Access key identifier placed in the `Credential=` scope.
	pub access_key_id: String,
	/// Secret key used to derive the signing key.
	pub secret_key: TokenSecret,
	/// Session token sent as `x-amz-security-token`.
	pub session_token: TokenSecret,
	/// Instant after which the credentials (and any token minted with them) are unusable.
	pub expires_at: OffsetDateTime,
}
impl TemporaryCredentials {
	/// Creates a credential set.
	pub fn new(
		access_key_id: impl Into<String>,
		secret_key: impl Into<String>,
		session_token: impl Into<String>,
		expires_at: OffsetDateTime,
	) -> Self {
		Self {
			access_key_id: access_key_id.into(),
			secret_key: TokenSecret::new(secret_key),
			session_token: TokenSecret::new(session_token),
			expires_at,
		}
	}

	/// Returns `true` if the credentials have expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}
}
impl Debug for TemporaryCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TemporaryCredentials")
			.field("access_key_id", &self.access_key_id)
			.field("secret_key", &"<redacted>")
			.field("session_token", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
