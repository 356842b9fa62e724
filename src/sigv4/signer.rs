//! Signing-key derivation, signature computation, and `Authorization` header assembly.

// crates.io
use hmac::{Hmac, Mac};
use sha2::Sha256;
// self
use crate::{
	_prelude::*,
	auth::TemporaryCredentials,
	sigv4::{ALGORITHM, AmzTimestamp, CanonicalRequest, SCOPE_TERMINATOR, SignatureError},
};

type HmacSha256 = Hmac<Sha256>;

/// Region/service pair scoping a signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SigningScope<'a> {
	/// Signing region, e.g. `us-west-2`.
	pub region: &'a str,
	/// Signing service, e.g. `execute-api`.
	pub service: &'a str,
}
impl SigningScope<'_> {
	/// `date/region/service/aws4_request` credential scope.
	pub fn credential_scope(&self, date: &str) -> String {
		format!("{date}/{}/{}/{SCOPE_TERMINATOR}", self.region, self.service)
	}
}

/// Result of signing one request.
#[derive(Clone, PartialEq, Eq)]
pub struct Authorization {
	/// Lowercase hex signature.
	pub signature: String,
	/// Complete `Authorization` header value.
	pub header: String,
}
impl Debug for Authorization {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Authorization").field("signature", &self.signature).finish()
	}
}

/// Builds the string-to-sign for a canonical request.
pub fn string_to_sign(
	timestamp: &AmzTimestamp,
	scope: SigningScope<'_>,
	canonical: &CanonicalRequest,
) -> String {
	format!(
		"{ALGORITHM}\n{}\n{}\n{}",
		timestamp.datetime(),
		scope.credential_scope(timestamp.date()),
		canonical.hashed()
	)
}

/// Derives the day/region/service-scoped signing key from a secret key.
pub fn signing_key(
	secret_key: &str,
	date: &str,
	scope: SigningScope<'_>,
) -> Result<[u8; 32], SignatureError> {
	let date_key = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date.as_bytes())?;
	let region_key = hmac_sha256(&date_key, scope.region.as_bytes())?;
	let service_key = hmac_sha256(&region_key, scope.service.as_bytes())?;

	hmac_sha256(&service_key, SCOPE_TERMINATOR.as_bytes())
}

/// Signs `canonical` with `credentials` and returns the signature plus `Authorization` header.
///
/// `timestamp` must be the same value placed in the request's `x-amz-date` header.
pub fn authorize(
	credentials: &TemporaryCredentials,
	timestamp: &AmzTimestamp,
	scope: SigningScope<'_>,
	canonical: &CanonicalRequest,
) -> Result<Authorization, SignatureError> {
	let key = signing_key(credentials.secret_key.expose(), timestamp.date(), scope)?;
	let to_sign = string_to_sign(timestamp, scope, canonical);
	let signature = hex::encode(hmac_sha256(&key, to_sign.as_bytes())?);
	let header = format!(
		"{ALGORITHM} Credential={}/{}, SignedHeaders={}, Signature={signature}",
		credentials.access_key_id,
		scope.credential_scope(timestamp.date()),
		canonical.signed_headers(),
	);

	Ok(Authorization { signature, header })
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<[u8; 32], SignatureError> {
	let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SignatureError::InvalidKey)?;

	mac.update(data);

	let mut out = [0_u8; 32];

	out.copy_from_slice(&mac.finalize().into_bytes());

	Ok(out)
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	const SCOPE: SigningScope<'static> = SigningScope { region: "us-west-2", service: "execute-api" };

	fn scenario_credentials() -> TemporaryCredentials {
		TemporaryCredentials::new("AKIAEXAMPLE", "secret", "sess", datetime!(2024-01-01 01:00 UTC))
	}

	fn scenario_canonical(host: &str) -> CanonicalRequest {
		CanonicalRequest::new(
			"GET",
			"/production/generate-token",
			[("host", host), ("x-amz-date", "20240101T000000Z"), ("x-amz-security-token", "sess")],
		)
		.expect("Canonical request should build.")
	}

	#[test]
	fn signing_key_matches_published_derivation() {
		let key = signing_key(
			"wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
			"20120215",
			SigningScope { region: "us-east-1", service: "iam" },
		)
		.expect("Signing key should derive.");

		assert_eq!(
			hex::encode(key),
			"f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
		);
	}

	#[test]
	fn string_to_sign_layout() {
		let timestamp =
			AmzTimestamp::at(datetime!(2024-01-01 00:00 UTC)).expect("Timestamp should format.");
		let canonical = scenario_canonical("pstktaeh2e.execute-api.us-west-2.amazonaws.com");

		assert_eq!(
			string_to_sign(&timestamp, SCOPE, &canonical),
			"AWS4-HMAC-SHA256\n20240101T000000Z\n20240101/us-west-2/execute-api/aws4_request\n\
			 e4aa4dc7d3cacbc04dff4f896afc8b4ee920a8664be5d9fc5793b49553f57955"
		);
	}

	#[test]
	fn golden_authorization_header() {
		let timestamp =
			AmzTimestamp::at(datetime!(2024-01-01 00:00 UTC)).expect("Timestamp should format.");
		let canonical = scenario_canonical("pstktaeh2e.execute-api.us-west-2.amazonaws.com");
		let auth = authorize(&scenario_credentials(), &timestamp, SCOPE, &canonical)
			.expect("Signing should succeed.");

		assert_eq!(
			auth.signature,
			"6fa8e7cf572f659a609c767106458afb308de85e50d0a00f3d7d4c1f725e2ee9"
		);
		assert_eq!(
			auth.header,
			"AWS4-HMAC-SHA256 Credential=AKIAEXAMPLE/20240101/us-west-2/execute-api/aws4_request, \
			 SignedHeaders=host;x-amz-date;x-amz-security-token, \
			 Signature=6fa8e7cf572f659a609c767106458afb308de85e50d0a00f3d7d4c1f725e2ee9"
		);
	}

	#[test]
	fn host_port_changes_the_signature() {
		let timestamp =
			AmzTimestamp::at(datetime!(2024-01-01 00:00 UTC)).expect("Timestamp should format.");
		let auth = authorize(
			&scenario_credentials(),
			&timestamp,
			SCOPE,
			&scenario_canonical("127.0.0.1:8443"),
		)
		.expect("Signing should succeed.");

		assert_eq!(
			auth.signature,
			"e9aca551155f59b62b2deb0575188083b8c3151e90467bd332c11483f8726dad"
		);
	}

	#[test]
	fn signing_is_deterministic() {
		let timestamp =
			AmzTimestamp::at(datetime!(2024-01-01 00:00 UTC)).expect("Timestamp should format.");
		let canonical = scenario_canonical("pstktaeh2e.execute-api.us-west-2.amazonaws.com");
		let first = authorize(&scenario_credentials(), &timestamp, SCOPE, &canonical)
			.expect("Signing should succeed.");
		let second = authorize(&scenario_credentials(), &timestamp, SCOPE, &canonical)
			.expect("Signing should succeed.");

		assert_eq!(first, second);
	}
}
