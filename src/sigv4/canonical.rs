//! Canonical request construction.

// crates.io
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	sigv4::{SIGNED_HEADERS, SignatureError},
};

/// Host and URI path of a URL, with the scheme stripped.
///
/// The host keeps an explicit non-default port (`127.0.0.1:8443`), matching what an HTTP
/// client sends in its `Host` header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitUrl {
	/// Authority used for the `host` header.
	pub host: String,
	/// Path used as the canonical URI.
	pub uri: String,
}
impl SplitUrl {
	/// Splits `url` into host and URI path.
	pub fn new(url: &Url) -> Result<Self, SignatureError> {
		let host =
			url.host_str().ok_or_else(|| SignatureError::MissingHost { url: url.to_string() })?;
		let host = match url.port() {
			Some(port) => format!("{host}:{port}"),
			None => host.to_owned(),
		};

		Ok(Self { host, uri: url.path().to_owned() })
	}
}

/// Canonical request plus the signed-header list that accompanies it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalRequest {
	canonical: String,
	signed_headers: String,
}
impl CanonicalRequest {
	/// Builds the canonical form of a body-less request.
	///
	/// `headers` may arrive in any order and may contain extra entries; only the fixed signed
	/// set is emitted, sorted by name.
	pub fn new<I, K, V>(method: &str, uri: &str, headers: I) -> Result<Self, SignatureError>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let supplied = headers
			.into_iter()
			.map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.as_ref().to_owned()))
			.collect::<BTreeMap<_, _>>();
		let mut canonical_headers = String::new();

		for name in signed_header_names() {
			let value = supplied
				.get(name)
				.ok_or(SignatureError::MissingSignedHeader { name })?;

			canonical_headers.push_str(name);
			canonical_headers.push(':');
			canonical_headers.push_str(value);
			canonical_headers.push('\n');
		}

		let signed_headers = signed_header_names().collect::<Vec<_>>().join(";");
		let canonical = format!(
			"{method}\n{uri}\n\n{canonical_headers}\n{signed_headers}\n{}",
			empty_payload_hash()
		);

		Ok(Self { canonical, signed_headers })
	}

	/// Full canonical request string.
	pub fn as_str(&self) -> &str {
		&self.canonical
	}

	/// `;`-joined, sorted signed-header names.
	pub fn signed_headers(&self) -> &str {
		&self.signed_headers
	}

	/// Lowercase hex SHA-256 of the canonical request.
	pub fn hashed(&self) -> String {
		hex::encode(Sha256::digest(self.canonical.as_bytes()))
	}
}
impl Display for CanonicalRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.canonical)
	}
}

/// Lowercase hex SHA-256 of an empty body.
pub fn empty_payload_hash() -> String {
	hex::encode(Sha256::digest(b""))
}

fn signed_header_names() -> impl Iterator<Item = &'static str> {
	let mut names = SIGNED_HEADERS;

	names.sort_unstable();

	names.into_iter()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const EXPECTED: &str = "GET\n/production/generate-token\n\n\
		host:pstktaeh2e.execute-api.us-west-2.amazonaws.com\n\
		x-amz-date:20240101T000000Z\n\
		x-amz-security-token:sess\n\n\
		host;x-amz-date;x-amz-security-token\n\
		e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

	#[test]
	fn split_url_strips_scheme_and_keeps_port() {
		let prod = Url::parse(
			"https://pstktaeh2e.execute-api.us-west-2.amazonaws.com/production/generate-token",
		)
		.expect("Production URL should parse.");
		let local = Url::parse("https://127.0.0.1:8443/production/generate-token")
			.expect("Local URL should parse.");

		assert_eq!(
			SplitUrl::new(&prod).expect("Production URL should split."),
			SplitUrl {
				host: "pstktaeh2e.execute-api.us-west-2.amazonaws.com".into(),
				uri: "/production/generate-token".into(),
			}
		);
		assert_eq!(SplitUrl::new(&local).expect("Local URL should split.").host, "127.0.0.1:8443");
		assert!(matches!(
			SplitUrl::new(&Url::parse("data:text/plain,x").expect("Data URL should parse.")),
			Err(SignatureError::MissingHost { .. })
		));
	}

	#[test]
	fn canonical_headers_are_sorted_regardless_of_input_order() {
		let reversed = [
			("x-amz-security-token", "sess"),
			("x-amz-date", "20240101T000000Z"),
			("host", "pstktaeh2e.execute-api.us-west-2.amazonaws.com"),
		];
		let request = CanonicalRequest::new("GET", "/production/generate-token", reversed)
			.expect("Canonical request should build.");

		assert_eq!(request.as_str(), EXPECTED);
		assert_eq!(request.signed_headers(), "host;x-amz-date;x-amz-security-token");
	}

	#[test]
	fn every_header_line_ends_with_newline() {
		let request = CanonicalRequest::new(
			"GET",
			"/production/generate-token",
			[
				("host", "example.com"),
				("x-amz-date", "20240101T000000Z"),
				("x-amz-security-token", "sess"),
			],
		)
		.expect("Canonical request should build.");
		let lines = request.as_str().split('\n').collect::<Vec<_>>();

		// method, uri, empty query, three headers, blank terminator, signed list, payload hash
		assert_eq!(lines.len(), 9);
		assert_eq!(lines[5], "x-amz-security-token:sess");
		assert_eq!(lines[6], "");
	}

	#[test]
	fn unsigned_headers_are_ignored_and_missing_ones_rejected() {
		let request = CanonicalRequest::new(
			"GET",
			"/production/generate-token",
			[
				("accept", "application/json, text/plain, */*"),
				("Host", "pstktaeh2e.execute-api.us-west-2.amazonaws.com"),
				("x-amz-security-token", "sess"),
				("x-amz-date", "20240101T000000Z"),
			],
		)
		.expect("Extra headers should not break canonicalization.");

		assert_eq!(request.as_str(), EXPECTED);
		assert_eq!(
			CanonicalRequest::new("GET", "/", [("host", "example.com")]),
			Err(SignatureError::MissingSignedHeader { name: "x-amz-date" })
		);
	}

	#[test]
	fn canonical_hash_matches_reference() {
		let request = CanonicalRequest::new(
			"GET",
			"/production/generate-token",
			[
				("host", "pstktaeh2e.execute-api.us-west-2.amazonaws.com"),
				("x-amz-date", "20240101T000000Z"),
				("x-amz-security-token", "sess"),
			],
		)
		.expect("Canonical request should build.");

		assert_eq!(
			request.hashed(),
			"e4aa4dc7d3cacbc04dff4f896afc8b4ee920a8664be5d9fc5793b49553f57955"
		);
		assert_eq!(
			empty_payload_hash(),
			"e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
		);
	}
}
