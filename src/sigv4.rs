//! Simplified AWS Signature Version 4 for a single body-less GET.
//!
//! Only the fixed header set `host`, `x-amz-date`, and `x-amz-security-token` is signed, the
//! canonical query string is always empty, and the payload hash is the hash of an empty body.
//! The output must match a conforming verifier byte for byte, so every separator below is
//! significant.

pub mod canonical;
pub mod signer;
pub mod timestamp;

pub use canonical::*;
pub use signer::*;
pub use timestamp::*;

// self
use crate::_prelude::*;

/// Signing algorithm label used in the string-to-sign and the `Authorization` header.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
/// Terminator of the credential scope.
pub const SCOPE_TERMINATOR: &str = "aws4_request";
/// `host` header name.
pub const HOST: &str = "host";
/// `x-amz-date` header name.
pub const X_AMZ_DATE: &str = "x-amz-date";
/// `x-amz-security-token` header name.
pub const X_AMZ_SECURITY_TOKEN: &str = "x-amz-security-token";
/// Headers covered by the signature, in canonical (byte-sorted) order.
pub const SIGNED_HEADERS: [&str; 3] = [HOST, X_AMZ_DATE, X_AMZ_SECURITY_TOKEN];

/// Malformed input handed to canonicalization or signing.
///
/// These indicate a broken caller contract rather than a runtime condition; correct usage of
/// the pipeline never produces them.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum SignatureError {
	/// URL carries no host component.
	#[error("Cannot sign a URL without a host: {url}.")]
	MissingHost {
		/// Offending URL.
		url: String,
	},
	/// One of the fixed signed headers was not supplied.
	#[error("Signed header `{name}` was not supplied.")]
	MissingSignedHeader {
		/// Missing header name.
		name: &'static str,
	},
	/// Instant could not be rendered as an `x-amz-date` value.
	#[error("Signing instant could not be formatted: {reason}.")]
	Timestamp {
		/// Formatter failure description.
		reason: String,
	},
	/// HMAC rejected the derived key.
	#[error("HMAC key was rejected.")]
	InvalidKey,
}
