//! Pipeline error types: one variant per network stage plus signing and configuration failures.

// self
use crate::{_prelude::*, config::PipelineConfigError, sigv4::SignatureError};

/// Pipeline-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical pipeline error exposed by public APIs.
///
/// Each network stage owns a variant so callers can tell where the chain stopped; the
/// underlying cause is carried as a [`StageFailure`].
#[derive(Debug, ThisError)]
pub enum Error {
	/// Identity-pool discovery failed.
	#[error("Identity pool discovery failed.")]
	Discovery(#[source] StageFailure),
	/// Identity acquisition (`GetId`) failed.
	#[error("Identity acquisition failed.")]
	Identity(#[source] StageFailure),
	/// Credential acquisition (`GetCredentialsForIdentity`) failed.
	#[error("Credential acquisition failed.")]
	Credential(#[source] StageFailure),
	/// Signed token exchange failed.
	#[error("Token exchange failed.")]
	TokenExchange(#[source] StageFailure),
	/// Canonicalization or signing received malformed input.
	#[error(transparent)]
	Signature(#[from] SignatureError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	/// Returns the stage failure carried by a network-stage variant.
	pub fn stage_failure(&self) -> Option<&StageFailure> {
		match self {
			Self::Discovery(failure)
			| Self::Identity(failure)
			| Self::Credential(failure)
			| Self::TokenExchange(failure) => Some(failure),
			Self::Signature(_) | Self::Config(_) => None,
		}
	}

	/// HTTP status returned by the failing stage, if the server answered.
	pub fn status(&self) -> Option<u16> {
		match self.stage_failure()? {
			StageFailure::Status { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Whether a caller-side retry (with backoff) can reasonably succeed.
	///
	/// The pipeline never retries on its own; this only classifies.
	pub fn is_retryable(&self) -> bool {
		self.stage_failure().is_some_and(StageFailure::is_retryable)
	}
}

/// Underlying cause of a failed network stage.
#[derive(Debug, ThisError)]
pub enum StageFailure {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the endpoint.")]
	Transport {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request did not complete within the configured timeout.
	#[error("Request timed out.")]
	Timeout,
	/// Endpoint answered with a non-success status.
	#[error("Endpoint returned HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
		/// Leading slice of the response body for diagnostics.
		body_preview: Option<String>,
	},
	/// Response body was not the expected JSON document.
	#[error("Endpoint returned malformed JSON.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Expected field was absent or empty.
	#[error("Response is missing the `{field}` field.")]
	MissingField {
		/// Dotted path of the missing field.
		field: &'static str,
	},
	/// Field was present but unusable.
	#[error("Response field `{field}` is invalid: {reason}.")]
	InvalidField {
		/// Dotted path of the invalid field.
		field: &'static str,
		/// Why the value was rejected.
		reason: String,
	},
	/// HTTP request could not be assembled (e.g., a header value from upstream is not valid).
	#[error(transparent)]
	Request(#[from] http::Error),
	/// Request body could not be serialized.
	#[error("Request body could not be encoded.")]
	Encode {
		/// Serialization failure.
		#[source]
		source: serde_json::Error,
	},
}
impl StageFailure {
	/// Wraps a transport-specific network error.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Box::new(src) }
	}

	/// Whether a retry of the same stage can reasonably succeed.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Transport { .. } | Self::Timeout => true,
			Self::Status { status, .. } => matches!(status, 408 | 429 | 500..=599),
			_ => false,
		}
	}
}

/// Configuration and client-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Pipeline configuration failed validation.
	#[error(transparent)]
	InvalidConfig(#[from] PipelineConfigError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}
impl From<PipelineConfigError> for Error {
	fn from(e: PipelineConfigError) -> Self {
		ConfigError::from(e).into()
	}
}
