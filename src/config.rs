//! Fixed pipeline configuration: endpoints, signing scope, and request headers.
//!
//! Production callers use [`PipelineConfig::fixed`]; the builder exists so tests and demos can
//! point the same pipeline at a local mock server.

/// Builder API for assembling pipeline configurations.
pub mod builder;

pub use builder::*;

// self
use crate::_prelude::*;

/// Discovery endpoint that publishes the identity-pool identifier.
pub const DISCOVERY_ENDPOINT: &str = "https://poachedjobs.com/api/v1/auth/cognito";
/// Federated-identity endpoint serving `GetId` and `GetCredentialsForIdentity`.
pub const IDENTITY_ENDPOINT: &str = "https://cognito-identity.us-west-2.amazonaws.com/";
/// Protected endpoint that trades a signed request for a bearer token.
pub const TOKEN_ENDPOINT: &str =
	"https://pstktaeh2e.execute-api.us-west-2.amazonaws.com/production/generate-token";
/// Signing region.
pub const REGION: &str = "us-west-2";
/// Signing service name.
pub const SERVICE: &str = "execute-api";
/// `x-amz-user-agent` marker sent with federated-identity calls.
pub const AMZ_USER_AGENT: &str = "aws-amplify/5.3.12 framework/0";
/// `accept-language` value sent with every call.
pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
/// Per-request timeout applied when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Endpoint set used by the pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineEndpoints {
	/// Unauthenticated GET endpoint returning the identity-pool identifier.
	pub discovery: Url,
	/// Federated-identity POST endpoint.
	pub identity: Url,
	/// Signed GET endpoint returning the bearer token.
	pub token: Url,
}

/// Immutable pipeline configuration consumed by every stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
	/// Endpoint definitions.
	pub endpoints: PipelineEndpoints,
	/// Region placed in the credential scope.
	pub region: String,
	/// Service placed in the credential scope.
	pub service: String,
	/// `x-amz-user-agent` marker for identity calls.
	pub amz_user_agent: String,
	/// `accept-language` header value.
	pub accept_language: String,
	/// Timeout applied to each network call.
	pub request_timeout: StdDuration,
}
impl PipelineConfig {
	/// Creates a builder seeded with the fixed production values.
	pub fn builder() -> PipelineConfigBuilder {
		PipelineConfigBuilder::new()
	}

	/// Returns the fixed production configuration.
	pub fn fixed() -> Result<Self, PipelineConfigError> {
		Self::builder().build()
	}
}
