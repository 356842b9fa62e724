// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	config::{
		ACCEPT_LANGUAGE, AMZ_USER_AGENT, DEFAULT_REQUEST_TIMEOUT, DISCOVERY_ENDPOINT,
		IDENTITY_ENDPOINT, PipelineConfig, PipelineEndpoints, REGION, SERVICE, TOKEN_ENDPOINT,
	},
};

/// Errors raised while constructing or validating a pipeline configuration.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum PipelineConfigError {
	/// A built-in endpoint constant failed to parse.
	#[error("The {endpoint} endpoint is not a valid URL.")]
	InvalidEndpoint {
		/// Which endpoint failed to parse.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoints must use HTTPS unless they point at the loopback interface.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Endpoint URL carries no host to sign or connect to.
	#[error("The {endpoint} endpoint has no host: {url}.")]
	MissingHost {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// The signed token request carries no query parameters.
	#[error("The token endpoint must not carry a query string: {url}.")]
	TokenQueryNotSupported {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// A required text field was empty.
	#[error("The {field} value cannot be empty.")]
	EmptyField {
		/// Field name.
		field: &'static str,
	},
	/// Requests need a non-zero timeout.
	#[error("The request timeout must be greater than zero.")]
	ZeroTimeout,
}

/// Builder for [`PipelineConfig`] values.
#[derive(Debug)]
pub struct PipelineConfigBuilder {
	/// Discovery endpoint override.
	pub discovery_endpoint: Option<Url>,
	/// Federated-identity endpoint override.
	pub identity_endpoint: Option<Url>,
	/// Token endpoint override.
	pub token_endpoint: Option<Url>,
	region: String,
	service: String,
	amz_user_agent: String,
	accept_language: String,
	/// Per-request timeout.
	pub request_timeout: StdDuration,
}
impl PipelineConfigBuilder {
	/// Creates a builder seeded with the fixed production values.
	pub fn new() -> Self {
		Self {
			discovery_endpoint: None,
			identity_endpoint: None,
			token_endpoint: None,
			region: REGION.into(),
			service: SERVICE.into(),
			amz_user_agent: AMZ_USER_AGENT.into(),
			accept_language: ACCEPT_LANGUAGE.into(),
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
		}
	}

	/// Sets the discovery endpoint.
	pub fn discovery_endpoint(mut self, url: Url) -> Self {
		self.discovery_endpoint = Some(url);

		self
	}

	/// Sets the federated-identity endpoint.
	pub fn identity_endpoint(mut self, url: Url) -> Self {
		self.identity_endpoint = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Overrides the per-request timeout.
	pub fn request_timeout(mut self, timeout: StdDuration) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<PipelineConfig, PipelineConfigError> {
		let discovery = resolve("discovery", self.discovery_endpoint, DISCOVERY_ENDPOINT)?;
		let identity = resolve("identity", self.identity_endpoint, IDENTITY_ENDPOINT)?;
		let token = resolve("token", self.token_endpoint, TOKEN_ENDPOINT)?;
		let config = PipelineConfig {
			endpoints: PipelineEndpoints { discovery, identity, token },
			region: self.region,
			service: self.service,
			amz_user_agent: self.amz_user_agent,
			accept_language: self.accept_language,
			request_timeout: self.request_timeout,
		};

		config.validate()?;

		Ok(config)
	}
}
impl Default for PipelineConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl PipelineConfig {
	/// Validates invariants for the configuration.
	fn validate(&self) -> Result<(), PipelineConfigError> {
		validate_endpoint("discovery", &self.endpoints.discovery)?;
		validate_endpoint("identity", &self.endpoints.identity)?;
		validate_endpoint("token", &self.endpoints.token)?;

		if self.endpoints.token.query().is_some() {
			return Err(PipelineConfigError::TokenQueryNotSupported {
				url: self.endpoints.token.to_string(),
			});
		}

		validate_non_empty("region", &self.region)?;
		validate_non_empty("service", &self.service)?;

		if self.request_timeout.is_zero() {
			return Err(PipelineConfigError::ZeroTimeout);
		}

		Ok(())
	}
}

fn resolve(
	endpoint: &'static str,
	provided: Option<Url>,
	fallback: &str,
) -> Result<Url, PipelineConfigError> {
	match provided {
		Some(url) => Ok(url),
		None => Url::parse(fallback)
			.map_err(|source| PipelineConfigError::InvalidEndpoint { endpoint, source }),
	}
}

fn validate_endpoint(endpoint: &'static str, url: &Url) -> Result<(), PipelineConfigError> {
	let Some(host) = url.host() else {
		return Err(PipelineConfigError::MissingHost { endpoint, url: url.to_string() });
	};

	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(&host) => Ok(()),
		_ => Err(PipelineConfigError::InsecureEndpoint { endpoint, url: url.to_string() }),
	}
}

fn is_loopback(host: &Host<&str>) -> bool {
	match host {
		Host::Domain(domain) => domain.eq_ignore_ascii_case("localhost"),
		Host::Ipv4(ip) => ip.is_loopback(),
		Host::Ipv6(ip) => ip.is_loopback(),
	}
}

fn validate_non_empty(field: &'static str, value: &str) -> Result<(), PipelineConfigError> {
	if value.trim().is_empty() { Err(PipelineConfigError::EmptyField { field }) } else { Ok(()) }
}
