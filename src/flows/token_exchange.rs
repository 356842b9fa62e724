//! Signed token exchange: SigV4-sign a GET with temporary credentials and read the bearer token.

// crates.io
use http::{
	Method,
	header::{ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION},
};
// self
use crate::{
	_prelude::*,
	auth::{BearerToken, TemporaryCredentials},
	clock::Clock,
	config::PipelineConfig,
	error::StageFailure,
	flows::common::{self, StageTransport},
	http::{HttpRequest, PipelineHttpClient, TransportErrorMapper},
	obs::{Stage, StageSpan},
	sigv4::{
		self, AmzTimestamp, CanonicalRequest, HOST, SigningScope, SplitUrl, X_AMZ_DATE,
		X_AMZ_SECURITY_TOKEN,
	},
};

/// `accept` value sent to the token endpoint.
pub const TOKEN_ACCEPT: &str = "application/json, text/plain, */*";

#[derive(Deserialize)]
struct TokenResponse {
	token: Option<String>,
}

/// Client that exchanges temporary credentials for the final bearer token.
pub struct TokenExchangeClient<C, M>
where
	C: ?Sized + PipelineHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	transport: StageTransport<C, M>,
	config: Arc<PipelineConfig>,
	clock: Arc<dyn Clock>,
}
impl<C, M> TokenExchangeClient<C, M>
where
	C: ?Sized + PipelineHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn new(
		transport: StageTransport<C, M>,
		config: Arc<PipelineConfig>,
		clock: Arc<dyn Clock>,
	) -> Self {
		Self { transport, config, clock }
	}

	pub(crate) fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Signs a request at the current instant, sends it, and extracts the bearer token.
	///
	/// The token inherits the credentials' expiration.
	pub async fn exchange(&self, credentials: &TemporaryCredentials) -> Result<BearerToken> {
		let request = self.signed_request(credentials, self.clock.now_utc())?;

		common::observed(Stage::TokenExchange, "exchange", async {
			let response = self.transport.send(Stage::TokenExchange, request).await?;
			let body = common::parse_json::<TokenResponse>(response.body())?;
			let token = common::required(body.token, "token")?;

			Ok::<_, StageFailure>(BearerToken::new(token, credentials.expires_at))
		})
		.await
		.map_err(Error::TokenExchange)
	}

	/// Builds the signed token request for `instant`.
	///
	/// The `x-amz-date` header and the string-to-sign share one rendering of `instant`.
	pub fn signed_request(
		&self,
		credentials: &TemporaryCredentials,
		instant: OffsetDateTime,
	) -> Result<HttpRequest> {
		let _span = StageSpan::new(Stage::TokenExchange, "sign").entered();
		let endpoint = &self.config.endpoints.token;
		let timestamp = AmzTimestamp::at(instant)?;
		let split = SplitUrl::new(endpoint)?;
		let signed = [
			(HOST, split.host.as_str()),
			(X_AMZ_DATE, timestamp.datetime()),
			(X_AMZ_SECURITY_TOKEN, credentials.session_token.expose()),
		];
		let canonical = CanonicalRequest::new(Method::GET.as_str(), &split.uri, signed)?;
		let scope =
			SigningScope { region: self.config.region.as_str(), service: self.config.service.as_str() };
		let authorization = sigv4::authorize(credentials, &timestamp, scope, &canonical)?;
		let mut builder = http::Request::builder()
			.method(Method::GET)
			.uri(endpoint.as_str())
			.header(ACCEPT, TOKEN_ACCEPT)
			.header(ACCEPT_LANGUAGE, self.config.accept_language.as_str());

		for (name, value) in signed {
			builder = builder.header(name, value);
		}

		builder
			.header(AUTHORIZATION, authorization.header)
			.body(Vec::new())
			.map_err(|err| Error::TokenExchange(StageFailure::Request(err)))
	}
}
impl<C, M> Clone for TokenExchangeClient<C, M>
where
	C: ?Sized + PipelineHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			config: self.config.clone(),
			clock: self.clock.clone(),
		}
	}
}
