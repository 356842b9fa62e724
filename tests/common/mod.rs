//! Shared fixtures for the integration tests: an insecure reqwest client for `httpmock`, a
//! manually driven clock, and mock registration for the four pipeline endpoints.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use httpmock::{Mock, prelude::*};
use parking_lot::Mutex;
use time::{Duration, OffsetDateTime, macros::datetime};
// self
use cognito_token_broker::{
	auth::TemporaryCredentials,
	clock::Clock,
	config::PipelineConfig,
	flows::{ReqwestTokenBroker, TARGET_GET_CREDENTIALS, TARGET_GET_ID},
	http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
	reqwest::Client,
	url::Url,
};

pub const DISCOVERY_PATH: &str = "/api/v1/auth/cognito";
pub const IDENTITY_PATH: &str = "/";
pub const TOKEN_PATH: &str = "/production/generate-token";
pub const POOL_ID: &str = "pool-123";
pub const IDENTITY_ID: &str = "us-west-2:abc";
pub const ACCESS_KEY_ID: &str = "AKIAEXAMPLE";
pub const SECRET_KEY: &str = "secret";
pub const SESSION_TOKEN: &str = "sess";
pub const START: OffsetDateTime = datetime!(2024-01-01 00:00 UTC);
/// `START` plus one hour, as epoch seconds.
pub const EXPIRATION: i64 = 1_704_070_800;

/// Clock that only moves when a test advances it.
pub struct ManualClock(Mutex<OffsetDateTime>);
impl ManualClock {
	pub fn new(start: OffsetDateTime) -> Arc<Self> {
		Arc::new(Self(Mutex::new(start)))
	}

	pub fn advance(&self, by: Duration) {
		*self.0.lock() += by;
	}
}
impl Clock for ManualClock {
	fn now_utc(&self) -> OffsetDateTime {
		*self.0.lock()
	}
}

/// Mocks for one full pipeline run.
pub struct PipelineMocks<'a> {
	pub discovery: Mock<'a>,
	pub identity: Mock<'a>,
	pub credentials: Mock<'a>,
	pub token: Mock<'a>,
}
impl PipelineMocks<'_> {
	/// Asserts every endpoint was called exactly `runs` times.
	pub async fn assert_runs(&self, runs: usize) {
		self.discovery.assert_calls_async(runs).await;
		self.identity.assert_calls_async(runs).await;
		self.credentials.assert_calls_async(runs).await;
		self.token.assert_calls_async(runs).await;
	}
}

pub fn url(value: &str) -> Url {
	Url::parse(value).expect("Failed to parse mock endpoint URL.")
}

/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
/// `httpmock` during tests.
pub fn test_reqwest_http_client() -> ReqwestHttpClient {
	let client = Client::builder()
		.danger_accept_invalid_certs(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestHttpClient::with_client(client)
}

/// Points every endpoint at `server`.
pub fn mock_config(server: &MockServer) -> PipelineConfig {
	PipelineConfig::builder()
		.discovery_endpoint(url(&server.url(DISCOVERY_PATH)))
		.identity_endpoint(url(&server.url(IDENTITY_PATH)))
		.token_endpoint(url(&server.url(TOKEN_PATH)))
		.build()
		.expect("Mock pipeline configuration should validate.")
}

/// Builds a reqwest-backed broker for `config` driven by a manual clock at [`START`].
pub fn build_test_broker(config: PipelineConfig) -> (ReqwestTokenBroker, Arc<ManualClock>) {
	let clock = ManualClock::new(START);
	let broker = ReqwestTokenBroker::with_http_client(
		config,
		test_reqwest_http_client(),
		ReqwestTransportErrorMapper,
	)
	.with_clock(clock.clone());

	(broker, clock)
}

/// Credentials the credential mock hands out.
pub fn fixture_credentials() -> TemporaryCredentials {
	TemporaryCredentials::new(
		ACCESS_KEY_ID,
		SECRET_KEY,
		SESSION_TOKEN,
		OffsetDateTime::from_unix_timestamp(EXPIRATION).expect("Fixture expiration should be valid."),
	)
}

pub async fn mock_discovery(server: &MockServer) -> Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(GET).path(DISCOVERY_PATH).header("accept-language", "en-US,en;q=0.9");
			then.status(200)
				.header("content-type", "application/json")
				.body(format!("{{\"cognito\":{{\"identityPoolId\":\"{POOL_ID}\"}}}}"));
		})
		.await
}

pub async fn mock_identity(server: &MockServer) -> Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST)
				.path(IDENTITY_PATH)
				.header("x-amz-target", TARGET_GET_ID)
				.header("content-type", "application/x-amz-json-1.1")
				.header("x-amz-user-agent", "aws-amplify/5.3.12 framework/0")
				.body(format!("{{\"IdentityPoolId\":\"{POOL_ID}\"}}"));
			then.status(200)
				.header("content-type", "application/x-amz-json-1.1")
				.body(format!("{{\"IdentityId\":\"{IDENTITY_ID}\"}}"));
		})
		.await
}

pub async fn mock_credentials(server: &MockServer) -> Mock<'_> {
	mock_credentials_expiring(server, EXPIRATION).await
}

/// Credential mock whose `Expiration` is `expiration` epoch seconds.
pub async fn mock_credentials_expiring(server: &MockServer, expiration: i64) -> Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST)
				.path(IDENTITY_PATH)
				.header("x-amz-target", TARGET_GET_CREDENTIALS)
				.body(format!("{{\"IdentityId\":\"{IDENTITY_ID}\"}}"));
			then.status(200).header("content-type", "application/x-amz-json-1.1").body(format!(
				"{{\"IdentityId\":\"{IDENTITY_ID}\",\"Credentials\":{{\
				 \"AccessKeyId\":\"{ACCESS_KEY_ID}\",\"SecretKey\":\"{SECRET_KEY}\",\
				 \"SessionToken\":\"{SESSION_TOKEN}\",\"Expiration\":{expiration}}}}}"
			));
		})
		.await
}

pub async fn mock_token<'a>(server: &'a MockServer, token: &str) -> Mock<'a> {
	let body = format!("{{\"token\":\"{token}\"}}");

	server
		.mock_async(|when, then| {
			when.method(GET)
				.path(TOKEN_PATH)
				.header_exists("authorization")
				.header("x-amz-security-token", SESSION_TOKEN);
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await
}

/// Registers all four endpoints for a successful run that yields `token`.
pub async fn mock_pipeline<'a>(server: &'a MockServer, token: &str) -> PipelineMocks<'a> {
	PipelineMocks {
		discovery: mock_discovery(server).await,
		identity: mock_identity(server).await,
		credentials: mock_credentials(server).await,
		token: mock_token(server, token).await,
	}
}
