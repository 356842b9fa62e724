//! Demonstrates the full identity-pool pipeline against local mocks: discovery, `GetId`,
//! `GetCredentialsForIdentity`, and the signed token exchange, followed by a cache hit and an
//! invalidation-driven rerun.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use cognito_token_broker::{
	config::PipelineConfig,
	flows::{ReqwestTokenBroker, TARGET_GET_CREDENTIALS, TARGET_GET_ID},
	http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
	reqwest::Client,
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let expiration = time::OffsetDateTime::now_utc().unix_timestamp() + 3_600;
	let discovery = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/auth/cognito");
			then.status(200).body("{\"cognito\":{\"identityPoolId\":\"us-west-2:demo-pool\"}}");
		})
		.await;
	let identity = server
		.mock_async(|when, then| {
			when.method(POST).path("/").header("x-amz-target", TARGET_GET_ID);
			then.status(200).body("{\"IdentityId\":\"us-west-2:demo-identity\"}");
		})
		.await;
	let credentials = server
		.mock_async(|when, then| {
			when.method(POST).path("/").header("x-amz-target", TARGET_GET_CREDENTIALS);
			then.status(200).body(format!(
				"{{\"Credentials\":{{\"AccessKeyId\":\"AKIADEMO\",\"SecretKey\":\"demo-secret\",\
				 \"SessionToken\":\"demo-session\",\"Expiration\":{expiration}}}}}"
			));
		})
		.await;
	let token = server
		.mock_async(|when, then| {
			when.method(GET).path("/production/generate-token").header_exists("authorization");
			then.status(200).body("{\"token\":\"demo-bearer\"}");
		})
		.await;
	let config = PipelineConfig::builder()
		.discovery_endpoint(Url::parse(&server.url("/api/v1/auth/cognito"))?)
		.identity_endpoint(Url::parse(&server.url("/"))?)
		.token_endpoint(Url::parse(&server.url("/production/generate-token"))?)
		.build()?;
	let http_client =
		ReqwestHttpClient::with_client(Client::builder().danger_accept_invalid_certs(true).build()?);
	let broker =
		ReqwestTokenBroker::with_http_client(config, http_client, ReqwestTransportErrorMapper);
	let first = broker.ensure_token().await?;
	let cached = broker.ensure_token().await?;

	println!(
		"Bearer token {} expires at {} (status: {}).",
		first.value,
		first.expiration_epoch_seconds(),
		broker.status()
	);
	println!("Second call reused the cache: {}.", first == cached);

	broker.invalidate();

	let renewed = broker.ensure_token().await?;

	println!("Token after invalidation expires at {}.", renewed.expiration_epoch_seconds());
	println!(
		"Runs: {}, cache hits: {}, invalidations: {}.",
		broker.metrics.runs(),
		broker.metrics.cache_hits(),
		broker.metrics.invalidations()
	);

	discovery.assert_calls_async(2).await;
	identity.assert_calls_async(2).await;
	credentials.assert_calls_async(2).await;
	token.assert_calls_async(2).await;

	Ok(())
}
