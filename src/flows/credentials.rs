//! Credential exchange: pool discovery, `GetId`, and `GetCredentialsForIdentity`.
//!
//! The three calls run strictly in order because each consumes the previous response. Every
//! call builds its own header set from the shared base plus step overrides, and each stage
//! surfaces its own [`Error`] variant.

// crates.io
use http::{Method, header::ACCEPT_LANGUAGE};
// self
use crate::{
	_prelude::*,
	auth::{IdentityId, IdentityPoolId, TemporaryCredentials},
	config::PipelineConfig,
	error::StageFailure,
	flows::common::{self, StageTransport},
	http::{HttpRequest, PipelineHttpClient, TransportErrorMapper},
	obs::Stage,
};

/// `content-type` for federated-identity JSON calls.
pub const AMZ_JSON: &str = "application/x-amz-json-1.1";
/// `x-amz-target` for identity acquisition.
pub const TARGET_GET_ID: &str = "AWSCognitoIdentityService.GetId";
/// `x-amz-target` for credential acquisition.
pub const TARGET_GET_CREDENTIALS: &str = "AWSCognitoIdentityService.GetCredentialsForIdentity";

const X_AMZ_TARGET: &str = "x-amz-target";
const X_AMZ_USER_AGENT: &str = "x-amz-user-agent";

#[derive(Deserialize)]
struct DiscoveryResponse {
	cognito: Option<DiscoveryCognito>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscoveryCognito {
	identity_pool_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetIdRequest<'a> {
	identity_pool_id: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetIdResponse {
	identity_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetCredentialsRequest<'a> {
	identity_id: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetCredentialsResponse {
	credentials: Option<CredentialsPayload>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CredentialsPayload {
	access_key_id: Option<String>,
	secret_key: Option<String>,
	session_token: Option<String>,
	expiration: Option<f64>,
}

/// Client for the three calls that turn a pool identifier into temporary credentials.
pub struct CredentialExchangeClient<C, M>
where
	C: ?Sized + PipelineHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	transport: StageTransport<C, M>,
	config: Arc<PipelineConfig>,
}
impl<C, M> CredentialExchangeClient<C, M>
where
	C: ?Sized + PipelineHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn new(transport: StageTransport<C, M>, config: Arc<PipelineConfig>) -> Self {
		Self { transport, config }
	}

	/// Runs discovery, identity acquisition, and credential acquisition in order.
	pub async fn exchange(&self) -> Result<TemporaryCredentials> {
		let pool_id = self.discover_pool_id().await?;
		let identity_id = self.acquire_identity(&pool_id).await?;

		self.acquire_credentials(&identity_id).await
	}

	/// Fetches the identity-pool identifier from the discovery endpoint.
	pub async fn discover_pool_id(&self) -> Result<IdentityPoolId> {
		const FIELD: &str = "cognito.identityPoolId";

		common::observed(Stage::Discovery, "discover_pool_id", async {
			let request = http::Request::builder()
				.method(Method::GET)
				.uri(self.config.endpoints.discovery.as_str())
				.header(ACCEPT_LANGUAGE, self.config.accept_language.as_str())
				.body(Vec::new())?;
			let response = self.transport.send(Stage::Discovery, request).await?;
			let body = common::parse_json::<DiscoveryResponse>(response.body())?;
			let raw = common::required(
				body.cognito.and_then(|cognito| cognito.identity_pool_id),
				FIELD,
			)?;

			IdentityPoolId::new(raw)
				.map_err(|err| StageFailure::InvalidField { field: FIELD, reason: err.to_string() })
		})
		.await
		.map_err(Error::Discovery)
	}

	/// Trades a pool identifier for a federated identity (`GetId`).
	pub async fn acquire_identity(&self, pool_id: &IdentityPoolId) -> Result<IdentityId> {
		const FIELD: &str = "IdentityId";

		common::observed(Stage::Identity, "acquire_identity", async {
			let body = common::encode_json(&GetIdRequest { identity_pool_id: pool_id })?;
			let request = self.identity_request(TARGET_GET_ID, body)?;
			let response = self.transport.send(Stage::Identity, request).await?;
			let body = common::parse_json::<GetIdResponse>(response.body())?;
			let raw = common::required(body.identity_id, FIELD)?;

			IdentityId::new(raw)
				.map_err(|err| StageFailure::InvalidField { field: FIELD, reason: err.to_string() })
		})
		.await
		.map_err(Error::Identity)
	}

	/// Trades a federated identity for temporary credentials (`GetCredentialsForIdentity`).
	pub async fn acquire_credentials(
		&self,
		identity_id: &IdentityId,
	) -> Result<TemporaryCredentials> {
		common::observed(Stage::Credentials, "acquire_credentials", async {
			let body = common::encode_json(&GetCredentialsRequest { identity_id })?;
			let request = self.identity_request(TARGET_GET_CREDENTIALS, body)?;
			let response = self.transport.send(Stage::Credentials, request).await?;
			let body = common::parse_json::<GetCredentialsResponse>(response.body())?;
			let payload =
				body.credentials.ok_or(StageFailure::MissingField { field: "Credentials" })?;

			credentials_from_payload(payload)
		})
		.await
		.map_err(Error::Credential)
	}

	fn identity_request(&self, target: &str, body: Vec<u8>) -> Result<HttpRequest, StageFailure> {
		let base = [
			("accept-language", self.config.accept_language.as_str()),
			("content-type", AMZ_JSON),
		];
		let step = [
			("accept", "*/*"),
			(X_AMZ_TARGET, target),
			(X_AMZ_USER_AGENT, self.config.amz_user_agent.as_str()),
		];
		let mut builder = http::Request::builder()
			.method(Method::POST)
			.uri(self.config.endpoints.identity.as_str());

		for (name, value) in common::merge_headers(&base, &step) {
			builder = builder.header(name, value);
		}

		Ok(builder.body(body)?)
	}
}
impl<C, M> Clone for CredentialExchangeClient<C, M>
where
	C: ?Sized + PipelineHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self { transport: self.transport.clone(), config: self.config.clone() }
	}
}

fn credentials_from_payload(
	payload: CredentialsPayload,
) -> Result<TemporaryCredentials, StageFailure> {
	const EXPIRATION: &str = "Credentials.Expiration";

	let access_key_id = common::required(payload.access_key_id, "Credentials.AccessKeyId")?;
	let secret_key = common::required(payload.secret_key, "Credentials.SecretKey")?;
	let session_token = common::required(payload.session_token, "Credentials.SessionToken")?;
	let expiration = payload.expiration.ok_or(StageFailure::MissingField { field: EXPIRATION })?;

	if !expiration.is_finite() {
		return Err(StageFailure::InvalidField {
			field: EXPIRATION,
			reason: "not a finite number".into(),
		});
	}

	let expires_at = OffsetDateTime::from_unix_timestamp(expiration.trunc() as i64)
		.map_err(|err| StageFailure::InvalidField { field: EXPIRATION, reason: err.to_string() })?;

	Ok(TemporaryCredentials::new(access_key_id, secret_key, session_token, expires_at))
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	fn payload(json: &str) -> Result<TemporaryCredentials, StageFailure> {
		let body = common::parse_json::<GetCredentialsResponse>(json.as_bytes())?;

		credentials_from_payload(
			body.credentials.ok_or(StageFailure::MissingField { field: "Credentials" })?,
		)
	}

	#[test]
	fn credentials_accept_integer_and_fractional_expiration() {
		let whole = payload(
			"{\"IdentityId\":\"us-west-2:abc\",\"Credentials\":{\"AccessKeyId\":\"AKIAEXAMPLE\",\
			 \"SecretKey\":\"secret\",\"SessionToken\":\"sess\",\"Expiration\":1704070800}}",
		)
		.expect("Whole-second expiration should parse.");
		let fractional = payload(
			"{\"Credentials\":{\"AccessKeyId\":\"AKIAEXAMPLE\",\"SecretKey\":\"secret\",\
			 \"SessionToken\":\"sess\",\"Expiration\":1.7040708005E9}}",
		)
		.expect("Fractional expiration should parse.");

		assert_eq!(whole.access_key_id, "AKIAEXAMPLE");
		assert_eq!(whole.secret_key.expose(), "secret");
		assert_eq!(whole.session_token.expose(), "sess");
		assert_eq!(whole.expires_at, datetime!(2024-01-01 01:00 UTC));
		assert_eq!(fractional.expires_at, datetime!(2024-01-01 01:00 UTC));
	}

	#[test]
	fn credentials_report_the_missing_field() {
		let err = payload(
			"{\"Credentials\":{\"AccessKeyId\":\"AKIAEXAMPLE\",\"SessionToken\":\"sess\",\
			 \"Expiration\":1704070800}}",
		)
		.expect_err("Missing secret key must fail.");

		assert!(matches!(err, StageFailure::MissingField { field: "Credentials.SecretKey" }));

		let err = payload("{\"IdentityId\":\"us-west-2:abc\"}")
			.expect_err("Missing credentials object must fail.");

		assert!(matches!(err, StageFailure::MissingField { field: "Credentials" }));
	}

	#[test]
	fn identity_bodies_use_pascal_case_keys() {
		let pool = IdentityPoolId::new("pool-123").expect("Pool fixture should be valid.");
		let identity = IdentityId::new("us-west-2:abc").expect("Identity fixture should be valid.");

		assert_eq!(
			common::encode_json(&GetIdRequest { identity_pool_id: &pool })
				.expect("GetId body should encode."),
			b"{\"IdentityPoolId\":\"pool-123\"}"
		);
		assert_eq!(
			common::encode_json(&GetCredentialsRequest { identity_id: &identity })
				.expect("Credentials body should encode."),
			b"{\"IdentityId\":\"us-west-2:abc\"}"
		);
	}
}
