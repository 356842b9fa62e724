//! Transport primitives for the pipeline's four network calls.
//!
//! The module exposes [`PipelineHttpClient`] as the pipeline's only dependency on an HTTP
//! stack and [`TransportErrorMapper`] to classify transport failures per stage. Requests and
//! responses are plain [`http`] types with buffered bodies, so custom transports never see
//! reqwest-specific structures.

// std
use std::ops::Deref;
// crates.io
use http::header::{HeaderMap, RETRY_AFTER};
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::StageFailure, obs::Stage};

/// Buffered request handed to a transport.
pub type HttpRequest = http::Request<Vec<u8>>;
/// Buffered response returned by a transport.
pub type HttpResponse = http::Response<Vec<u8>>;
/// Boxed future returned by [`PipelineHttpClient::execute`].
pub type HttpFuture<'a, E> = Pin<Box<dyn Future<Output = Result<HttpResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP transports able to execute the pipeline's requests.
///
/// Implementations must honor `timeout` for the whole exchange (connect through the last body
/// byte) and return non-success statuses as ordinary responses; the pipeline classifies them.
/// Dropping the returned future must cancel the in-flight call.
pub trait PipelineHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Sends `request`, buffering the full response body.
	fn execute(
		&self,
		request: HttpRequest,
		timeout: StdDuration,
	) -> HttpFuture<'_, Self::TransportError>;
}

/// Maps transport failures into [`StageFailure`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an error emitted by the transport during `stage`.
	fn map_transport_error(&self, stage: Stage, error: E) -> StageFailure;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, _stage: Stage, error: ReqwestError) -> StageFailure {
		if error.is_timeout() { StageFailure::Timeout } else { StageFailure::transport(error) }
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl PipelineHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(&self, request: HttpRequest, timeout: StdDuration) -> HttpFuture<'_, ReqwestError> {
		let client = self.0.clone();

		Box::pin(async move {
			let mut request = reqwest::Request::try_from(request)?;

			*request.timeout_mut() = Some(timeout);

			let response = client.execute(request).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new = HttpResponse::new(response.bytes().await?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

const BODY_PREVIEW_LIMIT: usize = 256;

/// Builds a [`StageFailure::Status`] from a non-success response.
pub(crate) fn status_failure(response: &HttpResponse) -> StageFailure {
	StageFailure::Status {
		status: response.status().as_u16(),
		retry_after: parse_retry_after(response.headers()),
		body_preview: body_preview(response.body()),
	}
}

fn body_preview(body: &[u8]) -> Option<String> {
	let text = String::from_utf8_lossy(body);
	let text = text.trim();

	if text.is_empty() {
		return None;
	}

	Some(text.chars().take(BODY_PREVIEW_LIMIT).collect())
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
