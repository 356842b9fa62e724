//! Shared helpers for pipeline stages (transport dispatch, header merging, JSON extraction).

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::StageFailure,
	http::{self, HttpRequest, HttpResponse, PipelineHttpClient, TransportErrorMapper},
	obs::{self, Stage, StageOutcome, StageSpan},
};

/// Transport handle shared by every stage client: HTTP client, error mapper, and timeout.
pub(crate) struct StageTransport<C, M>
where
	C: ?Sized + PipelineHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	http_client: Arc<C>,
	mapper: Arc<M>,
	timeout: StdDuration,
}
impl<C, M> StageTransport<C, M>
where
	C: ?Sized + PipelineHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn new(http_client: Arc<C>, mapper: Arc<M>, timeout: StdDuration) -> Self {
		Self { http_client, mapper, timeout }
	}

	/// Sends `request` and rejects non-success statuses.
	pub(crate) async fn send(
		&self,
		stage: Stage,
		request: HttpRequest,
	) -> Result<HttpResponse, StageFailure> {
		let response = self
			.http_client
			.execute(request, self.timeout)
			.await
			.map_err(|err| self.mapper.map_transport_error(stage, err))?;

		if response.status().is_success() {
			Ok(response)
		} else {
			Err(http::status_failure(&response))
		}
	}
}
impl<C, M> Clone for StageTransport<C, M>
where
	C: ?Sized + PipelineHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			mapper: self.mapper.clone(),
			timeout: self.timeout,
		}
	}
}

/// Runs one stage inside its span and records attempt/success/failure.
pub(crate) async fn observed<T, Fut>(
	stage: Stage,
	call_site: &'static str,
	fut: Fut,
) -> Result<T, StageFailure>
where
	Fut: Future<Output = Result<T, StageFailure>>,
{
	let span = StageSpan::new(stage, call_site);

	obs::record_stage_outcome(stage, StageOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => obs::record_stage_outcome(stage, StageOutcome::Success),
		Err(_) => obs::record_stage_outcome(stage, StageOutcome::Failure),
	}

	result
}

/// Shallow-merges `overrides` over `base` into a fresh header set.
///
/// Neither input is modified, so one request's overrides never reach another request.
pub(crate) fn merge_headers<'a>(
	base: &[(&'static str, &'a str)],
	overrides: &[(&'static str, &'a str)],
) -> BTreeMap<&'static str, &'a str> {
	let mut merged = base.iter().copied().collect::<BTreeMap<_, _>>();

	merged.extend(overrides.iter().copied());

	merged
}

/// Deserializes a JSON body, keeping the path of the first mismatch.
pub(crate) fn parse_json<T>(body: &[u8]) -> Result<T, StageFailure>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| StageFailure::Parse { source })
}

/// Rejects absent or empty string fields.
pub(crate) fn required(value: Option<String>, field: &'static str) -> Result<String, StageFailure> {
	value.filter(|v| !v.is_empty()).ok_or(StageFailure::MissingField { field })
}

/// Serializes a request body.
pub(crate) fn encode_json<T>(body: &T) -> Result<Vec<u8>, StageFailure>
where
	T: ?Sized + Serialize,
{
	serde_json::to_vec(body).map_err(|source| StageFailure::Encode { source })
}
