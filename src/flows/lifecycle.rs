//! Token lifecycle: cached-token checks, single-flight pipeline runs, and explicit invalidation.
//!
//! The cache is one [`TokenState`] behind a synchronous mutex that is never held across an
//! `.await`. Pipeline runs are serialized by the broker's async flow guard; a caller that waited
//! on the guard re-checks the cache first and reuses a token another caller just stored.

mod metrics;

pub use metrics::*;

// self
use crate::{
	_prelude::*,
	auth::{BearerToken, TokenStatus},
	error::StageFailure,
	flows::TokenBroker,
	http::{PipelineHttpClient, TransportErrorMapper},
	obs::{self, Stage, StageOutcome, StageSpan},
};

/// Cached-token state owned by a [`TokenBroker`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TokenState {
	/// No token has been obtained yet.
	#[default]
	Empty,
	/// A token is cached; it may have expired since it was stored.
	Valid(BearerToken),
	/// The cached token passed its expiration and was dropped.
	Expired,
	/// The caller discarded the token.
	Invalidated,
}
impl TokenState {
	/// Evaluates the state at `instant` without mutating it.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		match self {
			TokenState::Empty => TokenStatus::Empty,
			TokenState::Valid(token) if token.is_valid_at(instant) => TokenStatus::Valid,
			TokenState::Valid(_) | TokenState::Expired => TokenStatus::Expired,
			TokenState::Invalidated => TokenStatus::Invalidated,
		}
	}

	/// Returns the cached token when it is still usable at `instant`.
	pub fn token_at(&self, instant: OffsetDateTime) -> Option<&BearerToken> {
		match self {
			TokenState::Valid(token) if token.is_valid_at(instant) => Some(token),
			_ => None,
		}
	}
}

impl<C, M> TokenBroker<C, M>
where
	C: ?Sized + PipelineHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Returns a valid bearer token, running the full pipeline only when no usable token is
	/// cached.
	///
	/// Stage failures propagate unchanged and leave the cache untouched. The broker never
	/// retries; retry policy belongs to the caller (see [`Error::is_retryable`]).
	pub async fn ensure_token(&self) -> Result<BearerToken> {
		let span = StageSpan::new(Stage::Lifecycle, "ensure_token");

		span.instrument(async {
			if let Some(token) = self.cached_token() {
				return Ok(token);
			}

			let _singleflight = self.flow_guard.lock().await;

			if let Some(token) = self.cached_token() {
				return Ok(token);
			}

			self.run_pipeline().await
		})
		.await
	}

	/// Discards the cached token so the next [`ensure_token`](Self::ensure_token) re-runs the
	/// pipeline.
	///
	/// Call this after a protected API rejects the token. A run already in flight still stores
	/// its result when it completes.
	pub fn invalidate(&self) {
		let now = self.clock.now_utc();
		let from = {
			let mut state = self.state.lock();
			let from = state.status_at(now);

			*state = TokenState::Invalidated;

			from
		};

		self.metrics.record_invalidation();
		obs::record_state_transition(from, TokenStatus::Invalidated);
	}

	/// Reports the cache state evaluated at the current instant.
	pub fn status(&self) -> TokenStatus {
		self.state.lock().status_at(self.clock.now_utc())
	}

	fn cached_token(&self) -> Option<BearerToken> {
		let now = self.clock.now_utc();
		let mut state = self.state.lock();

		let cached = state.token_at(now).cloned();

		if let Some(token) = cached {
			drop(state);
			self.metrics.record_cache_hit();
			obs::record_stage_outcome(Stage::Lifecycle, StageOutcome::CacheHit);

			return Some(token);
		}
		if matches!(*state, TokenState::Valid(_)) {
			*state = TokenState::Expired;

			drop(state);
			obs::record_state_transition(TokenStatus::Valid, TokenStatus::Expired);
		}

		None
	}

	async fn run_pipeline(&self) -> Result<BearerToken> {
		self.metrics.record_run();
		obs::record_stage_outcome(Stage::Lifecycle, StageOutcome::Attempt);

		let result = async {
			let credentials = self.credential_client.exchange().await?;

			if credentials.is_expired_at(self.clock.now_utc()) {
				return Err(expired_credentials(credentials.expires_at));
			}

			let token = self.token_client.exchange(&credentials).await?;

			if !token.is_valid_at(self.clock.now_utc()) {
				return Err(expired_credentials(token.expires_at));
			}

			Ok(token)
		}
		.await;

		match result {
			Ok(token) => {
				self.store_token(token.clone());
				self.metrics.record_success();
				obs::record_stage_outcome(Stage::Lifecycle, StageOutcome::Success);

				Ok(token)
			},
			Err(err) => {
				self.metrics.record_failure();
				obs::record_stage_outcome(Stage::Lifecycle, StageOutcome::Failure);

				Err(err)
			},
		}
	}

	fn store_token(&self, token: BearerToken) {
		let now = self.clock.now_utc();
		let from = {
			let mut state = self.state.lock();
			let from = state.status_at(now);

			*state = TokenState::Valid(token);

			from
		};

		obs::record_state_transition(from, TokenStatus::Valid);
	}
}

/// Credentials that are already past their expiration cannot mint a usable token.
fn expired_credentials(expires_at: OffsetDateTime) -> Error {
	Error::Credential(StageFailure::InvalidField {
		field: "Credentials.Expiration",
		reason: format!("already expired at {expires_at}"),
	})
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	#[test]
	fn status_follows_expiry_without_mutation() {
		let token = BearerToken::new("jwt-value", datetime!(2024-01-01 01:00 UTC));
		let state = TokenState::Valid(token.clone());

		assert_eq!(
			TokenState::default().status_at(datetime!(2024-01-01 00:00 UTC)),
			TokenStatus::Empty
		);
		assert_eq!(state.status_at(datetime!(2024-01-01 00:30 UTC)), TokenStatus::Valid);
		assert_eq!(state.token_at(datetime!(2024-01-01 00:30 UTC)), Some(&token));
		assert_eq!(state.status_at(datetime!(2024-01-01 01:00 UTC)), TokenStatus::Expired);
		assert_eq!(state.token_at(datetime!(2024-01-01 01:00 UTC)), None);
		assert_eq!(state, TokenState::Valid(token));
		assert_eq!(
			TokenState::Invalidated.status_at(datetime!(2024-01-01 00:00 UTC)),
			TokenStatus::Invalidated
		);
	}

	#[test]
	fn metrics_start_at_zero_and_count_independently() {
		let metrics = PipelineMetrics::default();

		metrics.record_run();
		metrics.record_run();
		metrics.record_success();
		metrics.record_failure();
		metrics.record_cache_hit();
		metrics.record_invalidation();

		assert_eq!(metrics.runs(), 2);
		assert_eq!(metrics.successes(), 1);
		assert_eq!(metrics.failures(), 1);
		assert_eq!(metrics.cache_hits(), 1);
		assert_eq!(metrics.invalidations(), 1);
	}
}
