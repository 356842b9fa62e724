//! Optional observability helpers for pipeline stages.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `cognito_token_broker.stage` with the `stage`
//!   and `call_site` fields, plus debug events for token state transitions.
//! - Enable `metrics` to increment the `cognito_token_broker_stage_total` counter for every
//!   attempt/success/failure/cache hit, labeled by `stage` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Pipeline stages observed by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
	/// `ensure_token` as a whole, including cache checks.
	Lifecycle,
	/// Identity-pool discovery.
	Discovery,
	/// `GetId` call.
	Identity,
	/// `GetCredentialsForIdentity` call.
	Credentials,
	/// Signed token exchange.
	TokenExchange,
}
impl Stage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Stage::Lifecycle => "lifecycle",
			Stage::Discovery => "discovery",
			Stage::Identity => "identity",
			Stage::Credentials => "credentials",
			Stage::TokenExchange => "token_exchange",
		}
	}
}
impl Display for Stage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageOutcome {
	/// Entry to a stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Cached token served without network calls.
	CacheHit,
	/// Failure propagated back to the caller.
	Failure,
}
impl StageOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageOutcome::Attempt => "attempt",
			StageOutcome::Success => "success",
			StageOutcome::CacheHit => "cache_hit",
			StageOutcome::Failure => "failure",
		}
	}
}
impl Display for StageOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
