//! Time source consumed by the signer and the token lifecycle.

// self
use crate::_prelude::*;

/// Supplies the current UTC instant.
///
/// The broker reads the clock once per signing operation and once per cache check, so a
/// test clock can move time across expiry boundaries deterministically.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current instant in UTC.
	fn now_utc(&self) -> OffsetDateTime;
}

/// Wall-clock implementation backed by [`OffsetDateTime::now_utc`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now_utc(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}
