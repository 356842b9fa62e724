//! `x-amz-date` rendering.

// crates.io
use time::{UtcOffset, format_description::BorrowedFormatItem, macros::format_description};
// self
use crate::{_prelude::*, sigv4::SignatureError};

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year][month][day]");
const DATETIME_FORMAT: &[BorrowedFormatItem<'_>] =
	format_description!("[year][month][day]T[hour][minute][second]Z");

/// Credential-scope date and `x-amz-date` value rendered from a single instant.
///
/// Both strings come from the same UTC instant, so the header sent on the wire and the
/// timestamp inside the string-to-sign can never straddle a second boundary.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AmzTimestamp {
	date: String,
	datetime: String,
}
impl AmzTimestamp {
	/// Renders `instant` (converted to UTC) as `YYYYMMDD` and `YYYYMMDDTHHMMSSZ`.
	pub fn at(instant: OffsetDateTime) -> Result<Self, SignatureError> {
		let utc = instant.to_offset(UtcOffset::UTC);
		let date = utc.format(DATE_FORMAT).map_err(format_error)?;
		let datetime = utc.format(DATETIME_FORMAT).map_err(format_error)?;

		Ok(Self { date, datetime })
	}

	/// Eight-digit credential-scope date.
	pub fn date(&self) -> &str {
		&self.date
	}

	/// Compact ISO-8601 instant with a trailing `Z`.
	pub fn datetime(&self) -> &str {
		&self.datetime
	}
}

fn format_error(err: time::error::Format) -> SignatureError {
	SignatureError::Timestamp { reason: err.to_string() }
}
