//! Text encodings of timestamps and dates stored in SQLite

use crate::error::{DbError, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn encode_timestamp(at: DateTime<Utc>) -> String {
	at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(raw)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::CorruptRow(format!("timestamp '{}': {}", raw, e)))
}

pub(crate) fn encode_date(date: NaiveDate) -> String {
	date.format(DATE_FORMAT).to_string()
}

pub(crate) fn decode_date(raw: &str) -> Result<NaiveDate> {
	NaiveDate::parse_from_str(raw, DATE_FORMAT)
		.map_err(|e| DbError::CorruptRow(format!("date '{}': {}", raw, e)))
}

/// Current instant truncated to the stored precision
pub(crate) fn now() -> DateTime<Utc> {
	let now = Utc::now();
	DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
}
