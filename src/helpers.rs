//! Timestamp conversion shared by the loader and the writers.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

/// Calendar-date layout used by the close-approach data set, e.g. `1900-Jan-01 00:11`.
const CD_FORMAT: &str = "%Y-%b-%d %H:%M";

/// Output layout for `datetime_utc`.
const OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Parses a close-approach calendar date into a naive UTC timestamp.
pub fn cd_to_datetime(cd: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(cd.trim(), CD_FORMAT)
        .with_context(|| format!("invalid calendar date {cd:?}"))
}

/// Formats a timestamp as `YYYY-MM-DD HH:MM`.
pub fn datetime_to_str(dt: &NaiveDateTime) -> String {
    dt.format(OUTPUT_FORMAT).to_string()
}
