//! ISO-8601 timestamp parsing for query results

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

use crate::checker::error::CheckerQueryError;

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an optional timestamp extracted by a query
///
/// A trailing `Z` is treated as `+00:00`. Values without an offset, including
/// bare dates, are taken as UTC.
pub fn parse_timestamp(
    date_string: Option<&str>,
) -> Result<Option<DateTime<FixedOffset>>, CheckerQueryError> {
    let Some(date_string) = date_string else {
        return Ok(None);
    };

    let normalized = match date_string.strip_suffix('Z') {
        Some(rest) => format!("{}+00:00", rest),
        None => date_string.to_string(),
    };

    parse_iso8601(&normalized)
        .map(Some)
        .map_err(|e| CheckerQueryError::with_source("Failed to parse timestamp", e))
}

fn parse_iso8601(value: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    let mut last_err = None;

    for format in OFFSET_FORMATS {
        match DateTime::parse_from_str(value, format) {
            Ok(parsed) => return Ok(parsed),
            Err(e) => last_err = Some(e),
        }
    }

    for format in NAIVE_FORMATS {
        match NaiveDateTime::parse_from_str(value, format) {
            Ok(parsed) => return Ok(parsed.and_utc().fixed_offset()),
            Err(e) => last_err = Some(e),
        }
    }

    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => Ok(date.and_time(chrono::NaiveTime::MIN).and_utc().fixed_offset()),
        // the date-only attempt is the least specific, report the first failure
        Err(e) => Err(last_err.unwrap_or(e)),
    }
}
