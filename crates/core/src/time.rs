use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{Result, TracedeckError};

// Accepts an RFC3339 timestamp, the literal "now", or a relative duration
// like "15m" interpreted as that long ago.
pub fn parse_time_or_relative(input: &str) -> Result<DateTime<Utc>> {
    if input.eq_ignore_ascii_case("now") {
        return Ok(Utc::now());
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }

    if let Ok(duration) = humantime::parse_duration(input) {
        let offset = chrono::Duration::from_std(duration)
            .map_err(|e| TracedeckError::Parse(format!("duration out of range: {e}")))?;
        return Ok(Utc::now() - offset);
    }

    Err(TracedeckError::Parse(format!(
        "expected RFC3339 time or duration, got {input}"
    )))
}

pub fn parse_duration_str(input: &str) -> Result<Duration> {
    humantime::parse_duration(input)
        .map_err(|e| TracedeckError::Parse(format!("invalid duration {input}: {e}")))
}
