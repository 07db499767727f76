//! UTC ⇄ Modified / Truncated Julian Day.
//!
//! - MJD 0 is 1858-11-17T00:00:00 UTC, so the Unix epoch sits at MJD 40587.
//! - TJD is defined as `MJD - 40000` and is always derived from the MJD
//!   conversion, never computed independently.
//!
//! Days are 86400 s long (leap seconds are not counted), matching the usual
//! UTC-scale MJD convention.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

use crate::error::{GrbError, Result};

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// MJD of 1970-01-01T00:00:00 UTC.
pub const MJD_UNIX_EPOCH: i64 = 40_587;

/// Fixed offset between MJD and TJD.
pub const TJD_OFFSET: f64 = 40_000.0;

const NANOS_PER_DAY: i64 = 86_400_000_000_000;

/// Parse an ISO-8601 timestamp.
///
/// Accepts RFC 3339 with an explicit offset (converted to UTC) and naive
/// `YYYY-MM-DDTHH:MM:SS[.fff]` / `YYYY-MM-DD HH:MM:SS[.fff]` forms, which are
/// taken to be UTC.
pub fn parse_utc(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    const FMTS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
    for fmt in FMTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }
    Err(GrbError::InvalidTime {
        input: s.to_string(),
        reason: "expected an ISO-8601 timestamp such as 2025-04-19T05:00:00".to_string(),
    })
}

/// Convert a UTC instant to MJD.
pub fn utc_to_mjd(t: DateTime<Utc>) -> f64 {
    // Split into whole days and a remainder so the integer part stays exact.
    let secs = t.timestamp();
    let days = secs.div_euclid(86_400);
    let rem_secs = secs.rem_euclid(86_400);
    let rem = rem_secs as f64 + f64::from(t.timestamp_subsec_nanos()) * 1e-9;
    (MJD_UNIX_EPOCH + days) as f64 + rem / SECONDS_PER_DAY
}

/// Convert an MJD value to a UTC instant (nanosecond resolution).
pub fn mjd_to_utc(mjd: f64) -> Result<DateTime<Utc>> {
    if !mjd.is_finite() {
        return Err(GrbError::InvalidTime {
            input: mjd.to_string(),
            reason: "MJD must be finite".to_string(),
        });
    }
    let out_of_range = || GrbError::InvalidTime {
        input: mjd.to_string(),
        reason: "MJD outside the representable calendar range".to_string(),
    };

    let whole = mjd.floor();
    let mut day_nanos = ((mjd - whole) * NANOS_PER_DAY as f64).round() as i64;
    // `as` saturates, so huge inputs land on i64::MIN/MAX and fail here or below.
    let mut unix_days = (whole as i64).checked_sub(MJD_UNIX_EPOCH).ok_or_else(out_of_range)?;
    if day_nanos >= NANOS_PER_DAY {
        unix_days = unix_days.checked_add(1).ok_or_else(out_of_range)?;
        day_nanos -= NANOS_PER_DAY;
    }

    let midnight = unix_days
        .checked_mul(86_400)
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(out_of_range)?;
    midnight
        .checked_add_signed(TimeDelta::nanoseconds(day_nanos))
        .ok_or_else(out_of_range)
}

/// Convert a UTC instant to TJD (`MJD - 40000`).
pub fn utc_to_tjd(t: DateTime<Utc>) -> f64 {
    utc_to_mjd(t) - TJD_OFFSET
}

/// Convert a TJD value to a UTC instant.
pub fn tjd_to_utc(tjd: f64) -> Result<DateTime<Utc>> {
    mjd_to_utc(tjd + TJD_OFFSET)
}

/// Signed seconds from `from` to `to`.
pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) * 1e-9
}
