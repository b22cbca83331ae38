//! Time and timestamp helpers.
//!
//! Timers live on the epoch-millisecond scale because that is what the
//! persisted JSON schema and the platform attributes carry.

use chrono::{DateTime, Utc};

/// Milliseconds since the Unix epoch, or a millisecond span.
pub type Millis = i64;

pub const SECOND: Millis = 1_000;
pub const MINUTE: Millis = 60 * SECOND;
pub const HOUR: Millis = 60 * MINUTE;

/// Largest magnitude accepted for a parsed timestamp or span
/// (`9999-12-31T23:59:59.999Z`). Adding or subtracting two values within
/// this bound cannot overflow.
pub const MAX_MILLIS: Millis = 253_402_300_799_999;

/// `Some(ms)` when `ms` lies within `±MAX_MILLIS`.
#[must_use]
pub fn bounded(ms: Millis) -> Option<Millis> {
    (-MAX_MILLIS..=MAX_MILLIS).contains(&ms).then_some(ms)
}

/// Round a parsed floating point value to milliseconds.
///
/// NaN, infinities and values outside `±MAX_MILLIS` yield `None`.
#[must_use]
pub fn millis_from_f64(value: f64) -> Option<Millis> {
    #[allow(clippy::cast_precision_loss)]
    let limit = MAX_MILLIS as f64;
    let rounded = value.round();
    if !rounded.is_finite() || rounded.abs() > limit {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let ms = rounded as Millis;
    Some(ms)
}

/// Return the current UTC time in epoch milliseconds.
#[must_use]
pub fn now_ms() -> Millis {
    Utc::now().timestamp_millis()
}

/// Parse an RFC 3339 / ISO-8601 timestamp into epoch milliseconds.
///
/// Returns `None` for anything chrono cannot read, including the platform's
/// `unknown` / `unavailable` placeholder states.
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<Millis> {
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc).timestamp_millis())
}

/// Format epoch milliseconds as an RFC 3339 UTC timestamp.
#[must_use]
pub fn format_timestamp(ms: Millis) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .unwrap_or_default()
        .to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_return_current_time() {
        let before = Utc::now().timestamp_millis();
        let ts = now_ms();
        let after = Utc::now().timestamp_millis();
        assert!(ts >= before);
        assert!(ts <= after);
    }

    #[test]
    fn should_parse_utc_timestamp() {
        let ms = parse_timestamp("2023-11-14T22:13:20+00:00").unwrap();
        assert_eq!(ms, 1_700_000_000_000);
    }

    #[test]
    fn should_parse_offset_timestamp() {
        let ms = parse_timestamp("2023-11-14T23:13:20+01:00").unwrap();
        assert_eq!(ms, 1_700_000_000_000);
    }

    #[test]
    fn should_reject_placeholder_states() {
        assert!(parse_timestamp("unknown").is_none());
        assert!(parse_timestamp("unavailable").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn should_reject_unrepresentable_floats() {
        assert_eq!(millis_from_f64(1_500.4), Some(1_500));
        assert_eq!(millis_from_f64(-1e30), None);
        assert_eq!(millis_from_f64(1e30), None);
        assert_eq!(millis_from_f64(f64::NAN), None);
        assert_eq!(millis_from_f64(f64::INFINITY), None);
    }

    #[test]
    fn should_bound_integer_millis() {
        assert_eq!(bounded(MAX_MILLIS), Some(MAX_MILLIS));
        assert_eq!(bounded(-MAX_MILLIS), Some(-MAX_MILLIS));
        assert_eq!(bounded(i64::MAX), None);
        assert_eq!(bounded(i64::MIN), None);
    }

    #[test]
    fn should_format_and_parse_back() {
        let text = format_timestamp(1_700_000_000_000);
        assert_eq!(parse_timestamp(&text), Some(1_700_000_000_000));
    }
}
