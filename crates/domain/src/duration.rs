//! Duration parsing and formatting shared by source adapters and user input.
//!
//! Three textual encodings reach us:
//! - clock strings from native timers: `H:MM:SS` or `M:SS`, optionally
//!   prefixed with `N day(s), `
//! - ISO-8601 durations from voice-assistant records: `PT5M`, `P1DT2H`
//! - human entry: combinations of `_h`, `_m`, `_s`, or a bare number of minutes

use crate::time::{HOUR, MINUTE, Millis, SECOND, bounded, millis_from_f64};

const DAY: Millis = 24 * HOUR;

/// Parse `H:MM:SS` / `M:SS` into milliseconds.
#[must_use]
pub fn parse_clock_duration(text: &str) -> Option<Millis> {
    let text = text.trim();
    let (days, clock) = match text.split_once(',') {
        Some((prefix, rest)) => {
            let count = prefix.split_whitespace().next()?.parse::<i64>().ok()?;
            (count, rest.trim())
        }
        None => (0, text),
    };

    let parts: Vec<&str> = clock.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (h.parse::<i64>().ok()?, m.parse::<i64>().ok()?, *s),
        [m, s] => (0, m.parse::<i64>().ok()?, *s),
        _ => return None,
    };
    let seconds = seconds.parse::<f64>().ok()?;
    if days < 0 || hours < 0 || minutes < 0 || seconds < 0.0 {
        return None;
    }

    let seconds_ms = millis_from_f64(seconds * 1000.0)?;
    [(days, DAY), (hours, HOUR), (minutes, MINUTE), (seconds_ms, 1)]
        .into_iter()
        .try_fold(0, |total: Millis, (count, unit)| {
            total.checked_add(count.checked_mul(unit)?)
        })
        .and_then(bounded)
}

/// Parse an ISO-8601 duration such as `PT1H30M` or `P1DT0.5S`.
///
/// Years, months and weeks are rejected: their length is calendar
/// dependent and no timer source emits them.
#[must_use]
pub fn parse_iso8601_duration(text: &str) -> Option<Millis> {
    let rest = text.trim().strip_prefix('P')?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((d, t)) => (d, Some(t)),
        None => (rest, None),
    };

    let mut total = 0.0_f64;
    let mut seen = false;

    for (value, unit) in designators(date_part)? {
        match unit {
            'D' => total += value * DAY as f64,
            _ => return None,
        }
        seen = true;
    }
    if let Some(time_part) = time_part {
        for (value, unit) in designators(time_part)? {
            total += value
                * match unit {
                    'H' => HOUR as f64,
                    'M' => MINUTE as f64,
                    'S' => SECOND as f64,
                    _ => return None,
                };
            seen = true;
        }
    }

    if seen { millis_from_f64(total) } else { None }
}

/// Split `1H30M` into `[(1.0, 'H'), (30.0, 'M')]`.
fn designators(text: &str) -> Option<Vec<(f64, char)>> {
    let mut out = Vec::new();
    let mut number = String::new();
    for ch in text.chars() {
        if ch.is_ascii_digit() || ch == '.' || ch == ',' {
            number.push(if ch == ',' { '.' } else { ch });
        } else {
            let value = number.parse::<f64>().ok()?;
            out.push((value, ch.to_ascii_uppercase()));
            number.clear();
        }
    }
    number.is_empty().then_some(out)
}

/// Parse human duration entry: `1h30m`, `90s`, `2m 10s`, `1.5h`, or a bare
/// number interpreted as minutes. Clock strings are accepted too.
#[must_use]
pub fn parse_human_duration(text: &str) -> Option<Millis> {
    let text = text.trim().to_ascii_lowercase();
    if text.is_empty() {
        return None;
    }
    if text.contains(':') {
        return parse_clock_duration(&text);
    }
    if let Ok(minutes) = text.parse::<f64>() {
        return to_millis(minutes, MINUTE);
    }

    let mut total: Millis = 0;
    let mut number = String::new();
    let mut seen_unit = false;
    for ch in text.chars() {
        match ch {
            '0'..='9' | '.' => number.push(ch),
            'h' | 'm' | 's' => {
                let value = number.parse::<f64>().ok()?;
                let unit = match ch {
                    'h' => HOUR,
                    'm' => MINUTE,
                    _ => SECOND,
                };
                total = total.checked_add(to_millis(value, unit)?).and_then(bounded)?;
                number.clear();
                seen_unit = true;
            }
            c if c.is_whitespace() => {}
            _ => return None,
        }
    }
    // Trailing digits without a unit ("1h30") are ambiguous.
    (seen_unit && number.is_empty()).then_some(total)
}

fn to_millis(value: f64, unit: Millis) -> Option<Millis> {
    if value < 0.0 {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let ms = millis_from_f64(value * unit as f64)?;
    Some(ms)
}

/// Format milliseconds as compact human text: `1h5m`, `1m30s`, `45s`.
#[must_use]
pub fn format_human_duration(ms: Millis) -> String {
    let total_secs = (ms.max(0) + SECOND / 2) / SECOND;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    if seconds > 0 || out.is_empty() {
        out.push_str(&format!("{seconds}s"));
    }
    out
}

/// Format milliseconds as `H:MM:SS`, the shape native timers accept.
#[must_use]
pub fn format_clock_duration(ms: Millis) -> String {
    let total_secs = ms.max(0) / SECOND;
    format!(
        "{}:{:02}:{:02}",
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60
    )
}
