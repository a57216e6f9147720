//! Timecode parsing and formatting.
//!
//! The encoder reports both the total duration and the elapsed position as
//! `HH:MM:SS.ff` timecodes; this module turns them into seconds and back.

use thiserror::Error;

/// Errors from timecode parsing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    #[error("empty timecode")]
    Empty,

    #[error("invalid timecode format: {0}")]
    InvalidFormat(String),

    #[error("invalid {0} value: {1}")]
    InvalidValue(&'static str, String),
}

/// Parse an `HH:MM:SS.ff` timecode to total seconds.
///
/// Hours and minutes must be unsigned integers; the seconds field must carry a
/// fractional part, matching what the encoder prints.
///
/// # Examples
/// ```
/// use vcomp_models::timestamp::parse_timecode;
/// assert_eq!(parse_timecode("00:01:30.50").unwrap(), 90.5);
/// assert_eq!(parse_timecode("01:00:00.00").unwrap(), 3600.0);
/// ```
pub fn parse_timecode(tc: &str) -> Result<f64, TimestampError> {
    let tc = tc.trim();
    if tc.is_empty() {
        return Err(TimestampError::Empty);
    }

    let parts: Vec<&str> = tc.split(':').collect();
    if parts.len() != 3 {
        return Err(TimestampError::InvalidFormat(tc.to_string()));
    }

    let hours = parse_digits(parts[0], "hours")?;
    let minutes = parse_digits(parts[1], "minutes")?;

    let (whole, frac) = parts[2]
        .split_once('.')
        .ok_or_else(|| TimestampError::InvalidFormat(tc.to_string()))?;
    if whole.is_empty()
        || frac.is_empty()
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !frac.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(TimestampError::InvalidValue("seconds", parts[2].to_string()));
    }
    let seconds: f64 = parts[2]
        .parse()
        .map_err(|_| TimestampError::InvalidValue("seconds", parts[2].to_string()))?;

    Ok(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
}

fn parse_digits(field: &str, name: &'static str) -> Result<u64, TimestampError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimestampError::InvalidValue(name, field.to_string()));
    }
    field
        .parse()
        .map_err(|_| TimestampError::InvalidValue(name, field.to_string()))
}

/// Format seconds as `HH:MM:SS` for display (fractions are truncated).
///
/// Negative and non-finite inputs render as `00:00:00`. Hours are not wrapped
/// at 24.
pub fn format_hms(total_secs: f64) -> String {
    let secs = if total_secs.is_finite() && total_secs > 0.0 {
        total_secs.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timecode() {
        assert_eq!(parse_timecode("00:01:30.50").unwrap(), 90.5);
        assert_eq!(parse_timecode("00:00:00.00").unwrap(), 0.0);
        assert_eq!(parse_timecode("02:03:04.25").unwrap(), 2.0 * 3600.0 + 3.0 * 60.0 + 4.25);
        assert_eq!(parse_timecode(" 10:00:00.0 ").unwrap(), 36000.0);
    }

    #[test]
    fn test_parse_timecode_sums_components_exactly() {
        for (h, m, s) in [(0u64, 0u64, "01.10"), (1, 59, "59.99"), (12, 0, "00.50"), (99, 30, "15.04")] {
            let tc = format!("{:02}:{:02}:{}", h, m, s);
            let expected = h as f64 * 3600.0 + m as f64 * 60.0 + s.parse::<f64>().unwrap();
            assert_eq!(parse_timecode(&tc).unwrap(), expected, "timecode {}", tc);
        }
    }

    #[test]
    fn test_parse_timecode_rejects_malformed() {
        assert_eq!(parse_timecode(""), Err(TimestampError::Empty));
        assert!(matches!(parse_timecode("01:30.50"), Err(TimestampError::InvalidFormat(_))));
        assert!(matches!(parse_timecode("00:01:30"), Err(TimestampError::InvalidFormat(_))));
        assert!(parse_timecode("-00:00:01.00").is_err());
        assert!(parse_timecode("aa:00:01.00").is_err());
        assert!(parse_timecode("00:00:01.").is_err());
        assert!(parse_timecode("N/A").is_err());
    }

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(0.0), "00:00:00");
        assert_eq!(format_hms(90.5), "00:01:30");
        assert_eq!(format_hms(3661.9), "01:01:01");
        assert_eq!(format_hms(-5.0), "00:00:00");
        assert_eq!(format_hms(f64::NAN), "00:00:00");
        assert_eq!(format_hms(100.0 * 3600.0), "100:00:00");
    }
}
