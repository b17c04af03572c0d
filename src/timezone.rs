//! Display formatting for stored UTC timestamps

use crate::error::{HelpdeskError, Result};
use chrono::{DateTime, FixedOffset, Utc};

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Converts a stored UTC timestamp into a display string
pub trait TimezoneFormatter: Send + Sync {
    fn format(&self, at: DateTime<Utc>) -> String;

    /// Human name of the zone, for report headers
    fn label(&self) -> &str;

    fn format_opt(&self, at: Option<DateTime<Utc>>) -> String {
        at.map(|t| self.format(t)).unwrap_or_default()
    }
}

/// Formats timestamps at a fixed UTC offset
#[derive(Debug, Clone)]
pub struct OffsetFormatter {
    offset: FixedOffset,
    label: String,
}

impl OffsetFormatter {
    /// Parse offsets like `+05:30`, `-04:00`, `+0530` or `UTC`
    pub fn parse(utc_offset: &str, label: impl Into<String>) -> Result<Self> {
        let offset = parse_offset(utc_offset)?;
        Ok(Self {
            offset,
            label: label.into(),
        })
    }

    /// Indian Standard Time, the installation default
    #[must_use]
    pub fn ist() -> Self {
        Self {
            offset: FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap_or_else(utc),
            label: "Indian Standard Time (IST)".to_string(),
        }
    }
}

impl TimezoneFormatter for OffsetFormatter {
    fn format(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset).format(DISPLAY_FORMAT).to_string()
    }

    fn label(&self) -> &str {
        &self.label
    }
}

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap_or_else(|| unreachable!("zero offset is always valid"))
}

fn parse_offset(raw: &str) -> Result<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("utc") || raw.eq_ignore_ascii_case("z") {
        return Ok(utc());
    }

    let invalid = || HelpdeskError::validation(format!("Invalid UTC offset: {raw}"));
    let (sign, rest) = match raw.chars().next() {
        Some('+') => (1, &raw[1..]),
        Some('-') => (-1, &raw[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 14 || minutes >= 60 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_ist_formatting() {
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 20, 0, 0).unwrap();
        assert_eq!(OffsetFormatter::ist().format(at), "2024-03-16 01:30:00");
    }

    #[test]
    fn test_parse_offsets() {
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let ny = OffsetFormatter::parse("-04:00", "EDT").unwrap();
        assert_eq!(ny.format(at), "2024-03-15 08:00:00");

        let compact = OffsetFormatter::parse("+0545", "NPT").unwrap();
        assert_eq!(compact.format(at), "2024-03-15 17:45:00");

        assert!(OffsetFormatter::parse("UTC", "UTC").is_ok());
        assert!(OffsetFormatter::parse("05:30", "bad").is_err());
        assert!(OffsetFormatter::parse("+25:00", "bad").is_err());
    }

    #[test]
    fn test_format_opt_empty_for_none() {
        assert_eq!(OffsetFormatter::ist().format_opt(None), "");
    }
}
