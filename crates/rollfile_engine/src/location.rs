use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Local, Utc};
use serde::Deserialize;

use rollfile_base::{RollfileError, RollfileResult, err};

/// Time zone used to derive calendar fields from the current instant.
///
/// Defaults to UTC. `Local` follows the process time zone, including
/// daylight-saving transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Location {
    #[default]
    Utc,
    Local,
    Fixed(FixedOffset),
}

impl Location {
    /// A fixed offset, in seconds east of UTC.
    pub fn fixed(seconds_east: i32) -> RollfileResult<Self> {
        FixedOffset::east_opt(seconds_east)
            .map(Location::Fixed)
            .ok_or_else(|| err!("UTC offset out of range: {} seconds", seconds_east))
    }

    /// Converts `instant` into this location's wall-clock time.
    pub fn localize(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Location::Utc => instant.fixed_offset(),
            Location::Local => instant.with_timezone(&Local).fixed_offset(),
            Location::Fixed(offset) => instant.with_timezone(offset),
        }
    }

    /// Zone abbreviation for a time produced by [`Location::localize`].
    ///
    /// `UTC` for the UTC location, otherwise the numeric offset without a
    /// colon (`-0800`) so it can appear in a file name.
    pub fn zone_name(&self, local: &DateTime<FixedOffset>) -> String {
        match self {
            Location::Utc => "UTC".to_string(),
            Location::Local | Location::Fixed(_) => local.format("%z").to_string(),
        }
    }
}

fn parse_offset(text: &str) -> Option<i32> {
    let (sign, rest) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if rest.contains(':') && (rest.len() != 5 || rest.as_bytes()[2] != b':') {
        return None;
    }
    if minutes >= 60 {
        return None;
    }
    Some(sign * (hours * 3600 + minutes * 60))
}

impl FromStr for Location {
    type Err = Box<RollfileError>;

    /// Accepts `UTC`, `Z`, `Local`, or a numeric offset such as `+05:30`,
    /// `-0800` or `+02`.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
            return Ok(Location::Utc);
        }
        if trimmed.eq_ignore_ascii_case("local") {
            return Ok(Location::Local);
        }
        let seconds = parse_offset(trimmed).ok_or_else(|| {
            err!(
                "invalid location '{}': expected UTC, Local or an offset like +05:30",
                text
            )
        })?;
        Location::fixed(seconds)
    }
}

impl TryFrom<String> for Location {
    type Error = Box<RollfileError>;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Utc => write!(f, "UTC"),
            Location::Local => write!(f, "Local"),
            Location::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Offset, TimeZone, Timelike};

    #[test]
    fn test_default_is_utc() {
        assert_eq!(Location::default(), Location::Utc);
    }

    #[test]
    fn test_localize_fixed_offset_crosses_day_boundary() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 10, 3, 0, 0).unwrap();
        let pacific = Location::fixed(-8 * 3600).unwrap();

        let utc = Location::Utc.localize(instant);
        let local = pacific.localize(instant);

        assert_eq!((utc.day(), utc.hour()), (10, 3));
        assert_eq!((local.day(), local.hour()), (9, 19));
        assert_eq!(local.offset().local_minus_utc(), -8 * 3600);
    }

    #[test]
    fn test_localize_local_matches_process_time_zone() {
        let instant = Utc.with_ymd_and_hms(2024, 7, 1, 12, 30, 0).unwrap();

        let localized = Location::Local.localize(instant);
        let expected = instant.with_timezone(&Local);

        assert_eq!(localized.naive_local(), expected.naive_local());
        assert_eq!(
            localized.offset().local_minus_utc(),
            expected.offset().fix().local_minus_utc()
        );
        assert_eq!(localized, instant);
    }

    #[test]
    fn test_zone_name() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 10, 3, 0, 0).unwrap();

        let utc = Location::Utc;
        assert_eq!(utc.zone_name(&utc.localize(instant)), "UTC");

        let pacific = Location::fixed(-8 * 3600).unwrap();
        assert_eq!(pacific.zone_name(&pacific.localize(instant)), "-0800");

        let india = Location::fixed(5 * 3600 + 30 * 60).unwrap();
        assert_eq!(india.zone_name(&india.localize(instant)), "+0530");

        let local = Location::Local.localize(instant);
        assert!(!Location::Local.zone_name(&local).contains(':'));
    }

    #[test]
    fn test_parse_named_locations() {
        assert_eq!("UTC".parse::<Location>().unwrap(), Location::Utc);
        assert_eq!("utc".parse::<Location>().unwrap(), Location::Utc);
        assert_eq!("Z".parse::<Location>().unwrap(), Location::Utc);
        assert_eq!("Local".parse::<Location>().unwrap(), Location::Local);
    }

    #[test]
    fn test_parse_offsets() {
        assert_eq!(
            "+05:30".parse::<Location>().unwrap(),
            Location::fixed(5 * 3600 + 30 * 60).unwrap()
        );
        assert_eq!(
            "-0800".parse::<Location>().unwrap(),
            Location::fixed(-8 * 3600).unwrap()
        );
        assert_eq!(
            "+02".parse::<Location>().unwrap(),
            Location::fixed(2 * 3600).unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for text in ["", "Mars/Olympus", "+5", "+05:3", "+0575", "08:00", "+24:00"] {
            assert!(text.parse::<Location>().is_err(), "accepted {:?}", text);
        }
    }

    #[test]
    fn test_display_round_trips() {
        for location in [
            Location::Utc,
            Location::Local,
            Location::fixed(-8 * 3600).unwrap(),
            Location::fixed(5 * 3600 + 45 * 60).unwrap(),
        ] {
            let text = location.to_string();
            assert_eq!(text.parse::<Location>().unwrap(), location);
        }
    }
}
