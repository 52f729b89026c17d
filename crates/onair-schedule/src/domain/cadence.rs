//! Wall-clock cadence: fixed minutes past every hour.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, DurationRound, Timelike, Utc};
use thiserror::Error;

/// Why a cadence specification was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CadenceError {
    /// No minutes were listed.
    #[error("cadence lists no minutes")]
    Empty,

    /// An entry is not a minute in `0..60`.
    #[error("invalid cadence minute: {0:?}")]
    InvalidMinute(String),
}

/// Fires at second 0 of each listed minute past every hour, in UTC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cadence {
    minutes: BTreeSet<u32>,
}

impl Cadence {
    /// Parses a comma-separated minute list such as `"0,30"`.
    ///
    /// # Errors
    ///
    /// Returns `CadenceError` for an empty list or an entry outside `0..60`.
    pub fn parse(spec: &str) -> Result<Self, CadenceError> {
        let mut minutes = BTreeSet::new();
        for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let minute: u32 = part
                .parse()
                .map_err(|_| CadenceError::InvalidMinute(part.to_owned()))?;
            if minute >= 60 {
                return Err(CadenceError::InvalidMinute(part.to_owned()));
            }
            minutes.insert(minute);
        }
        if minutes.is_empty() {
            return Err(CadenceError::Empty);
        }
        Ok(Self { minutes })
    }

    /// The first firing strictly after `now`.
    #[must_use]
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let hour = now
            .duration_trunc(Duration::hours(1))
            .unwrap_or_else(|_| now - Duration::minutes(i64::from(now.minute())));
        let later_this_hour = self
            .minutes
            .iter()
            .map(|&m| hour + Duration::minutes(i64::from(m)))
            .find(|candidate| *candidate > now);
        later_this_hour.unwrap_or_else(|| {
            let first = self.minutes.first().copied().unwrap_or(0);
            hour + Duration::hours(1) + Duration::minutes(i64::from(first))
        })
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes: Vec<String> = self.minutes.iter().map(u32::to_string).collect();
        write!(f, "{}", minutes.join(","))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, h, m, s).unwrap()
    }

    #[test]
    fn test_parse_sorts_and_dedupes() {
        let cadence = Cadence::parse(" 30, 0,30 ").unwrap();
        assert_eq!(cadence.to_string(), "0,30");
    }

    #[test]
    fn test_parse_rejects_bad_minutes() {
        assert_eq!(
            Cadence::parse("0,60"),
            Err(CadenceError::InvalidMinute("60".into()))
        );
        assert_eq!(
            Cadence::parse("half"),
            Err(CadenceError::InvalidMinute("half".into()))
        );
        assert_eq!(Cadence::parse(" , "), Err(CadenceError::Empty));
    }

    #[test]
    fn test_next_after_picks_the_next_half_hour() {
        let cadence = Cadence::parse("0,30").unwrap();

        assert_eq!(cadence.next_after(at(10, 12, 5)), at(10, 30, 0));
        assert_eq!(cadence.next_after(at(10, 45, 0)), at(11, 0, 0));
    }

    #[test]
    fn test_next_after_is_strictly_later() {
        let cadence = Cadence::parse("0,30").unwrap();

        assert_eq!(cadence.next_after(at(10, 30, 0)), at(11, 0, 0));
    }

    #[test]
    fn test_next_after_rolls_over_midnight() {
        let cadence = Cadence::parse("15").unwrap();

        assert_eq!(
            cadence.next_after(at(23, 20, 0)),
            Utc.with_ymd_and_hms(2025, 3, 15, 0, 15, 0).unwrap()
        );
    }
}
