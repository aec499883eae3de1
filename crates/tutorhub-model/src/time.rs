// SPDX-License-Identifier: Apache-2.0

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Wall-clock minute of day, no timezone attached. Session and availability
/// times are naive local times end to end; that is the upstream contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const MINUTES_PER_DAY: u16 = 24 * 60;

    /// Accepts `HH:MM` and `HH:MM:SS` (seconds ignored; the upstream schema
    /// stores both forms).
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        let mut parts = s.split(':');
        let hour = parts
            .next()
            .and_then(|p| p.parse::<u16>().ok())
            .ok_or_else(|| ValidationError(format!("invalid time of day: {s}")))?;
        let minute = parts
            .next()
            .and_then(|p| p.parse::<u16>().ok())
            .ok_or_else(|| ValidationError(format!("invalid time of day: {s}")))?;
        if let Some(seconds) = parts.next() {
            if seconds.parse::<u16>().map_or(true, |v| v > 59) {
                return Err(ValidationError(format!("invalid time of day: {s}")));
            }
        }
        if parts.next().is_some() || hour > 23 || minute > 59 {
            return Err(ValidationError(format!("invalid time of day: {s}")));
        }
        Ok(Self(hour * 60 + minute))
    }

    #[must_use]
    pub const fn from_minutes(minutes: u16) -> Option<Self> {
        if minutes < Self::MINUTES_PER_DAY {
            Some(Self(minutes))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn minutes(self) -> u16 {
        self.0
    }

    /// End bound of an interval starting here, in minutes past midnight.
    /// May equal 1440 (exclusive midnight end); never wraps to the next day.
    #[must_use]
    pub fn end_minutes(self, duration_minutes: u32) -> u32 {
        u32::from(self.0) + duration_minutes
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }

    /// Accepts day names (any case) and the 0..=6 Sunday-based indices the
    /// upstream booking form submits.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "monday" | "1" => Ok(Self::Monday),
            "tuesday" | "2" => Ok(Self::Tuesday),
            "wednesday" | "3" => Ok(Self::Wednesday),
            "thursday" | "4" => Ok(Self::Thursday),
            "friday" | "5" => Ok(Self::Friday),
            "saturday" | "6" => Ok(Self::Saturday),
            "sunday" | "0" => Ok(Self::Sunday),
            other => Err(ValidationError(format!("unknown weekday: {other}"))),
        }
    }

    #[must_use]
    pub fn of_date(date: chrono::NaiveDate) -> Self {
        use chrono::Datelike;
        match date.weekday() {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }
}

impl Display for Weekday {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_time_forms() {
        assert_eq!(TimeOfDay::parse("09:00").expect("hm").minutes(), 540);
        assert_eq!(TimeOfDay::parse("09:30:00").expect("hms").minutes(), 570);
        assert!(TimeOfDay::parse("24:00").is_err());
        assert!(TimeOfDay::parse("9").is_err());
        assert!(TimeOfDay::parse("09:60").is_err());
    }

    #[test]
    fn end_minutes_may_touch_midnight() {
        let t = TimeOfDay::parse("23:30").expect("t");
        assert_eq!(t.end_minutes(30), 1440);
    }

    #[test]
    fn weekday_accepts_names_and_indices() {
        assert_eq!(Weekday::parse("Monday").expect("name"), Weekday::Monday);
        assert_eq!(Weekday::parse("0").expect("index"), Weekday::Sunday);
        assert!(Weekday::parse("7").is_err());
    }

    #[test]
    fn weekday_of_date() {
        let d = chrono::NaiveDate::from_ymd_opt(2026, 8, 24).expect("date");
        assert_eq!(Weekday::of_date(d), Weekday::Monday);
    }
}
