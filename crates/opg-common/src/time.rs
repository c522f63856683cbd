//! Calendar handling for OPG tables and reanalysis time axes.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid date format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported CF time units: {0}")]
    UnsupportedUnits(String),

    #[error("Time offset out of range: {0}")]
    OutOfRange(String),
}

/// Parse a calendar date.
///
/// Accepts `YYYY-MM-DD` and full timestamps (`YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS`), keeping only the date part.
pub fn parse_date(s: &str) -> Result<NaiveDate, TimeParseError> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    parse_datetime(s)
        .map(|dt| dt.date())
        .map_err(|_| TimeParseError::InvalidFormat(s.to_string()))
}

/// Parse a timestamp in any of the layouts found in CSV indexes and CF
/// reference times. A bare date means midnight.
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime, TimeParseError> {
    let s = s.trim().trim_end_matches('Z');
    const FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for format in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }
    // CF reference times sometimes omit zero padding ("1900-1-1 0:0:0")
    if let Some((date, time)) = s.split_once(' ') {
        if let (Ok(date), Ok(time)) = (
            NaiveDate::parse_from_str(date, "%Y-%m-%d"),
            chrono::NaiveTime::parse_from_str(time, "%H:%M:%S%.f"),
        ) {
            return Ok(date.and_time(time));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| TimeParseError::InvalidFormat(s.to_string()))
}

/// A closed calendar-day interval `[start, end]`.
///
/// An interval whose start is after its end contains no days; filtering
/// with it yields an empty selection rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parse two ISO dates.
    pub fn parse(start: &str, end: &str) -> Result<Self, TimeParseError> {
        Ok(Self::new(parse_date(start)?, parse_date(end)?))
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Whether a timestamp falls on a day inside the interval.
    pub fn contains_datetime(&self, dt: &NaiveDateTime) -> bool {
        self.contains(dt.date())
    }

    /// Number of calendar days covered (0 for an inverted interval).
    pub fn num_days(&self) -> usize {
        if self.start > self.end {
            return 0;
        }
        (self.end - self.start).num_days() as usize + 1
    }
}

/// Step unit of a CF time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfTimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl CfTimeUnit {
    fn seconds(&self) -> f64 {
        match self {
            CfTimeUnit::Seconds => 1.0,
            CfTimeUnit::Minutes => 60.0,
            CfTimeUnit::Hours => 3600.0,
            CfTimeUnit::Days => 86400.0,
        }
    }
}

/// Decoder for CF-convention time axes such as
/// `"hours since 1900-01-01 00:00:00.0"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CfTimeAxis {
    pub unit: CfTimeUnit,
    pub reference: NaiveDateTime,
}

impl CfTimeAxis {
    /// Parse a CF `units` attribute.
    pub fn parse(units: &str) -> Result<Self, TimeParseError> {
        let (unit, reference) = units
            .split_once(" since ")
            .ok_or_else(|| TimeParseError::UnsupportedUnits(units.to_string()))?;

        let unit = match unit.trim().to_ascii_lowercase().as_str() {
            "second" | "seconds" | "s" | "sec" | "secs" => CfTimeUnit::Seconds,
            "minute" | "minutes" | "min" | "mins" => CfTimeUnit::Minutes,
            "hour" | "hours" | "h" | "hr" | "hrs" => CfTimeUnit::Hours,
            "day" | "days" | "d" => CfTimeUnit::Days,
            _ => return Err(TimeParseError::UnsupportedUnits(units.to_string())),
        };

        // Drop a trailing time zone token ("... 00:00:00 UTC")
        let reference = reference.trim().trim_end_matches(" UTC").trim_end_matches(" utc");
        let reference = parse_datetime(reference)?;

        Ok(Self { unit, reference })
    }

    /// Convert an offset along the axis to a timestamp, rounded to the second.
    ///
    /// Non-finite offsets (unmasked fill values decode as NaN or as huge
    /// numbers) and offsets past chrono's calendar are errors.
    pub fn decode(&self, offset: f64) -> Result<NaiveDateTime, TimeParseError> {
        let out_of_range = || TimeParseError::OutOfRange(format!("{} {:?}", offset, self.unit));
        let seconds = (offset * self.unit.seconds()).round();
        if !seconds.is_finite() || seconds.abs() >= i64::MAX as f64 {
            return Err(out_of_range());
        }
        let delta = Duration::try_seconds(seconds as i64).ok_or_else(out_of_range)?;
        self.reference.checked_add_signed(delta).ok_or_else(out_of_range)
    }
}
