//! Glucose readings and trend annotation

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::GlucoseError;

/// A single timestamped glucose measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Glucose in mg/dL
    pub value: u16,
    /// Measurement time; its offset defines the local wall clock
    pub timestamp: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
}

impl Reading {
    pub fn new(value: u16, timestamp: DateTime<FixedOffset>) -> Self {
        Self { value, timestamp, trend: None }
    }

    pub fn with_trend(mut self, trend: Trend) -> Self {
        self.trend = Some(trend);
        self
    }

    /// Parse an RFC 3339 timestamp, e.g. "2025-03-01T08:15:00+01:00"
    #[allow(dead_code)]
    pub fn parse(value: u16, timestamp: &str) -> Result<Self, GlucoseError> {
        let ts = DateTime::parse_from_rfc3339(timestamp)
            .map_err(|e| GlucoseError::InvalidDate(format!("{}: {}", timestamp, e)))?;
        Ok(Self::new(value, ts))
    }

    /// Hour of day (0-23) on the reading's local clock
    pub fn local_hour(&self) -> usize {
        self.timestamp.hour() as usize
    }

    /// Calendar date on the reading's local clock
    pub fn local_date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// CGM trend arrow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    #[serde(rename = "Rising Rapidly")]
    RisingRapidly,
    #[serde(rename = "Rising")]
    Rising,
    #[serde(rename = "Rising Slightly")]
    RisingSlightly,
    #[serde(rename = "Stable")]
    Stable,
    #[serde(rename = "Falling Slightly")]
    FallingSlightly,
    #[serde(rename = "Falling")]
    Falling,
    #[serde(rename = "Falling Rapidly")]
    FallingRapidly,
}

impl Trend {
    pub const ALL: [Trend; 7] = [
        Trend::RisingRapidly,
        Trend::Rising,
        Trend::RisingSlightly,
        Trend::Stable,
        Trend::FallingSlightly,
        Trend::Falling,
        Trend::FallingRapidly,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Trend::RisingRapidly => "Rising Rapidly",
            Trend::Rising => "Rising",
            Trend::RisingSlightly => "Rising Slightly",
            Trend::Stable => "Stable",
            Trend::FallingSlightly => "Falling Slightly",
            Trend::Falling => "Falling",
            Trend::FallingRapidly => "Falling Rapidly",
        }
    }

    /// Arrow glyph shown next to the current value
    pub fn glyph(self) -> &'static str {
        match self {
            Trend::RisingRapidly => "↑↑",
            Trend::Rising => "↑",
            Trend::RisingSlightly => "↗",
            Trend::Stable => "→",
            Trend::FallingSlightly => "↘",
            Trend::Falling => "↓",
            Trend::FallingRapidly => "↓↓",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Trend {
    type Err = GlucoseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Trend::ALL
            .into_iter()
            .find(|t| t.label() == s)
            .ok_or_else(|| GlucoseError::Config(format!("unknown trend: {}", s)))
    }
}

/// Glyph for a raw trend label; missing or unrecognized labels get none
#[allow(dead_code)]
pub fn trend_glyph(trend: Option<&str>) -> Option<&'static str> {
    trend.and_then(|t| t.parse::<Trend>().ok()).map(Trend::glyph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_lookup() {
        assert_eq!(trend_glyph(Some("Rising Rapidly")), Some("↑↑"));
        assert_eq!(trend_glyph(Some("Stable")), Some("→"));
        assert_eq!(trend_glyph(Some("Falling Rapidly")), Some("↓↓"));
        assert_eq!(trend_glyph(Some("Sideways")), None);
        assert_eq!(trend_glyph(Some("")), None);
        assert_eq!(trend_glyph(None), None);
    }

    #[test]
    fn test_every_trend_has_glyph() {
        for trend in Trend::ALL {
            assert_eq!(trend_glyph(Some(trend.label())), Some(trend.glyph()));
        }
    }

    #[test]
    fn test_local_hour_uses_own_offset() {
        let r = Reading::parse(120, "2025-03-01T23:30:00-05:00").unwrap();
        assert_eq!(r.local_hour(), 23);
        assert_eq!(r.local_date(), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    }

    #[test]
    fn test_reading_json_shape() {
        let r = Reading::parse(142, "2025-03-01T08:00:00+00:00")
            .unwrap()
            .with_trend(Trend::RisingSlightly);
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"value\":142"));
        assert!(json.contains("\"trend\":\"Rising Slightly\""));

        let back: Reading = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn test_bad_timestamp() {
        assert!(matches!(
            Reading::parse(100, "yesterday"),
            Err(GlucoseError::InvalidDate(_))
        ));
    }
}
