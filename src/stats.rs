//! Statistics calculations for glucose readings
//!
//! Every function here is pure: no I/O, no logging, no hidden state.
//! Integer outputs use `f64::round` (half away from zero); inputs are
//! non-negative so this matches half-up rounding everywhere.
//!
//! Empty input yields `None` for most measures. [`standard_deviation`] and
//! [`coefficient_of_variation`] return `0` instead, which is kept for
//! compatibility even though it is inconsistent with the rest.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::archive::HistoricalArchive;
use crate::error::GlucoseError;
use crate::reading::Reading;
use crate::units::TargetRange;

/// Number of hour-of-day buckets in the hourly profile
pub const HOURS_PER_DAY: usize = 24;

/// Window selector for multi-day statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "week")]
    #[default]
    Week,
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "3months")]
    ThreeMonths,
}

impl TimeRange {
    /// How many archived days the window covers
    pub fn days(self) -> usize {
        match self {
            TimeRange::Week => 7,
            TimeRange::Month => 30,
            TimeRange::ThreeMonths => 90,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeRange::Week => "week",
            TimeRange::Month => "month",
            TimeRange::ThreeMonths => "3months",
        }
    }

    /// Lenient parse: anything unrecognized selects a week
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeRange {
    type Err = GlucoseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(TimeRange::Week),
            "month" => Ok(TimeRange::Month),
            "3months" => Ok(TimeRange::ThreeMonths),
            other => Err(GlucoseError::Config(format!("unknown time range: {}", other))),
        }
    }
}

/// Single-day summary shown on the history screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStatistics {
    pub average: Option<u16>,
    pub min: Option<u16>,
    pub max: Option<u16>,
    /// Percentage 0-100
    pub time_in_range: Option<u8>,
}

impl DailyStatistics {
    pub fn from_readings(readings: &[Reading], range: TargetRange) -> Self {
        Self {
            average: round_mean(readings),
            min: readings.iter().map(|r| r.value).min(),
            max: readings.iter().map(|r| r.value).max(),
            time_in_range: time_in_range(readings, range),
        }
    }
}

/// Low / in-range / high split, each rounded independently.
///
/// The three need not add up to exactly 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeInRangeBreakdown {
    pub in_range: u8,
    pub high: u8,
    pub low: u8,
}

impl TimeInRangeBreakdown {
    pub fn from_readings(readings: &[Reading], range: TargetRange) -> Self {
        let total = readings.len();
        if total == 0 {
            return Self::default();
        }

        let (mut low, mut in_range, mut high) = (0usize, 0usize, 0usize);
        for r in readings {
            if range.is_below(r.value) {
                low += 1;
            } else if range.is_above(r.value) {
                high += 1;
            } else {
                in_range += 1;
            }
        }

        Self {
            in_range: percent(in_range, total),
            high: percent(high, total),
            low: percent(low, total),
        }
    }
}

/// Multi-day statistics for the stats screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStatistics {
    pub average: Option<u16>,
    #[serde(rename = "estimatedA1C")]
    pub estimated_a1c: Option<f64>,
    pub standard_deviation: Option<u16>,
    pub coefficient_of_variation: Option<u32>,
    pub time_in_range_data: TimeInRangeBreakdown,
    /// Mean per hour of day, index = hour; 0 where no readings
    pub average_by_hour: [u16; HOURS_PER_DAY],
}

impl AggregateStatistics {
    /// Result for a window with no readings at all
    pub fn empty() -> Self {
        Self {
            average: None,
            estimated_a1c: None,
            standard_deviation: None,
            coefficient_of_variation: None,
            time_in_range_data: TimeInRangeBreakdown::default(),
            average_by_hour: [0; HOURS_PER_DAY],
        }
    }

    /// Statistics over the most recent `time_range.days()` archived dates.
    ///
    /// Dates are picked by key, newest first; gaps in the calendar are not
    /// filled, so a sparse archive may reach further back than the window.
    pub fn compute(archive: &HistoricalArchive, time_range: TimeRange, range: TargetRange) -> Self {
        let readings: Vec<Reading> = archive
            .recent_dates(time_range.days())
            .into_iter()
            .filter_map(|date| archive.get(date))
            .flat_map(|day| day.iter().cloned())
            .collect();

        Self::from_readings(&readings, range)
    }

    /// Statistics over an already-selected flat set of readings
    pub fn from_readings(readings: &[Reading], range: TargetRange) -> Self {
        let Some(average) = round_mean(readings) else {
            return Self::empty();
        };

        let std_dev = standard_deviation(readings);

        Self {
            average: Some(average),
            estimated_a1c: Some(estimated_a1c(f64::from(average))),
            standard_deviation: Some(std_dev),
            coefficient_of_variation: Some(coefficient_of_variation(
                f64::from(average),
                f64::from(std_dev),
            )),
            time_in_range_data: TimeInRangeBreakdown::from_readings(readings, range),
            average_by_hour: average_by_hour(readings),
        }
    }
}

/// Percentage of readings inside the target range, rounded
pub fn time_in_range(readings: &[Reading], range: TargetRange) -> Option<u8> {
    if readings.is_empty() {
        return None;
    }
    let in_range = readings.iter().filter(|r| range.contains(r.value)).count();
    Some(percent(in_range, readings.len()))
}

/// Estimated A1C (%) from mean glucose, rounded to one decimal
pub fn estimated_a1c(average_glucose: f64) -> f64 {
    let a1c = (average_glucose + 46.7) / 28.7;
    (a1c * 10.0).round() / 10.0
}

/// Population standard deviation of the values, rounded.
///
/// Empty input gives 0, not `None`.
pub fn standard_deviation(readings: &[Reading]) -> u16 {
    if readings.is_empty() {
        return 0;
    }
    let mean = mean(readings);
    let variance = readings
        .iter()
        .map(|r| (f64::from(r.value) - mean).powi(2))
        .sum::<f64>()
        / readings.len() as f64;
    variance.sqrt().round() as u16
}

/// Standard deviation as a percentage of the mean; 0 when the mean is 0
pub fn coefficient_of_variation(average: f64, std_dev: f64) -> u32 {
    if average == 0.0 {
        return 0;
    }
    ((std_dev / average) * 100.0).round() as u32
}

/// Rounded arithmetic mean, `None` for no readings
pub fn round_mean(readings: &[Reading]) -> Option<u16> {
    if readings.is_empty() {
        return None;
    }
    Some(mean(readings).round() as u16)
}

fn mean(readings: &[Reading]) -> f64 {
    let sum: u64 = readings.iter().map(|r| u64::from(r.value)).sum();
    sum as f64 / readings.len() as f64
}

fn percent(count: usize, total: usize) -> u8 {
    ((count as f64 / total as f64) * 100.0).round() as u8
}

/// Mean value per local hour of day
fn average_by_hour(readings: &[Reading]) -> [u16; HOURS_PER_DAY] {
    let mut sums = [0u64; HOURS_PER_DAY];
    let mut counts = [0usize; HOURS_PER_DAY];

    for r in readings {
        let hour = r.local_hour();
        sums[hour] += u64::from(r.value);
        counts[hour] += 1;
    }

    let mut averages = [0u16; HOURS_PER_DAY];
    for (hour, avg) in averages.iter_mut().enumerate() {
        if counts[hour] > 0 {
            *avg = (sums[hour] as f64 / counts[hour] as f64).round() as u16;
        }
    }
    averages
}
