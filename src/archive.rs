//! In-memory reading store: today's feed plus a date-keyed history

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::GlucoseError;
use crate::reading::Reading;
use crate::stats::round_mean;

/// Readings grouped by local calendar date.
///
/// Serializes as a JSON object keyed by `YYYY-MM-DD`. Deserializing checks
/// every day the same way `insert_day` does.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<NaiveDate, Vec<Reading>>",
    into = "BTreeMap<NaiveDate, Vec<Reading>>"
)]
pub struct HistoricalArchive {
    days: BTreeMap<NaiveDate, Vec<Reading>>,
}

impl TryFrom<BTreeMap<NaiveDate, Vec<Reading>>> for HistoricalArchive {
    type Error = GlucoseError;

    fn try_from(days: BTreeMap<NaiveDate, Vec<Reading>>) -> Result<Self, Self::Error> {
        let mut archive = HistoricalArchive::new();
        for (date, readings) in days {
            archive.insert_day(date, readings)?;
        }
        Ok(archive)
    }
}

impl From<HistoricalArchive> for BTreeMap<NaiveDate, Vec<Reading>> {
    fn from(archive: HistoricalArchive) -> Self {
        archive.days
    }
}

impl HistoricalArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group readings by their local date, keeping input order within a day
    pub fn from_readings<I>(readings: I) -> Self
    where
        I: IntoIterator<Item = Reading>,
    {
        let mut days: BTreeMap<NaiveDate, Vec<Reading>> = BTreeMap::new();
        for reading in readings {
            days.entry(reading.local_date()).or_default().push(reading);
        }
        Self { days }
    }

    /// Store a whole day, replacing what was there.
    ///
    /// Every reading must fall on `date` in its own local time.
    pub fn insert_day(&mut self, date: NaiveDate, readings: Vec<Reading>) -> Result<(), GlucoseError> {
        if let Some(stray) = readings.iter().find(|r| r.local_date() != date) {
            return Err(GlucoseError::InvalidDate(format!(
                "reading at {} does not belong to {}",
                stray.timestamp.to_rfc3339(),
                date
            )));
        }
        self.days.insert(date, readings);
        Ok(())
    }

    pub fn get(&self, date: NaiveDate) -> Option<&[Reading]> {
        self.days.get(&date).map(Vec::as_slice)
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Total readings across all days
    pub fn reading_count(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    /// The `n` most recent dates, newest first
    pub fn recent_dates(&self, n: usize) -> Vec<NaiveDate> {
        self.days.keys().rev().take(n).copied().collect()
    }
}

/// Today's readings and the historical archive, rebuilt on every refresh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingStore {
    pub today: Vec<Reading>,
    pub history: HistoricalArchive,
}

impl ReadingStore {
    pub fn new(today: Vec<Reading>, history: HistoricalArchive) -> Self {
        Self { today, history }
    }

    /// Most recent reading of today
    pub fn current_reading(&self) -> Option<&Reading> {
        self.today.last()
    }

    /// Today's mean value, rounded
    #[allow(dead_code)]
    pub fn today_average(&self) -> Option<u16> {
        round_mean(&self.today)
    }

    /// Readings archived for a date; empty when the date is unknown
    pub fn day(&self, date: NaiveDate) -> &[Reading] {
        self.history.get(date).unwrap_or(&[])
    }

    /// Last `n` readings of today, newest first
    pub fn recent(&self, n: usize) -> Vec<&Reading> {
        self.today.iter().rev().take(n).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(value: u16, ts: &str) -> Reading {
        Reading::parse(value, ts).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_group_by_local_date() {
        let archive = HistoricalArchive::from_readings(vec![
            reading(100, "2025-03-01T10:00:00+00:00"),
            reading(110, "2025-03-01T23:55:00-02:00"),
            reading(120, "2025-03-02T00:05:00+00:00"),
        ]);
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.get(date(2025, 3, 1)).unwrap().len(), 2);
        assert_eq!(archive.get(date(2025, 3, 2)).unwrap()[0].value, 120);
        assert_eq!(archive.reading_count(), 3);
    }

    #[test]
    fn test_insert_day_rejects_foreign_reading() {
        let mut archive = HistoricalArchive::new();
        let result = archive.insert_day(
            date(2025, 3, 1),
            vec![reading(100, "2025-03-02T10:00:00+00:00")],
        );
        assert!(matches!(result, Err(GlucoseError::InvalidDate(_))));
        assert!(archive.is_empty());
    }

    #[test]
    fn test_recent_dates_newest_first() {
        let mut archive = HistoricalArchive::new();
        for d in [3, 1, 10, 7] {
            archive.insert_day(date(2025, 3, d), Vec::new()).unwrap();
        }
        assert_eq!(
            archive.recent_dates(3),
            vec![date(2025, 3, 10), date(2025, 3, 7), date(2025, 3, 3)]
        );
        assert_eq!(archive.recent_dates(10).len(), 4);
    }

    #[test]
    fn test_archive_json_keys() {
        let archive = HistoricalArchive::from_readings(vec![reading(100, "2025-03-01T10:00:00+00:00")]);
        let json = serde_json::to_string(&archive).unwrap();
        assert!(json.starts_with("{\"2025-03-01\":["));
        let back: HistoricalArchive = serde_json::from_str(&json).unwrap();
        assert_eq!(back, archive);
    }

    #[test]
    fn test_archive_json_rejects_misfiled_reading() {
        let json = r#"{"2025-03-01":[{"value":100,"timestamp":"2025-03-09T10:00:00+00:00"}]}"#;
        let err = serde_json::from_str::<HistoricalArchive>(json).unwrap_err();
        assert!(err.to_string().contains("does not belong to 2025-03-01"), "{}", err);
    }

    #[test]
    fn test_archive_json_checks_local_date() {
        // 23:30 at -05:00 is still March 1st locally
        let json = r#"{"2025-03-01":[{"value":100,"timestamp":"2025-03-01T23:30:00-05:00"}]}"#;
        let archive: HistoricalArchive = serde_json::from_str(json).unwrap();
        assert_eq!(archive.get(date(2025, 3, 1)).unwrap().len(), 1);
    }

    #[test]
    fn test_store_accessors() {
        let today = vec![
            reading(100, "2025-03-01T10:00:00+00:00"),
            reading(103, "2025-03-01T10:05:00+00:00"),
            reading(110, "2025-03-01T10:10:00+00:00"),
        ];
        let store = ReadingStore::new(today.clone(), HistoricalArchive::from_readings(today));

        assert_eq!(store.current_reading().map(|r| r.value), Some(110));
        assert_eq!(store.today_average(), Some(104));
        assert_eq!(store.day(date(2025, 3, 1)).len(), 3);
        assert!(store.day(date(2024, 1, 1)).is_empty());

        let recent: Vec<u16> = store.recent(2).iter().map(|r| r.value).collect();
        assert_eq!(recent, vec![110, 103]);
    }

    #[test]
    fn test_empty_store() {
        let store = ReadingStore::default();
        assert!(store.current_reading().is_none());
        assert_eq!(store.today_average(), None);
    }
}
