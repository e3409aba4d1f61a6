//! Synthetic CGM feed
//!
//! Produces a 5-minute series following a simple diurnal curve: a flat
//! baseline, a dawn rise and three meal spikes, plus uniform noise.

use std::f64::consts::PI;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use log::warn;
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::archive::{HistoricalArchive, ReadingStore};
use crate::reading::{Reading, Trend};

/// Minutes between synthetic readings
pub const SAMPLE_INTERVAL_MINUTES: i64 = 5;

/// Readings in a complete day
pub const SAMPLES_PER_DAY: i64 = 24 * 60 / SAMPLE_INTERVAL_MINUTES;

/// Days of history produced, today included
pub const HISTORY_DAYS: i64 = 30;

const BASELINE: f64 = 120.0;
const NOISE: f64 = 15.0;

/// (start hour, duration in hours, amplitude in mg/dL)
const EXCURSIONS: [(f64, f64, f64); 4] = [
    (4.0, 3.0, 30.0),  // dawn phenomenon
    (8.0, 2.0, 50.0),  // breakfast
    (12.0, 2.0, 40.0), // lunch
    (18.0, 2.0, 45.0), // dinner
];

pub struct MockGenerator {
    rng: StdRng,
}

impl MockGenerator {
    /// Seeded generators are fully reproducible
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Today's readings up to `now`, and `HISTORY_DAYS` of archive ending today
    pub fn generate(&mut self, now: DateTime<FixedOffset>) -> ReadingStore {
        let offset = *now.offset();
        let today = now.date_naive();

        let today_readings: Vec<Reading> = self
            .day_series(offset, today)
            .into_iter()
            .take_while(|r| r.timestamp <= now)
            .collect();

        let mut history = HistoricalArchive::new();
        for days_back in 0..HISTORY_DAYS {
            let date = today - Duration::days(days_back);
            let readings = if days_back == 0 {
                today_readings.clone()
            } else {
                self.day_series(offset, date)
            };
            // Every timestamp is built from `date`, so the insert cannot fail
            if let Err(e) = history.insert_day(date, readings) {
                warn!("Dropping synthetic day {}: {}", date, e);
            }
        }

        ReadingStore::new(today_readings, history)
    }

    fn day_series(&mut self, offset: FixedOffset, date: NaiveDate) -> Vec<Reading> {
        let midnight = offset.from_utc_datetime(&(date.and_time(NaiveTime::MIN) - offset_duration(offset)));

        (0..SAMPLES_PER_DAY)
            .map(|i| {
                let minutes = i * SAMPLE_INTERVAL_MINUTES;
                // the curve steps once per whole hour
                let hour = (minutes / 60) as f64;
                let trend = Trend::ALL[self.rng.gen_range(0..Trend::ALL.len())];
                Reading::new(self.value_at(hour), midnight + Duration::minutes(minutes)).with_trend(trend)
            })
            .collect()
    }

    fn value_at(&mut self, hour: f64) -> u16 {
        let mut value = BASELINE;
        for (start, length, amplitude) in EXCURSIONS {
            if hour >= start && hour < start + length {
                value += amplitude * ((hour - start) / length * PI).sin();
            }
        }
        value += self.rng.gen_range(-NOISE..NOISE);
        value.round().max(0.0) as u16
    }
}

fn offset_duration(offset: FixedOffset) -> Duration {
    Duration::seconds(i64::from(offset.local_minus_utc()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2025-03-15T10:02:00+01:00").unwrap()
    }

    #[test]
    fn test_today_stops_at_now() {
        let store = MockGenerator::new(Some(1)).generate(now());
        // 00:00 through 10:00 inclusive
        assert_eq!(store.today.len(), 121);
        let last = store.current_reading().unwrap();
        assert_eq!((last.timestamp.hour(), last.timestamp.minute()), (10, 0));
        assert!(store.today.iter().all(|r| r.timestamp <= now()));
    }

    #[test]
    fn test_history_shape() {
        let store = MockGenerator::new(Some(2)).generate(now());
        let today = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();

        assert_eq!(store.history.len(), HISTORY_DAYS as usize);
        assert_eq!(store.history.get(today).unwrap(), store.today.as_slice());

        let yesterday = today.pred_opt().unwrap();
        let past = store.history.get(yesterday).unwrap();
        assert_eq!(past.len(), SAMPLES_PER_DAY as usize);
        assert!(past.iter().all(|r| r.local_date() == yesterday));
        assert_eq!(past[0].timestamp.hour(), 0);
    }

    #[test]
    fn test_values_follow_curve() {
        let store = MockGenerator::new(Some(3)).generate(now());
        for day in store.history.recent_dates(HISTORY_DAYS as usize) {
            for r in store.history.get(day).unwrap() {
                assert!((100..=190).contains(&r.value), "{} at {}", r.value, r.timestamp);
                assert!(r.trend.is_some());
            }
        }
    }

    #[test]
    fn test_excursions_step_per_hour() {
        let store = MockGenerator::new(Some(4)).generate(now());
        let yesterday = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let day = store.history.get(yesterday).unwrap();

        // breakfast adds nothing during hour 8, only noise remains
        for r in day.iter().filter(|r| r.local_hour() == 8) {
            assert!((105..=135).contains(&r.value), "{} at {}", r.value, r.timestamp);
        }
        // and a full half-sine step during hour 9
        for r in day.iter().filter(|r| r.local_hour() == 9) {
            assert!((155..=185).contains(&r.value), "{} at {}", r.value, r.timestamp);
        }
    }

    #[test]
    fn test_seeded_runs_match() {
        let a = MockGenerator::new(Some(42)).generate(now());
        let b = MockGenerator::new(Some(42)).generate(now());
        assert_eq!(a, b);
    }
}
