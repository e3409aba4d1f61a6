//! Dashboard summary: everything the home and stats screens display,
//! computed from one store snapshot.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::archive::ReadingStore;
use crate::reading::Reading;
use crate::stats::{AggregateStatistics, DailyStatistics, TimeRange};
use crate::units::{GlucoseStatus, MgDl, TargetRange};

/// Readings shown on the trend card
pub const RECENT_READINGS: usize = 8;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentGlucose {
    pub value: u16,
    pub timestamp: DateTime<FixedOffset>,
    pub status: GlucoseStatus,
    pub color: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_glyph: Option<&'static str>,
}

impl CurrentGlucose {
    pub fn from_reading(reading: &Reading, range: TargetRange) -> Self {
        let status = range.classify(Some(reading.value));
        Self {
            value: reading.value,
            timestamp: reading.timestamp,
            status,
            color: status.color(),
            trend_glyph: reading.trend.map(|t| t.glyph()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub current: Option<CurrentGlucose>,
    pub today: DailyStatistics,
    pub recent: Vec<CurrentGlucose>,
    pub time_range: TimeRange,
    pub period: AggregateStatistics,
    pub last_updated: String,
}

impl Dashboard {
    pub fn build(
        store: &ReadingStore,
        range: TargetRange,
        time_range: TimeRange,
        last_updated: Option<DateTime<FixedOffset>>,
        now: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            current: store.current_reading().map(|r| CurrentGlucose::from_reading(r, range)),
            today: DailyStatistics::from_readings(&store.today, range),
            recent: store
                .recent(RECENT_READINGS)
                .into_iter()
                .map(|r| CurrentGlucose::from_reading(r, range))
                .collect(),
            time_range,
            period: AggregateStatistics::compute(&store.history, time_range, range),
            last_updated: format_time_ago(last_updated, now),
        }
    }

    /// One-line text rendering for the terminal
    pub fn status_line(&self) -> String {
        let current = match &self.current {
            Some(c) => format!(
                "{} {} [{}]",
                MgDl(c.value).format(),
                c.trend_glyph.unwrap_or(""),
                c.status.label()
            ),
            None => "-- mg/dL [No Data]".to_string(),
        };
        let avg = self.today.average.map_or("--".to_string(), |v| v.to_string());
        let tir = self.today.time_in_range.map_or("--".to_string(), |v| format!("{}%", v));
        let a1c = self.period.estimated_a1c.map_or("--".to_string(), |v| format!("{:.1}%", v));

        format!(
            "{} | today avg {} TIR {} | {} eA1C {} | updated {}",
            current, avg, tir, self.time_range, a1c, self.last_updated
        )
    }
}

/// Human "time ago" text for the last update
pub fn format_time_ago(then: Option<DateTime<FixedOffset>>, now: DateTime<FixedOffset>) -> String {
    let Some(then) = then else {
        return "Never".to_string();
    };

    let minutes = (now - then).num_minutes();
    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes == 1 {
        return "1 minute ago".to_string();
    }
    if minutes < 60 {
        return format!("{} minutes ago", minutes);
    }

    let hours = minutes / 60;
    if hours == 1 {
        return "1 hour ago".to_string();
    }
    if hours < 24 {
        return format!("{} hours ago", hours);
    }

    let days = hours / 24;
    if days == 1 {
        "1 day ago".to_string()
    } else {
        format!("{} days ago", days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::HistoricalArchive;
    use crate::reading::Trend;
    use chrono::Duration;

    fn at(ts: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(ts).unwrap()
    }

    #[test]
    fn test_time_ago() {
        let now = at("2025-03-15T12:00:00+00:00");
        let ago = |d: Duration| format_time_ago(Some(now - d), now);

        assert_eq!(format_time_ago(None, now), "Never");
        assert_eq!(ago(Duration::seconds(59)), "Just now");
        assert_eq!(ago(Duration::seconds(61)), "1 minute ago");
        assert_eq!(ago(Duration::minutes(59)), "59 minutes ago");
        assert_eq!(ago(Duration::minutes(60)), "1 hour ago");
        assert_eq!(ago(Duration::minutes(119)), "1 hour ago");
        assert_eq!(ago(Duration::hours(23)), "23 hours ago");
        assert_eq!(ago(Duration::hours(24)), "1 day ago");
        assert_eq!(ago(Duration::days(3)), "3 days ago");
    }

    #[test]
    fn test_dashboard_from_store() {
        let today = vec![
            Reading::parse(60, "2025-03-15T08:00:00+00:00").unwrap(),
            Reading::parse(120, "2025-03-15T08:05:00+00:00").unwrap(),
            Reading::parse(200, "2025-03-15T08:10:00+00:00")
                .unwrap()
                .with_trend(Trend::Rising),
        ];
        let store = ReadingStore::new(today.clone(), HistoricalArchive::from_readings(today));
        let now = at("2025-03-15T08:12:00+00:00");

        let dash = Dashboard::build(&store, TargetRange::default(), TimeRange::Week, Some(now), now);

        let current = dash.current.as_ref().unwrap();
        assert_eq!(current.value, 200);
        assert_eq!(current.status, GlucoseStatus::High);
        assert_eq!(current.trend_glyph, Some("↑"));
        assert_eq!(dash.today.average, Some(127));
        assert_eq!(dash.today.time_in_range, Some(33));
        assert_eq!(dash.recent.iter().map(|c| c.value).collect::<Vec<_>>(), vec![200, 120, 60]);
        assert_eq!(dash.period.average, Some(127));
        assert_eq!(dash.last_updated, "Just now");

        let line = dash.status_line();
        assert!(line.starts_with("200 mg/dL ↑ [High]"));
        assert!(line.contains("TIR 33%"));
    }

    #[test]
    fn test_dashboard_empty_store() {
        let now = at("2025-03-15T08:12:00+00:00");
        let dash = Dashboard::build(&ReadingStore::default(), TargetRange::default(), TimeRange::Month, None, now);
        assert!(dash.current.is_none());
        assert!(dash.recent.is_empty());
        assert_eq!(dash.period, AggregateStatistics::empty());
        assert!(dash.status_line().starts_with("-- mg/dL [No Data]"));
        assert!(dash.status_line().ends_with("updated Never"));
    }
}
