//! Glucose dashboard
//!
//! Follows a continuous glucose monitor feed and reports time-in-range,
//! estimated A1C, variability and the hourly profile.
//!
//! Usage:
//!   glucoview                          - Follow the live feed (Ctrl-C to stop)
//!   glucoview stats month              - Aggregate statistics as JSON
//!   glucoview day 2025-03-01           - One day's statistics as JSON
//!   glucoview --help                   - Show help
//!   GLUCOVIEW_DBG=1 glucoview          - Enable debug output

mod archive;
mod config;
mod error;
mod mock;
mod poller;
mod reading;
mod source;
mod stats;
mod summary;
mod units;

use std::env;

use chrono::{Local, NaiveDate};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::archive::ReadingStore;
use crate::config::{config_file_path, ensure_data_dir, get_data_dir, Settings};
use crate::error::GlucoseError;
use crate::poller::{PollEvent, Poller};
use crate::source::{FileSource, MockSource, ReadingSource};
use crate::stats::{AggregateStatistics, DailyStatistics, TimeRange};
use crate::summary::Dashboard;

#[tokio::main]
async fn main() -> Result<(), GlucoseError> {
    let args: Vec<String> = env::args().collect();

    // Check for debug mode
    if env::var("GLUCOVIEW_DBG").is_ok() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp(None)
            .init();
    }

    // Create default config if it doesn't exist
    match ensure_data_dir() {
        Ok(_) => {
            let cfg_path = config_file_path();
            if !cfg_path.exists() {
                if let Err(e) = Settings::create_default(&cfg_path) {
                    warn!("Could not create default config: {}", e);
                }
            }
        }
        Err(e) => warn!("Could not create data directory: {}", e),
    }

    let settings = Settings::load_or_default();
    let positional: Vec<&str> = positional_args(&args);
    let input = flag_value(&args, "--input");

    match positional.first().copied() {
        None | Some("watch") => {
            let time_range = positional.get(1).map_or(TimeRange::default(), |s| parse_range(s));
            cmd_watch(settings, time_range).await?;
        }
        Some("stats") => {
            let time_range = positional.get(1).map_or(TimeRange::default(), |s| parse_range(s));
            cmd_stats(&settings, time_range, input)?;
        }
        Some("day") => {
            let date = match positional.get(1) {
                Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map_err(|e| GlucoseError::InvalidDate(format!("{}: {}", s, e)))?,
                None => Local::now().date_naive(),
            };
            cmd_day(&settings, date, input)?;
        }
        Some("config") => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Some("path") | Some("paths") => {
            println!("Data directory:  {}", get_data_dir().display());
            println!("Config file:     {}", config_file_path().display());
        }
        Some("--version") | Some("-V") => {
            println!("glucoview {}", env!("CARGO_PKG_VERSION"));
        }
        Some("--help") | Some("-h") | Some("help") => print_help(),
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            print_help();
        }
    }

    Ok(())
}

/// Follow the feed and print a status line after every update.
/// Pressing Enter asks for an immediate refresh.
async fn cmd_watch(settings: Settings, time_range: TimeRange) -> Result<(), GlucoseError> {
    let range = settings.target_range;
    eprintln!("Target range {}, {} statistics", range.format_range(), time_range);

    let source = MockSource::new(settings.mock_seed);
    let mut handle = Poller::new(source, settings).spawn();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\nStopping...");
                break;
            }
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(_)) => handle.request_refresh()?,
                Ok(None) | Err(_) => stdin_open = false,
            },
            event = handle.next_event() => match event {
                Some(PollEvent::Connecting) => eprintln!("Connecting..."),
                Some(PollEvent::Connected { readings }) | Some(PollEvent::Refreshed { readings }) => {
                    info!("Snapshot with {} readings today", readings);
                    let state = handle.state();
                    let now = Local::now().fixed_offset();
                    let dashboard = Dashboard::build(&state.store, range, time_range, state.last_updated, now);
                    println!("{}", dashboard.status_line());
                }
                Some(PollEvent::Failed(e)) => eprintln!("Connection failed: {}", e),
                None => break,
            },
        }
    }

    handle.shutdown().await
}

/// Print AggregateStatistics for the selected window as JSON
fn cmd_stats(settings: &Settings, time_range: TimeRange, input: Option<&str>) -> Result<(), GlucoseError> {
    let store = load_store(settings, input)?;
    let stats = AggregateStatistics::compute(&store.history, time_range, settings.target_range);
    info!("Computed {} statistics over {} archived days", time_range, store.history.len());
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

/// Print DailyStatistics for one archived date as JSON
fn cmd_day(settings: &Settings, date: NaiveDate, input: Option<&str>) -> Result<(), GlucoseError> {
    let store = load_store(settings, input)?;
    let readings = store.day(date);
    if readings.is_empty() {
        warn!("No readings archived for {}", date);
    }
    let stats = DailyStatistics::from_readings(readings, settings.target_range);
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

/// Read a JSON export, or generate a synthetic snapshot when none is given
fn load_store(settings: &Settings, input: Option<&str>) -> Result<ReadingStore, GlucoseError> {
    let now = Local::now().fixed_offset();
    match input {
        Some(path) => FileSource::new(path).fetch(now),
        None => MockSource::new(settings.mock_seed).fetch(now),
    }
}

fn parse_range(s: &str) -> TimeRange {
    s.parse().unwrap_or_else(|e| {
        warn!("{}, using a week", e);
        TimeRange::parse_or_default(s)
    })
}

/// Value following `flag`, e.g. `--input data.json`
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Arguments after the program name that are neither flags nor flag values
fn positional_args(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--input" {
            iter.next();
        } else {
            out.push(arg.as_str());
        }
    }
    out
}

fn print_help() {
    eprintln!("glucoview v{}", env!("CARGO_PKG_VERSION"));
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  glucoview [watch] [RANGE]             Follow the live feed");
    eprintln!("  glucoview stats [RANGE] [--input F]   Aggregate statistics (JSON)");
    eprintln!("  glucoview day [DATE] [--input F]      Daily statistics (JSON)");
    eprintln!("  glucoview config                      Show effective settings");
    eprintln!("  glucoview path                        Show data file locations");
    eprintln!("  glucoview help                        Show this help");
    eprintln!();
    eprintln!("RANGE is week (default), month or 3months. DATE is YYYY-MM-DD.");
    eprintln!("F is a JSON export with \"today\" and \"history\" fields.");
    eprintln!();
    eprintln!("ENVIRONMENT:");
    eprintln!("  GLUCOVIEW_DBG=1                       Enable debug output");
    eprintln!();
    eprintln!("CONFIG:    {}", config_file_path().display());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positional_skips_input_flag() {
        let a = args(&["glucoview", "stats", "--input", "x.json", "month"]);
        assert_eq!(positional_args(&a), vec!["stats", "month"]);
        assert_eq!(flag_value(&a, "--input"), Some("x.json"));
        assert_eq!(flag_value(&args(&["glucoview"]), "--input"), None);
    }

    #[test]
    fn test_parse_range_falls_back_to_week() {
        assert_eq!(parse_range("3months"), TimeRange::ThreeMonths);
        assert_eq!(parse_range("fortnight"), TimeRange::Week);
    }
}
