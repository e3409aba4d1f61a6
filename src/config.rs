//! Configuration file parsing and data paths

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::GlucoseError;
use crate::units::TargetRange;

/// User settings, loaded from config.txt and passed explicitly to whoever
/// needs them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub target_range: TargetRange,
    /// Minutes between automatic refreshes
    pub refresh_interval_minutes: u32,
    pub notifications_enabled: bool,
    pub health_sync_enabled: bool,
    /// Fixed seed for the synthetic feed, for reproducible runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mock_seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_range: TargetRange::default(),
            refresh_interval_minutes: 5,
            notifications_enabled: true,
            health_sync_enabled: false,
            mock_seed: None,
        }
    }
}

impl Settings {
    /// Load settings from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GlucoseError> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse `key value  # comment` lines on top of the defaults
    pub fn parse(contents: &str) -> Result<Self, GlucoseError> {
        let mut settings = Settings::default();
        let (mut low, mut high) = (settings.target_range.low, settings.target_range.high);

        for line in contents.lines() {
            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, rest)) = Self::parse_line(line) else {
                warn!("Ignoring malformed config line: {}", line);
                continue;
            };
            // Extract value before any comment
            let value = rest.split('#').next().unwrap_or("").trim();

            match key {
                "target_low" => low = parse_value(key, value)?,
                "target_high" => high = parse_value(key, value)?,
                "refresh_interval" => settings.refresh_interval_minutes = parse_value(key, value)?,
                "notifications" => settings.notifications_enabled = parse_flag(key, value)?,
                "health_sync" => settings.health_sync_enabled = parse_flag(key, value)?,
                "mock_seed" => settings.mock_seed = Some(parse_value(key, value)?),
                other => warn!("Unknown config key: {}", other),
            }
        }

        settings.update_target_range(low, high)?;
        settings.update_refresh_interval(settings.refresh_interval_minutes)?;
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    /// Parse a single config line, returning (key, value)
    fn parse_line(line: &str) -> Option<(&str, &str)> {
        // Find first whitespace to separate key from value
        let mut parts = line.splitn(2, |c: char| c.is_whitespace());
        let key = parts.next()?.trim();
        let value = parts.next()?.trim();

        if key.is_empty() || value.is_empty() {
            return None;
        }

        Some((key, value))
    }

    /// Try the data directory, then the working directory, then defaults
    pub fn load_or_default() -> Self {
        Settings::load(config_file_path())
            .or_else(|_| Settings::load("config.txt"))
            .unwrap_or_else(|e| {
                warn!("Could not load config: {}. Using defaults.", e);
                Settings::default()
            })
    }

    /// Write a commented config file holding the defaults
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<(), GlucoseError> {
        let d = Settings::default();
        let contents = format!(
            "# glucoview configuration\n\
             #\n\
             # Target range in mg/dL (inclusive)\n\
             target_low {}\n\
             target_high {}\n\
             \n\
             # Minutes between automatic refreshes\n\
             refresh_interval {}\n\
             \n\
             # 1 = enabled, 0 = disabled\n\
             notifications {}\n\
             health_sync {}\n\
             \n\
             # Uncomment for a reproducible synthetic feed\n\
             # mock_seed 42\n",
            d.target_range.low,
            d.target_range.high,
            d.refresh_interval_minutes,
            d.notifications_enabled as u8,
            d.health_sync_enabled as u8,
        );
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn update_target_range(&mut self, low: u16, high: u16) -> Result<(), GlucoseError> {
        self.target_range = TargetRange::new(low, high)?;
        Ok(())
    }

    pub fn update_refresh_interval(&mut self, minutes: u32) -> Result<(), GlucoseError> {
        if minutes == 0 {
            return Err(GlucoseError::InvalidRefreshInterval(minutes));
        }
        self.refresh_interval_minutes = minutes;
        Ok(())
    }

    #[allow(dead_code)]
    pub fn toggle_notifications(&mut self) {
        self.notifications_enabled = !self.notifications_enabled;
    }

    #[allow(dead_code)]
    pub fn toggle_health_sync(&mut self) {
        self.health_sync_enabled = !self.health_sync_enabled;
    }

    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.refresh_interval_minutes) * 60)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, GlucoseError> {
    value
        .parse()
        .map_err(|_| GlucoseError::Config(format!("invalid value for {}: {}", key, value)))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, GlucoseError> {
    match value {
        "1" | "true" | "on" => Ok(true),
        "0" | "false" | "off" => Ok(false),
        _ => Err(GlucoseError::Config(format!("invalid flag for {}: {}", key, value))),
    }
}

/// OS-specific data directory for the application
pub fn get_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("glucoview")
}

pub fn ensure_data_dir() -> Result<PathBuf, GlucoseError> {
    let dir = get_data_dir();
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn config_file_path() -> PathBuf {
    get_data_dir().join("config.txt")
}
