//! Reading sources feeding the store
//!
//! A source hands back a complete `ReadingStore` on every fetch; the store is
//! replaced wholesale, never patched.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use log::info;

use crate::archive::ReadingStore;
use crate::error::GlucoseError;
use crate::mock::MockGenerator;

pub trait ReadingSource: Send {
    /// Short name for log lines
    fn name(&self) -> &str;

    /// Produce a fresh snapshot as of `now`
    fn fetch(&mut self, now: DateTime<FixedOffset>) -> Result<ReadingStore, GlucoseError>;
}

/// Stand-in for a CGM cloud feed
pub struct MockSource {
    generator: MockGenerator,
}

impl MockSource {
    pub fn new(seed: Option<u64>) -> Self {
        Self { generator: MockGenerator::new(seed) }
    }
}

impl ReadingSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    fn fetch(&mut self, now: DateTime<FixedOffset>) -> Result<ReadingStore, GlucoseError> {
        let store = self.generator.generate(now);
        info!(
            "Generated {} readings today, {} days of history",
            store.today.len(),
            store.history.len()
        );
        Ok(store)
    }
}

/// Reads a JSON export of a `ReadingStore`.
///
/// Hours and dates come from each timestamp's own offset, so an export in
/// UTC (`...Z`) produces an hourly profile and day keys in UTC, not in the
/// host's local time. Every reading must be filed under its own local date.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn load(&self) -> Result<ReadingStore, GlucoseError> {
        let contents = fs::read_to_string(&self.path)?;
        let store: ReadingStore = serde_json::from_str(&contents)?;
        info!(
            "Loaded {} archived readings from {}",
            store.history.reading_count(),
            self.path.display()
        );
        Ok(store)
    }
}

impl ReadingSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    fn fetch(&mut self, _now: DateTime<FixedOffset>) -> Result<ReadingStore, GlucoseError> {
        self.load()
    }
}
