//! Glucose units, target range and status classification
//!
//! All values are mg/dL. The target range is explicit configuration that is
//! threaded into every calculation that needs it; the severe thresholds
//! (54 and 250 mg/dL) are clinical constants and never configurable.

use serde::{Deserialize, Serialize};

use crate::error::GlucoseError;

/// Glucose value in mg/dL (milligrams per deciliter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MgDl(pub u16);

impl MgDl {
    /// Format the value with unit suffix
    pub fn format(self) -> String {
        format!("{} {}", self.0, Self::unit_label())
    }

    /// Get the unit label
    pub fn unit_label() -> &'static str {
        "mg/dL"
    }
}

impl From<u16> for MgDl {
    fn from(value: u16) -> Self {
        MgDl(value)
    }
}

/// Clinical target range, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRange {
    /// Low bound in mg/dL - default 70
    pub low: u16,
    /// High bound in mg/dL - default 180
    pub high: u16,
}

impl Default for TargetRange {
    fn default() -> Self {
        Self { low: 70, high: 180 }
    }
}

impl TargetRange {
    /// Clinical constant: severe hypoglycemia threshold
    pub const CRITICAL_LOW: u16 = 54;

    /// Clinical constant: severe hyperglycemia threshold
    pub const CRITICAL_HIGH: u16 = 250;

    /// Build a validated range. Both bounds must be non-zero and `low < high`.
    pub fn new(low: u16, high: u16) -> Result<Self, GlucoseError> {
        if low == 0 || low >= high {
            return Err(GlucoseError::InvalidTargetRange { low, high });
        }
        Ok(Self { low, high })
    }

    pub fn contains(&self, value: u16) -> bool {
        value >= self.low && value <= self.high
    }

    pub fn is_below(&self, value: u16) -> bool {
        value < self.low
    }

    pub fn is_above(&self, value: u16) -> bool {
        value > self.high
    }

    /// Classify a value into a severity tier.
    ///
    /// The order of checks matters: each branch assumes the previous ones failed.
    pub fn classify(&self, value: Option<u16>) -> GlucoseStatus {
        let Some(v) = value else {
            return GlucoseStatus::Unknown;
        };

        if v < Self::CRITICAL_LOW {
            GlucoseStatus::CriticalLow
        } else if v < self.low {
            GlucoseStatus::Low
        } else if v <= self.high {
            GlucoseStatus::InRange
        } else if v <= Self::CRITICAL_HIGH {
            GlucoseStatus::High
        } else {
            GlucoseStatus::CriticalHigh
        }
    }

    /// Range display string, e.g. "70-180 mg/dL"
    pub fn format_range(&self) -> String {
        format!("{}-{} {}", self.low, self.high, MgDl::unit_label())
    }
}

/// Severity tier of a single glucose value, used for color-coding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GlucoseStatus {
    Unknown,
    CriticalLow,  // < 54 mg/dL - severe hypoglycemia
    Low,          // 54 to target low
    InRange,      // target low to target high, inclusive
    High,         // target high to 250
    CriticalHigh, // > 250 mg/dL
}

/// Classify with the default 70-180 target range
#[allow(dead_code)]
pub fn glucose_status(value: Option<u16>) -> GlucoseStatus {
    TargetRange::default().classify(value)
}

impl GlucoseStatus {
    pub fn label(self) -> &'static str {
        match self {
            GlucoseStatus::Unknown => "No Data",
            GlucoseStatus::CriticalLow => "Very Low",
            GlucoseStatus::Low => "Low",
            GlucoseStatus::InRange => "In Range",
            GlucoseStatus::High => "High",
            GlucoseStatus::CriticalHigh => "Very High",
        }
    }

    /// Dashboard color as a hex string
    pub fn color(self) -> &'static str {
        match self {
            GlucoseStatus::Unknown => "#8E8E93",
            GlucoseStatus::CriticalLow | GlucoseStatus::CriticalHigh => "#FF3B30",
            GlucoseStatus::Low | GlucoseStatus::High => "#FF9500",
            GlucoseStatus::InRange => "#34C759",
        }
    }
}
