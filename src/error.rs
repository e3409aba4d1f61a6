//! Error types for the glucose dashboard

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GlucoseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid target range: {low}-{high} mg/dL")]
    InvalidTargetRange { low: u16, high: u16 },

    #[error("Invalid refresh interval: {0} minutes")]
    InvalidRefreshInterval(u32),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Operation cancelled")]
    Cancelled,
}
