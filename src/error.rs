//! Error types for the demo fixture engine
//!
//! Generation itself is total. These errors only come from parsing caller input
//! (reference dates, configuration) and from the preference store.

use thiserror::Error;

/// Errors surfaced by the fixture crate
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Unknown activity: {0}")]
    UnknownActivity(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Preference storage error: {0}")]
    Storage(String),
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> Result<chrono::NaiveDate, FixtureError> {
    chrono::NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| FixtureError::InvalidDate(format!("{value}: {e}")))
}
