//! Fixture generation settings
//!
//! Defaults reproduce the standard demo dataset. A JSON document may override any
//! subset of fields.

use crate::error::FixtureError;
use serde::{Deserialize, Serialize};

/// Number of days generated by default (the reference date plus one year back)
pub const DEFAULT_DAYS: u32 = 365;

/// Longest history a dataset may span
pub const MAX_DAYS: u32 = 36_500;

/// Athlete physiology used to scale synthetic efforts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AthleteProfile {
    /// Functional threshold power (watts)
    pub ftp: u32,
    /// Maximum heart rate (bpm)
    pub max_hr: u32,
    /// Body weight (kg)
    pub weight_kg: f64,
}

impl Default for AthleteProfile {
    fn default() -> Self {
        Self {
            ftp: 250,
            max_hr: 190,
            weight_kg: 72.0,
        }
    }
}

/// Settings for one generated dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    /// Days simulated before the reference date
    pub days: u32,
    pub athlete: AthleteProfile,
    /// Accepted `route.distance / expected_distance` ratio band
    pub route_distance_band: [f64; 2],
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            days: DEFAULT_DAYS,
            athlete: AthleteProfile::default(),
            route_distance_band: [0.5, 2.0],
        }
    }
}

impl FixtureConfig {
    /// Load settings from JSON, filling omitted fields with defaults
    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize settings to JSON
    pub fn to_json(&self) -> Result<String, FixtureError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject settings that would make the generated data meaningless
    pub fn validate(&self) -> Result<(), FixtureError> {
        if self.days > MAX_DAYS {
            return Err(FixtureError::Config(format!(
                "days must be at most {MAX_DAYS}, got {}",
                self.days
            )));
        }
        let [low, high] = self.route_distance_band;
        if !(low > 0.0 && low <= high && high.is_finite()) {
            return Err(FixtureError::Config(format!(
                "route_distance_band must satisfy 0 < low <= high, got [{low}, {high}]"
            )));
        }
        if self.athlete.ftp == 0 || self.athlete.max_hr < 100 {
            return Err(FixtureError::Config(
                "athlete ftp must be positive and max_hr at least 100".to_string(),
            ));
        }
        if !(self.athlete.weight_kg > 0.0) {
            return Err(FixtureError::Config("athlete weight_kg must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = FixtureConfig::from_json(r#"{"days": 30, "athlete": {"ftp": 300}}"#).unwrap();

        assert_eq!(config.days, 30);
        assert_eq!(config.athlete.ftp, 300);
        assert_eq!(config.athlete.max_hr, 190);
        assert_eq!(config.route_distance_band, [0.5, 2.0]);
    }

    #[test]
    fn test_round_trip() {
        let config = FixtureConfig::default();
        let loaded = FixtureConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_invalid_band_rejected() {
        let result = FixtureConfig::from_json(r#"{"route_distance_band": [2.0, 0.5]}"#);
        assert!(matches!(result, Err(FixtureError::Config(_))));
    }

    #[test]
    fn test_oversized_days_rejected() {
        let result = FixtureConfig::from_json(r#"{"days": 4000000000}"#);
        assert!(matches!(result, Err(FixtureError::Config(_))));

        let config = FixtureConfig::from_json(&format!(r#"{{"days": {MAX_DAYS}}}"#)).unwrap();
        assert_eq!(config.days, MAX_DAYS);
    }

    #[test]
    fn test_invalid_json_rejected() {
        let result = FixtureConfig::from_json("not json");
        assert!(matches!(result, Err(FixtureError::JsonError(_))));
    }
}
