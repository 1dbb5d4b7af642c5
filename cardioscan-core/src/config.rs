//! # Scan Configuration Module
//!
//! `ScanConfig` is the single value object handed from the presentation layer
//! to the pipeline before a scan starts. It is immutable for the lifetime of
//! one scan and can be persisted as JSON between sessions.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};

/// Sample rate of the simulated acquisition hardware.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
/// Length of one acquisition in seconds.
pub const DEFAULT_DURATION_SECONDS: f64 = 10.0;
/// Sensor sensitivity preset shown in the sidebar.
pub const DEFAULT_SENSITIVITY: u8 = 75;
/// Chance that a synthesized scan carries the abnormality segment.
pub const DEFAULT_ABNORMALITY_PROBABILITY: f64 = 0.4;
/// Number of reveal windows per scan.
pub const DEFAULT_STEPS: usize = 100;
/// A spectrum is published on every n-th step.
pub const DEFAULT_SPECTRUM_INTERVAL: usize = 5;
/// Welch segment length.
pub const DEFAULT_SEGMENT_LENGTH: usize = 1024;
/// Wall-clock delay between two reveal steps, in milliseconds.
pub const DEFAULT_CADENCE_MS: u64 = 50;

/// Scan durations offered by the sidebar selector, in seconds.
pub const SCAN_DURATION_OPTIONS: [u32; 4] = [5, 10, 15, 30];

/// Parameters of one scan.
///
/// `sensitivity` is validated and recorded but does not influence synthesis.
/// `cadence_ms` is only read by the presentation driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub sample_rate: u32,
    pub duration_seconds: f64,
    pub sensitivity: u8,
    pub abnormality_probability: f64,
    pub steps: usize,
    pub spectrum_interval: usize,
    pub segment_length: usize,
    pub cadence_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            duration_seconds: DEFAULT_DURATION_SECONDS,
            sensitivity: DEFAULT_SENSITIVITY,
            abnormality_probability: DEFAULT_ABNORMALITY_PROBABILITY,
            steps: DEFAULT_STEPS,
            spectrum_interval: DEFAULT_SPECTRUM_INTERVAL,
            segment_length: DEFAULT_SEGMENT_LENGTH,
            cadence_ms: DEFAULT_CADENCE_MS,
        }
    }
}

impl ScanConfig {
    /// Number of samples a scan with this configuration produces.
    pub fn sample_count(&self) -> usize {
        (self.sample_rate as f64 * self.duration_seconds).floor() as usize
    }

    /// Checks every field against its documented domain.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(ScanError::config("sample_rate", "must be positive"));
        }
        if !self.duration_seconds.is_finite() || self.duration_seconds <= 0.0 {
            return Err(ScanError::config(
                "duration_seconds",
                format!("must be a positive number, got {}", self.duration_seconds),
            ));
        }
        if self.sample_count() == 0 {
            return Err(ScanError::config(
                "duration_seconds",
                "is too short to hold a single sample",
            ));
        }
        if !(1..=100).contains(&self.sensitivity) {
            return Err(ScanError::config(
                "sensitivity",
                format!("must be in [1, 100], got {}", self.sensitivity),
            ));
        }
        if !(0.0..=1.0).contains(&self.abnormality_probability) {
            return Err(ScanError::config(
                "abnormality_probability",
                format!("must be in [0, 1], got {}", self.abnormality_probability),
            ));
        }
        if self.steps == 0 {
            return Err(ScanError::config("steps", "must be positive"));
        }
        if self.spectrum_interval == 0 {
            return Err(ScanError::config("spectrum_interval", "must be positive"));
        }
        if self.segment_length == 0 {
            return Err(ScanError::config("segment_length", "must be positive"));
        }
        if self.cadence_ms == 0 {
            return Err(ScanError::config("cadence_ms", "must be at least 1 ms"));
        }
        Ok(())
    }

    /// Saves the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json_string = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json_string.as_bytes())?;
        Ok(())
    }

    /// Loads a configuration from JSON and validates it.
    ///
    /// Fields missing from the file take their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut data = String::new();
        file.read_to_string(&mut data)?;
        let config: ScanConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ScanConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sample_count(), 441_000);
    }

    #[test]
    fn rejects_zero_sample_rate() {
        let config = ScanConfig {
            sample_rate: 0,
            ..ScanConfig::default()
        };
        match config.validate() {
            Err(ScanError::Configuration { field, .. }) => assert_eq!(field, "sample_rate"),
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_positive_duration() {
        for duration in [0.0, -1.0, f64::NAN] {
            let config = ScanConfig {
                duration_seconds: duration,
                ..ScanConfig::default()
            };
            assert!(config.validate().is_err(), "duration {duration} accepted");
        }
    }

    #[test]
    fn rejects_duration_shorter_than_one_sample() {
        let config = ScanConfig {
            sample_rate: 100,
            duration_seconds: 0.001,
            ..ScanConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_sensitivity_and_probability() {
        let low = ScanConfig {
            sensitivity: 0,
            ..ScanConfig::default()
        };
        let high = ScanConfig {
            sensitivity: 101,
            ..ScanConfig::default()
        };
        let prob = ScanConfig {
            abnormality_probability: 1.5,
            ..ScanConfig::default()
        };
        assert!(low.validate().is_err());
        assert!(high.validate().is_err());
        assert!(prob.validate().is_err());
    }

    #[test]
    fn rejects_zero_cadence() {
        let config = ScanConfig {
            cadence_ms: 0,
            ..ScanConfig::default()
        };
        match config.validate() {
            Err(ScanError::Configuration { field, .. }) => assert_eq!(field, "cadence_ms"),
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn missing_json_fields_take_defaults() {
        let config: ScanConfig =
            serde_json::from_str(r#"{ "sample_rate": 8000, "duration_seconds": 2.5 }"#).unwrap();
        assert_eq!(config.sample_rate, 8000);
        assert_eq!(config.steps, DEFAULT_STEPS);
        assert_eq!(config.sample_count(), 20_000);
    }

    #[test]
    fn save_then_load_preserves_fields() {
        let path = std::env::temp_dir().join(format!(
            "cardioscan_settings_{}.json",
            std::process::id()
        ));
        let config = ScanConfig {
            sensitivity: 42,
            abnormality_probability: 0.0,
            ..ScanConfig::default()
        };
        config.save(&path).unwrap();
        let loaded = ScanConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }
}
