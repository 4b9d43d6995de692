//! Configuration parameters for key detection

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KeyError;

/// Key estimation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyMethod {
    /// Correlate smoothed chroma against empirical major/minor key profiles
    /// (Krumhansl-Schmuckler style), then median-filter the decisions
    Profile,

    /// Track decaying scale and chord-progression likelihoods and resolve
    /// the relative major/minor ambiguity from harmonic function
    Progression,
}

impl KeyMethod {
    /// Select a method by its numeric host-parameter value (`0` = profile,
    /// `1` = progression)
    ///
    /// # Errors
    ///
    /// Returns `KeyError::InvalidConfiguration` for any other value.
    pub fn from_index(index: i32) -> Result<Self, KeyError> {
        match index {
            0 => Ok(KeyMethod::Profile),
            1 => Ok(KeyMethod::Progression),
            other => Err(KeyError::InvalidConfiguration(format!(
                "unknown key detection method index {}",
                other
            ))),
        }
    }

    /// Short identifier used on command lines and in serialized settings
    pub fn name(&self) -> &'static str {
        match self {
            KeyMethod::Profile => "profile",
            KeyMethod::Progression => "progression",
        }
    }
}

impl fmt::Display for KeyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyMethod {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "profile" | "qm" | "krumhansl" => Ok(KeyMethod::Profile),
            "progression" | "daschuer" => Ok(KeyMethod::Progression),
            other => Err(KeyError::InvalidConfiguration(format!(
                "unknown key detection method \"{}\"",
                other
            ))),
        }
    }
}

/// Detector configuration
///
/// Immutable once a detector has been built from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Estimation strategy (default: Progression)
    pub method: KeyMethod,

    /// Input sample rate in Hz (default: 44100.0)
    ///
    /// Rates too low to survive decimation are clamped, not rejected.
    pub sample_rate: f64,

    /// Frequency of concert A in Hz (default: 440.0)
    pub tuning_frequency: f64,

    /// Smoothing window in seconds (default: 10)
    /// Sizes the profile correlator's chroma average and median filter
    pub smoothing_window_length: u32,
}

impl DetectorConfig {
    /// Configuration for `method` at `sample_rate` with default tuning and
    /// smoothing
    pub fn new(method: KeyMethod, sample_rate: f64) -> Self {
        Self {
            method,
            sample_rate,
            ..Default::default()
        }
    }

    /// Builder-style tuning override
    pub fn with_tuning_frequency(mut self, tuning_frequency: f64) -> Self {
        self.tuning_frequency = tuning_frequency;
        self
    }

    /// Builder-style smoothing window override (seconds)
    pub fn with_smoothing_window_length(mut self, seconds: u32) -> Self {
        self.smoothing_window_length = seconds;
        self
    }

    /// Check values that cannot be sensibly clamped
    ///
    /// # Errors
    ///
    /// Returns `KeyError::InvalidConfiguration` if the tuning frequency is not
    /// a finite positive number.
    pub fn validate(&self) -> Result<(), KeyError> {
        if !self.tuning_frequency.is_finite() || self.tuning_frequency <= 0.0 {
            return Err(KeyError::InvalidConfiguration(format!(
                "tuning frequency must be finite and > 0, got {}",
                self.tuning_frequency
            )));
        }
        Ok(())
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            method: KeyMethod::Progression,
            sample_rate: 44100.0,
            tuning_frequency: 440.0,
            smoothing_window_length: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_from_str() {
        assert_eq!("qm".parse::<KeyMethod>().unwrap(), KeyMethod::Profile);
        assert_eq!("Profile".parse::<KeyMethod>().unwrap(), KeyMethod::Profile);
        assert_eq!("daschuer".parse::<KeyMethod>().unwrap(), KeyMethod::Progression);
        assert_eq!(" progression ".parse::<KeyMethod>().unwrap(), KeyMethod::Progression);
        assert!(matches!(
            "chordino".parse::<KeyMethod>(),
            Err(KeyError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_method_from_index() {
        assert_eq!(KeyMethod::from_index(0).unwrap(), KeyMethod::Profile);
        assert_eq!(KeyMethod::from_index(1).unwrap(), KeyMethod::Progression);
        assert!(KeyMethod::from_index(2).is_err());
        assert!(KeyMethod::from_index(-1).is_err());
    }

    #[test]
    fn test_method_name_round_trip() {
        for method in [KeyMethod::Profile, KeyMethod::Progression] {
            assert_eq!(method.to_string().parse::<KeyMethod>().unwrap(), method);
        }
    }

    #[test]
    fn test_defaults() {
        let config = DetectorConfig::new(KeyMethod::Profile, 48000.0);
        assert_eq!(config.method, KeyMethod::Profile);
        assert_eq!(config.sample_rate, 48000.0);
        assert_eq!(config.tuning_frequency, 440.0);
        assert_eq!(config.smoothing_window_length, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_tuning() {
        let config = DetectorConfig::default().with_tuning_frequency(0.0);
        assert!(config.validate().is_err());
        let config = DetectorConfig::default().with_tuning_frequency(f64::NAN);
        assert!(config.validate().is_err());
        let config = DetectorConfig::default().with_tuning_frequency(432.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_degenerate_sample_rate_is_valid() {
        // clamped later by the front end, never rejected
        let config = DetectorConfig::new(KeyMethod::Progression, 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serde_round_trip() {
        let config = DetectorConfig::new(KeyMethod::Profile, 22050.0).with_smoothing_window_length(4);
        let json = serde_json::to_string(&config).unwrap();
        let back: DetectorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
