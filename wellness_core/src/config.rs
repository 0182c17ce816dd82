//! Configuration file support for the wellness tools.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/wellness/config.toml`.

use crate::{Error, MedicationConfig, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub trend: TrendConfig,

    #[serde(default)]
    pub prediction: PredictionConfig,

    #[serde(default)]
    pub medication: MedicationConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_user")]
    pub user: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            user: default_user(),
        }
    }
}

/// Daily score weights and the display threshold for "done"
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScoringConfig {
    #[serde(default = "default_component_weight")]
    pub workout_weight: f64,

    #[serde(default = "default_component_weight")]
    pub nutrition_weight: f64,

    #[serde(default = "default_component_weight")]
    pub water_weight: f64,

    #[serde(default = "default_component_weight")]
    pub sleep_weight: f64,

    #[serde(default = "default_done_threshold")]
    pub done_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            workout_weight: default_component_weight(),
            nutrition_weight: default_component_weight(),
            water_weight: default_component_weight(),
            sleep_weight: default_component_weight(),
            done_threshold: default_done_threshold(),
        }
    }
}

impl ScoringConfig {
    pub fn total_weight(&self) -> f64 {
        self.workout_weight + self.nutrition_weight + self.water_weight + self.sleep_weight
    }
}

/// Linear trend projection parameters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TrendConfig {
    /// Slopes smaller than this (units/day) count as flat
    #[serde(default = "default_min_daily_rate")]
    pub min_daily_rate: f64,

    /// Below this many samples confidence is capped
    #[serde(default = "default_min_confident_samples")]
    pub min_confident_samples: usize,

    #[serde(default = "default_high_r_squared")]
    pub high_r_squared: f64,

    #[serde(default = "default_medium_r_squared")]
    pub medium_r_squared: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            min_daily_rate: default_min_daily_rate(),
            min_confident_samples: default_min_confident_samples(),
            high_r_squared: default_high_r_squared(),
            medium_r_squared: default_medium_r_squared(),
        }
    }
}

/// Personal record prediction parameters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PredictionConfig {
    /// Minimum distinct session dates before an exercise gets a prediction
    #[serde(default = "default_min_sessions")]
    pub min_sessions: usize,

    /// Smallest one-rep-max gain that counts as a new record
    #[serde(default = "default_min_increment_kg")]
    pub min_increment_kg: f64,

    /// Predicted weights are rounded to this plate step
    #[serde(default = "default_weight_step_kg")]
    pub weight_step_kg: f64,

    #[serde(default)]
    pub trend: TrendConfig,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            min_sessions: default_min_sessions(),
            min_increment_kg: default_min_increment_kg(),
            weight_step_kg: default_weight_step_kg(),
            trend: TrendConfig::default(),
        }
    }
}

impl Default for MedicationConfig {
    fn default() -> Self {
        Self {
            dose_time: default_dose_time(),
            fasting_before_minutes: default_fasting_before_minutes(),
            restriction_after_minutes: default_restriction_after_minutes(),
        }
    }
}

/// Longest allowed fasting plus restriction span, in minutes
pub const MAX_WINDOW_MINUTES: i64 = 24 * 60;

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|_| PathBuf::from("."))
    });
    base.join("wellness")
}

fn default_user() -> String {
    "default".into()
}

fn default_component_weight() -> f64 {
    25.0
}

fn default_done_threshold() -> f64 {
    0.8
}

fn default_min_daily_rate() -> f64 {
    1e-4
}

fn default_min_confident_samples() -> usize {
    5
}

fn default_high_r_squared() -> f64 {
    0.8
}

fn default_medium_r_squared() -> f64 {
    0.5
}

fn default_min_sessions() -> usize {
    2
}

fn default_min_increment_kg() -> f64 {
    2.5
}

fn default_weight_step_kg() -> f64 {
    0.5
}

pub(crate) fn default_dose_time() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN)
}

pub(crate) fn default_fasting_before_minutes() -> i64 {
    240
}

pub(crate) fn default_restriction_after_minutes() -> i64 {
    120
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|_| PathBuf::from("."))
        });
        base.join("wellness").join("config.toml")
    }

    /// Reject values the calculators treat as caller precondition violations
    pub fn validate(&self) -> Result<()> {
        let scoring = &self.scoring;
        let weights = [
            scoring.workout_weight,
            scoring.nutrition_weight,
            scoring.water_weight,
            scoring.sleep_weight,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::Config(
                "scoring weights must be finite and non-negative".into(),
            ));
        }
        if scoring.total_weight() <= 0.0 {
            return Err(Error::Config("scoring weights must not all be zero".into()));
        }
        if !(0.0..=1.0).contains(&scoring.done_threshold) {
            return Err(Error::Config(format!(
                "done_threshold must be within 0..=1, got {}",
                scoring.done_threshold
            )));
        }
        let medication = &self.medication;
        if medication.fasting_before_minutes < 0 || medication.restriction_after_minutes < 0 {
            return Err(Error::Config(
                "medication window durations must not be negative".into(),
            ));
        }
        if medication
            .fasting_before_minutes
            .saturating_add(medication.restriction_after_minutes)
            > MAX_WINDOW_MINUTES
        {
            return Err(Error::Config(format!(
                "medication windows must fit in {} minutes, got {} + {}",
                MAX_WINDOW_MINUTES,
                medication.fasting_before_minutes,
                medication.restriction_after_minutes
            )));
        }

        let prediction = &self.prediction;
        if prediction.min_sessions < 2 {
            return Err(Error::Config(
                "prediction.min_sessions must be at least 2".into(),
            ));
        }
        if !(prediction.weight_step_kg.is_finite() && prediction.weight_step_kg > 0.0) {
            return Err(Error::Config(
                "prediction.weight_step_kg must be positive".into(),
            ));
        }
        if !(prediction.min_increment_kg.is_finite() && prediction.min_increment_kg >= 0.0) {
            return Err(Error::Config(
                "prediction.min_increment_kg must be finite and non-negative".into(),
            ));
        }

        validate_trend("trend", &self.trend)?;
        validate_trend("prediction.trend", &prediction.trend)?;
        Ok(())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

fn validate_trend(section: &str, trend: &TrendConfig) -> Result<()> {
    if !(trend.min_daily_rate.is_finite() && trend.min_daily_rate >= 0.0) {
        return Err(Error::Config(format!(
            "{}.min_daily_rate must be finite and non-negative",
            section
        )));
    }
    for (name, value) in [
        ("high_r_squared", trend.high_r_squared),
        ("medium_r_squared", trend.medium_r_squared),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(Error::Config(format!(
                "{}.{} must be within 0..=1, got {}",
                section, name, value
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scoring.total_weight(), 100.0);
        assert_eq!(config.scoring.done_threshold, 0.8);
        assert_eq!(config.prediction.min_sessions, 2);
        assert_eq!(config.medication.fasting_before_minutes, 240);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.scoring.workout_weight = 40.0;
        config.medication.dose_time = NaiveTime::from_hms_opt(6, 30, 0).unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.scoring.workout_weight, 40.0);
        assert_eq!(loaded.medication.dose_time, config.medication.dose_time);
        assert_eq!(loaded.trend, config.trend);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[scoring]
workout_weight = 40.0

[medication]
dose_time = "07:15:00"
fasting_before_minutes = 120
restriction_after_minutes = 240
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.scoring.workout_weight, 40.0);
        assert_eq!(config.scoring.sleep_weight, 25.0); // default
        assert_eq!(
            config.medication.dose_time,
            NaiveTime::from_hms_opt(7, 15, 0).unwrap()
        );
        assert_eq!(config.prediction.weight_step_kg, 0.5); // default
    }

    #[test]
    fn test_validate_rejects_negative_durations() {
        let mut config = Config::default();
        config.medication.restriction_after_minutes = -5;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_windows_longer_than_a_day() {
        let mut config = Config::default();
        config.medication.fasting_before_minutes = 1_000_000_000_000;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.medication.fasting_before_minutes = 1000;
        config.medication.restriction_after_minutes = 441;
        assert!(config.validate().is_err());

        config.medication.restriction_after_minutes = 440;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_medication_section_uses_defaults() {
        let config: Config = toml::from_str("[medication]\ndose_time = \"21:00:00\"\n").unwrap();
        assert_eq!(
            config.medication.dose_time,
            NaiveTime::from_hms_opt(21, 0, 0).unwrap()
        );
        assert_eq!(config.medication.fasting_before_minutes, 240);
        assert_eq!(config.medication.restriction_after_minutes, 120);
    }

    #[test]
    fn test_validate_rejects_non_finite_prediction_settings() {
        let mut config = Config::default();
        config.prediction.weight_step_kg = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.prediction.min_increment_kg = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.prediction.trend.min_daily_rate = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.trend.high_r_squared = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_weights() {
        let mut config = Config::default();
        config.scoring = ScoringConfig {
            workout_weight: 0.0,
            nutrition_weight: 0.0,
            water_weight: 0.0,
            sleep_weight: 0.0,
            done_threshold: 0.8,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_rejects_invalid_threshold() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[scoring]\ndone_threshold = 1.5\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
