use crate::error::{AnalyticsError, Result};
use crate::generator::{DEFAULT_SEED, MAX_STUDENTS};
use crate::model::DEFAULT_TEST_FRACTION;
use crate::risk::GRADE_CUTOFF;
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Pipeline settings. Every field has a default, so a config file only
/// needs the keys it wants to change.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub seed: u64,
    pub n_students: usize,
    pub data_file: PathBuf,
    pub output_dir: PathBuf,
    pub risk_threshold: f64,
    pub top_n: usize,
    pub test_fraction: f64,
    pub bind_address: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            seed: DEFAULT_SEED,
            n_students: 100,
            data_file: PathBuf::from("data/processed/student_data.csv"),
            output_dir: PathBuf::from("reports"),
            risk_threshold: GRADE_CUTOFF,
            top_n: 10,
            test_fraction: DEFAULT_TEST_FRACTION,
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading config from {}", path.display());
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    /// File settings when a path is given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_students == 0 || self.n_students > MAX_STUDENTS {
            return Err(AnalyticsError::invalid(format!(
                "n_students must be between 1 and {}, got {}",
                MAX_STUDENTS, self.n_students
            )));
        }
        if !self.risk_threshold.is_finite() || self.risk_threshold < 0.0 {
            return Err(AnalyticsError::invalid(format!(
                "risk_threshold must be non-negative, got {}",
                self.risk_threshold
            )));
        }
        if self.top_n == 0 {
            return Err(AnalyticsError::invalid("top_n must be at least 1"));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(AnalyticsError::invalid(format!(
                "test_fraction must lie in (0, 1), got {}",
                self.test_fraction
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_toml_str("seed = 7\nn_students = 250\n").unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.n_students, 250);
        assert_eq!(config.top_n, 10);
        assert_eq!(config.risk_threshold, 60.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(AppConfig::from_toml_str("n_students = 0").is_err());
        assert!(AppConfig::from_toml_str("risk_threshold = -1.0").is_err());
        assert!(AppConfig::from_toml_str("test_fraction = 1.0").is_err());
        assert!(matches!(
            AppConfig::from_toml_str("seed = \"abc\""),
            Err(AnalyticsError::Toml(_))
        ));
    }

    #[test]
    fn test_default_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
        assert_eq!(AppConfig::load_or_default(None).unwrap(), AppConfig::default());
    }
}
