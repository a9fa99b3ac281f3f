// Runtime configuration and the named constants the pipeline depends on.
//
// Everything that used to be a hidden literal (file locations, tenure
// thresholds, the number of charge buckets, column names) lives here so
// tests can vary it.
use crate::error::{ChurnError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Number of population-balanced `MonthlyCharges` buckets (Low/Medium/High).
pub const CHARGE_BUCKETS: usize = 3;

/// The only contract value that makes a customer Medium or High risk.
pub const MONTH_TO_MONTH: &str = "Month-to-month";

pub const COL_TENURE: &str = "tenure";
pub const COL_MONTHLY_CHARGES: &str = "MonthlyCharges";
pub const COL_TOTAL_CHARGES: &str = "TotalCharges";
pub const COL_CONTRACT: &str = "Contract";
pub const COL_CHURN: &str = "Churn";

pub const COL_TENURE_GROUP: &str = "TenureGroup";
pub const COL_CHARGE_GROUP: &str = "ChargeGroup";
pub const COL_RISK_CATEGORY: &str = "RiskCategory";

pub const DEFAULT_CONFIG_FILE: &str = "churn_report.toml";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub features: FeatureConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    pub raw: PathBuf,
    pub cleaned: PathBuf,
    pub sql_report: PathBuf,
    pub plots_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw: PathBuf::from("data/Telco-Customer-Churn.csv"),
            cleaned: PathBuf::from("data/cleaned_churn_data.csv"),
            sql_report: PathBuf::from("output/sql_insights.md"),
            plots_dir: PathBuf::from("output/plots"),
        }
    }
}

/// Tenure thresholds in months: `<= tenure_new_max` is New,
/// `<= tenure_medium_max` is Medium, anything above is Long.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FeatureConfig {
    pub tenure_new_max: i64,
    pub tenure_medium_max: i64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            tenure_new_max: 12,
            tenure_medium_max: 36,
        }
    }
}

impl FeatureConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tenure_new_max >= self.tenure_medium_max {
            return Err(ChurnError::Config(format!(
                "tenure_new_max ({}) must be below tenure_medium_max ({})",
                self.tenure_new_max, self.tenure_medium_max
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from `path`. An absent file yields the defaults;
    /// a file that exists but cannot be read or parsed is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            ChurnError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.features.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = Config::default();
        assert_eq!(c.features.tenure_new_max, 12);
        assert_eq!(c.features.tenure_medium_max, 36);
        assert_eq!(c.paths.cleaned, PathBuf::from("data/cleaned_churn_data.csv"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let c = Config::from_toml("[features]\ntenure_new_max = 6\n").unwrap();
        assert_eq!(c.features.tenure_new_max, 6);
        assert_eq!(c.features.tenure_medium_max, 36);
        assert_eq!(c.paths, PathsConfig::default());
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let err = Config::from_toml("[features]\ntenure_new_max = 40\n").unwrap_err();
        assert!(matches!(err, ChurnError::Config(_)));
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let err = Config::from_toml("[paths\nraw = 1").unwrap_err();
        assert!(matches!(err, ChurnError::Toml(_)));
    }

    #[test]
    fn test_missing_file_is_default() {
        let c = Config::load(Path::new("definitely/not/here.toml")).unwrap();
        assert_eq!(c, Config::default());
    }
}
