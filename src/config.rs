// Analysis defaults: representative statistic, outlier filter, interval width
//
// Loaded from TOML; every field is optional and command-line flags override
// whatever the file sets.

use crate::error::{AnalysisError, Result};
use crate::reduce::{OutlierFilter, ReprKind, ReprStat, PERCENT_PRECISION};
use crate::stats::Z_95;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration shared by every analysis command
///
/// # Example
/// ```
/// use pagestat::config::AnalysisConfig;
///
/// let config = AnalysisConfig::from_toml_str("filter_outliers = true").unwrap();
/// assert!(config.filter_outliers);
/// assert_eq!(config.outlier_min_samples, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Median or mean
    pub reprstat: ReprKind,

    /// Drop values outside `iqr_multiplier × IQR` before reducing
    pub filter_outliers: bool,

    /// Sequences this short are never filtered
    ///
    /// Default: 10
    pub outlier_min_samples: usize,

    /// Default: 1.5
    pub iqr_multiplier: f64,

    /// Critical value for confidence intervals
    ///
    /// Default: 1.96 (95%)
    pub confidence_z: f64,

    /// Decimal places kept by percent deltas
    pub percent_precision: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            reprstat: ReprKind::Median,
            filter_outliers: false,
            outlier_min_samples: 10,
            iqr_multiplier: 1.5,
            confidence_z: Z_95,
            percent_precision: PERCENT_PRECISION,
        }
    }
}

impl AnalysisConfig {
    /// Median with outlier filtering on
    pub fn robust() -> Self {
        Self {
            filter_outliers: true,
            ..Self::default()
        }
    }

    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: AnalysisConfig = toml::from_str(toml)?;
        config.validate().map_err(AnalysisError::InvalidConfig)?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading analysis config");
        Self::from_toml_str(&contents)
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier < 0.0 {
            return Err(format!(
                "iqr_multiplier must be a non-negative number, got {}",
                self.iqr_multiplier
            ));
        }

        if !self.confidence_z.is_finite() || self.confidence_z <= 0.0 {
            return Err(format!(
                "confidence_z must be positive, got {}",
                self.confidence_z
            ));
        }

        if self.outlier_min_samples < 4 {
            return Err(format!(
                "outlier_min_samples must be >= 4 for quartiles, got {}",
                self.outlier_min_samples
            ));
        }

        if self.percent_precision > 15 {
            return Err(format!(
                "percent_precision must be <= 15, got {}",
                self.percent_precision
            ));
        }

        Ok(())
    }

    pub fn outlier_filter(&self) -> OutlierFilter {
        OutlierFilter {
            enabled: self.filter_outliers,
            min_samples: self.outlier_min_samples,
            iqr_multiplier: self.iqr_multiplier,
        }
    }

    pub fn repr_stat(&self) -> ReprStat {
        ReprStat::new(self.reprstat, self.outlier_filter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.reprstat, ReprKind::Median);
        assert!(!config.filter_outliers);
        assert_eq!(config.outlier_min_samples, 10);
        assert_eq!(config.iqr_multiplier, 1.5);
        assert_eq!(config.confidence_z, 1.96);
        assert_eq!(config.percent_precision, 3);
        assert!(config.validate().is_ok());
        assert_eq!(config.repr_stat(), ReprStat::median());
    }

    #[test]
    fn test_robust_config() {
        let config = AnalysisConfig::robust();
        assert!(config.filter_outliers);
        assert_eq!(config.outlier_filter(), OutlierFilter::basic());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = AnalysisConfig::from_toml_str(
            r#"
            reprstat = "mean"
            confidence_z = 2.576
            "#,
        )
        .unwrap();
        assert_eq!(config.reprstat, ReprKind::Mean);
        assert_eq!(config.confidence_z, 2.576);
        assert_eq!(config.iqr_multiplier, 1.5);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = AnalysisConfig::from_toml_str("threshold = 3").unwrap_err();
        assert!(matches!(err, AnalysisError::Toml(_)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = AnalysisConfig::from_toml_str("confidence_z = -1.0").unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));

        let config = AnalysisConfig {
            iqr_multiplier: f64::NAN,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AnalysisConfig {
            outlier_min_samples: 2,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagestat.toml");
        std::fs::write(&path, "filter_outliers = true\nreprstat = \"median\"\n").unwrap();
        let config = AnalysisConfig::from_file(&path).unwrap();
        assert_eq!(config, AnalysisConfig::robust());

        let missing = AnalysisConfig::from_file(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(AnalysisError::Io(_))));
    }
}
