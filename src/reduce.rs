//! Reductions from per-run values to single representative numbers
//!
//! - [`OutlierFilter`]: drops values outside `1.5 × IQR` of the quartiles
//! - [`ReprStat`]: median or mean of a (filtered) aggregate value
//! - [`Delta`]: none/absolute/percent comparison of two variations
//!
//! These are plain values handed to visitor constructors. Nothing here reads
//! global state.

use crate::dataset::{CacheState, Dataset, MetricValue};
use crate::error::{AnalysisError, Result};
use crate::stats;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Interquartile-range outlier filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierFilter {
    pub enabled: bool,
    /// Sequences of this length or shorter pass through unfiltered
    pub min_samples: usize,
    pub iqr_multiplier: f64,
}

impl Default for OutlierFilter {
    fn default() -> Self {
        Self::disabled()
    }
}

impl OutlierFilter {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            min_samples: 10,
            iqr_multiplier: 1.5,
        }
    }

    /// Filter enabled with the standard thresholds
    pub fn basic() -> Self {
        Self {
            enabled: true,
            ..Self::disabled()
        }
    }

    /// Keep values within `[Q1 - k·IQR, Q3 + k·IQR]`
    ///
    /// # Example
    /// ```
    /// use pagestat::reduce::OutlierFilter;
    ///
    /// let mut values: Vec<f64> = (10..20).map(f64::from).collect();
    /// values.push(100.0);
    /// let kept = OutlierFilter::basic().apply(&values);
    /// assert_eq!(kept.len(), 10);
    /// assert!(!kept.contains(&100.0));
    /// ```
    pub fn apply(&self, values: &[f64]) -> Vec<f64> {
        if !self.enabled || values.len() <= self.min_samples {
            return values.to_vec();
        }

        let [_, q1, q3, _] = stats::quartiles(values);
        let margin = (q3 - q1) * self.iqr_multiplier;
        let (low, high) = (q1 - margin, q3 + margin);
        values
            .iter()
            .copied()
            .filter(|v| *v >= low && *v <= high)
            .collect()
    }

    /// Filter a metric value; scalars and non-numeric sequences pass through
    pub fn apply_value(&self, value: &MetricValue) -> MetricValue {
        if !self.enabled || !value.is_aggregate() || !value.is_numeric() {
            return value.clone();
        }
        match value.numbers() {
            Some(numbers) => MetricValue::from(self.apply(&numbers)),
            None => value.clone(),
        }
    }
}

/// Which central tendency represents an aggregate value
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReprKind {
    #[default]
    Median,
    Mean,
}

impl ReprKind {
    pub const ALL: [ReprKind; 2] = [ReprKind::Median, ReprKind::Mean];

    pub fn name(self) -> &'static str {
        match self {
            ReprKind::Median => "median",
            ReprKind::Mean => "mean",
        }
    }

    pub fn reduce(self, values: &[f64]) -> f64 {
        match self {
            ReprKind::Median => stats::median(values),
            ReprKind::Mean => stats::mean(values),
        }
    }
}

/// Representative statistic: optional outlier filter, then median or mean
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ReprStat {
    pub kind: ReprKind,
    pub filter: OutlierFilter,
}

impl ReprStat {
    pub fn new(kind: ReprKind, filter: OutlierFilter) -> Self {
        Self { kind, filter }
    }

    pub fn median() -> Self {
        Self::new(ReprKind::Median, OutlierFilter::disabled())
    }

    pub fn mean() -> Self {
        Self::new(ReprKind::Mean, OutlierFilter::disabled())
    }

    /// Same statistic without outlier filtering
    pub fn unfiltered(self) -> Self {
        Self::new(self.kind, OutlierFilter::disabled())
    }

    /// Reduce a value to one representative value
    ///
    /// - empty sequence: `0`
    /// - non-numeric sequence: its elements joined with `,`
    /// - numeric sequence: filtered, then median or mean
    /// - scalar: itself
    pub fn reduce(&self, value: &MetricValue) -> Result<MetricValue> {
        match value {
            MetricValue::Runs(runs) if runs.is_empty() => Ok(MetricValue::Number(0.0)),
            MetricValue::Runs(runs) if !value.is_numeric() => {
                let joined: Vec<String> = runs.iter().map(ToString::to_string).collect();
                Ok(MetricValue::Text(joined.join(",")))
            }
            MetricValue::Runs(_) => {
                let numbers = value
                    .numbers()
                    .ok_or_else(|| AnalysisError::non_numeric(format!("runs {}", value)))?;
                Ok(MetricValue::Number(self.kind.reduce(&self.filter.apply(&numbers))))
            }
            scalar => Ok(scalar.clone()),
        }
    }

    /// Reduce a value that must come out as a number
    pub fn reduce_number(&self, value: &MetricValue) -> Result<f64> {
        let reduced = self.reduce(value)?;
        reduced
            .as_number()
            .ok_or_else(|| AnalysisError::non_numeric(format!("{} of {}", self.kind.name(), reduced)))
    }
}

/// How two variations are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaKind {
    /// Value of the main variation alone
    None,
    /// `main - base`
    Absolute,
    /// `(main - base) / mean(main, base) × 100`
    Percent,
}

impl DeltaKind {
    fn name(self) -> &'static str {
        match self {
            DeltaKind::None => "none",
            DeltaKind::Absolute => "absolute",
            DeltaKind::Percent => "percent",
        }
    }
}

/// Decimal places kept by percent deltas
pub const PERCENT_PRECISION: u32 = 3;

/// Delta function over a pair of variations
///
/// The main variation may be left unset, in which case the variation being
/// walked is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub kind: DeltaKind,
    pub main: Option<String>,
    pub base: Option<String>,
    pub repr: ReprStat,
    pub precision: u32,
}

impl Delta {
    /// Representative value of `main` (or the walked variation)
    pub fn value_of(main: Option<&str>, repr: ReprStat) -> Self {
        Self {
            kind: DeltaKind::None,
            main: main.map(str::to_string),
            base: None,
            repr,
            precision: PERCENT_PRECISION,
        }
    }

    pub fn absolute(main: Option<&str>, base: &str, repr: ReprStat) -> Self {
        Self {
            kind: DeltaKind::Absolute,
            base: Some(base.to_string()),
            ..Self::value_of(main, repr)
        }
    }

    pub fn percent(main: Option<&str>, base: &str, repr: ReprStat) -> Self {
        Self {
            kind: DeltaKind::Percent,
            base: Some(base.to_string()),
            ..Self::value_of(main, repr)
        }
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    /// Parse `kind|main|base`, e.g. `percent|rewrite|control` or `|control|`
    ///
    /// An empty kind means [`DeltaKind::None`]; an empty main variation means
    /// "the walked variation".
    pub fn parse(spec: &str, repr: ReprStat) -> Result<Self> {
        let parts: Vec<&str> = spec.split('|').collect();
        let [kind, main, base] = parts.as_slice() else {
            return Err(AnalysisError::InvalidDelta(format!(
                "{}: expected KIND|MAIN|BASE",
                spec
            )));
        };

        let main = (!main.is_empty()).then_some(*main);
        match *kind {
            "" | "none" => Ok(Self::value_of(main, repr)),
            "absolute" | "percent" if base.is_empty() => Err(AnalysisError::InvalidDelta(
                format!("{}: {} delta needs a base variation", spec, kind),
            )),
            "absolute" => Ok(Self::absolute(main, base, repr)),
            "percent" => Ok(Self::percent(main, base, repr)),
            other => Err(AnalysisError::InvalidDelta(format!(
                "{}: unknown delta kind '{}'",
                spec, other
            ))),
        }
    }

    /// Evaluate for one (test, cache state, metric)
    ///
    /// Missing variations or metrics surface as [`AnalysisError::MissingKey`].
    pub fn eval(
        &self,
        data: &Dataset,
        test: &str,
        cached: CacheState,
        metric: &str,
        walked: Option<&str>,
    ) -> Result<f64> {
        let main = self.main.as_deref().or(walked).ok_or_else(|| {
            AnalysisError::InvalidDelta(format!("{} delta has no main variation", self.kind.name()))
        })?;
        let main_value = self.repr.reduce_number(data.metric(test, main, cached, metric)?)?;

        let Some(base) = self.base.as_deref() else {
            return Ok(main_value);
        };
        let base_value = self.repr.reduce_number(data.metric(test, base, cached, metric)?)?;

        match self.kind {
            DeltaKind::None => Ok(main_value),
            DeltaKind::Absolute => Ok(main_value - base_value),
            DeltaKind::Percent => {
                if main_value == 0.0 && base_value == 0.0 {
                    return Ok(0.0);
                }
                let change = (main_value - base_value) / ((main_value + base_value) / 2.0) * 100.0;
                Ok(stats::round_to(change, self.precision))
            }
        }
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let main = self.main.as_deref().unwrap_or("");
        let base = self.base.as_deref().unwrap_or("");
        match self.kind {
            DeltaKind::None => write!(f, "|{}|", main),
            kind => write!(f, "{}|{}|{}", kind.name(), main, base),
        }
    }
}

/// One selectable delta function: its encoded spec and a readable label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaOption {
    pub spec: String,
    pub label: String,
}

/// Every delta function a dataset supports
///
/// One "value of" entry per variation, then absolute and percent entries for
/// every ordered pair of variations.
pub fn delta_function_list(data: &Dataset) -> Vec<DeltaOption> {
    let variations = data.variations();
    let mut options: Vec<DeltaOption> = variations
        .iter()
        .map(|v| DeltaOption {
            spec: format!("|{}|", v),
            label: format!("{} - 0", v),
        })
        .collect();

    for kind in [DeltaKind::Absolute, DeltaKind::Percent] {
        for main in &variations {
            for base in &variations {
                options.push(DeltaOption {
                    spec: format!("{}|{}|{}", kind.name(), main, base),
                    label: format!("({} - {}) {}", main, base, kind.name()),
                });
            }
        }
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs(values: &[f64]) -> MetricValue {
        MetricValue::from(values.to_vec())
    }

    fn two_variations() -> Dataset {
        Dataset::from_json_str(
            r#"{
                "t": {
                    "base": [{"load": [100, 110, 120], "zero": [0, 0]}, {"load": [50]}],
                    "main": [{"load": [90, 100, 110], "zero": [0]}, {"load": [40]}]
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_filter_removes_single_outlier() {
        let mut values: Vec<f64> = vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0, 18.0, 19.0];
        values.push(100.0);
        let kept = OutlierFilter::basic().apply(&values);
        assert_eq!(kept, values[..10].to_vec());
    }

    #[test]
    fn test_filter_short_sequence_is_noop() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 1000.0];
        assert_eq!(OutlierFilter::basic().apply(&values), values);
    }

    #[test]
    fn test_filter_disabled_is_noop() {
        let mut values: Vec<f64> = (0..20).map(f64::from).collect();
        values.push(1e9);
        assert_eq!(OutlierFilter::disabled().apply(&values), values);
    }

    #[test]
    fn test_filter_value_passthrough() {
        let filter = OutlierFilter::basic();
        assert_eq!(filter.apply_value(&MetricValue::Number(3.0)), MetricValue::Number(3.0));
        let text = MetricValue::Runs(vec!["a".into(); 12]);
        assert_eq!(filter.apply_value(&text), text);
    }

    #[test]
    fn test_repr_stat_rules() {
        let median = ReprStat::median();
        assert_eq!(median.reduce(&MetricValue::empty()).unwrap(), MetricValue::Number(0.0));
        assert_eq!(median.reduce(&runs(&[1.0, 2.0, 9.0])).unwrap(), MetricValue::Number(2.0));
        assert_eq!(
            ReprStat::mean().reduce(&runs(&[1.0, 2.0, 9.0])).unwrap(),
            MetricValue::Number(4.0)
        );
        let text = MetricValue::Runs(vec!["gzip".into(), "br".into()]);
        assert_eq!(median.reduce(&text).unwrap(), MetricValue::Text("gzip,br".into()));
        assert_eq!(median.reduce(&"x".into()).unwrap(), MetricValue::Text("x".into()));
        assert_eq!(median.reduce(&7.0.into()).unwrap(), MetricValue::Number(7.0));
    }

    #[test]
    fn test_repr_stat_mixed_runs_fail() {
        let mixed = MetricValue::Runs(vec![1.0.into(), "x".into()]);
        assert!(ReprStat::median().reduce(&mixed).is_err());
    }

    #[test]
    fn test_repr_stat_filters_before_reducing() {
        let mut values: Vec<f64> = vec![10.0; 11];
        values.push(10_000.0);
        let repr = ReprStat::new(ReprKind::Mean, OutlierFilter::basic());
        assert_eq!(repr.reduce_number(&runs(&values)).unwrap(), 10.0);
    }

    #[test]
    fn test_delta_parse() {
        let repr = ReprStat::median();
        let delta = Delta::parse("percent|main|base", repr).unwrap();
        assert_eq!(delta.kind, DeltaKind::Percent);
        assert_eq!(delta.main.as_deref(), Some("main"));
        assert_eq!(delta.base.as_deref(), Some("base"));
        assert_eq!(delta.to_string(), "percent|main|base");

        let none = Delta::parse("|main|", repr).unwrap();
        assert_eq!(none.kind, DeltaKind::None);
        assert_eq!(none.to_string(), "|main|");

        assert!(Delta::parse("percent|main", repr).is_err());
        assert!(Delta::parse("absolute|main|", repr).is_err());
        assert!(Delta::parse("ratio|a|b", repr).is_err());
    }

    #[test]
    fn test_delta_eval_kinds() {
        let data = two_variations();
        let repr = ReprStat::median();
        let fv = CacheState::FirstView;

        let value = Delta::value_of(Some("main"), repr);
        assert_eq!(value.eval(&data, "t", fv, "load", None).unwrap(), 100.0);

        let absolute = Delta::absolute(Some("main"), "base", repr);
        assert_eq!(absolute.eval(&data, "t", fv, "load", None).unwrap(), -10.0);

        let percent = Delta::percent(Some("main"), "base", repr);
        // -10 / 105 * 100
        assert_eq!(percent.eval(&data, "t", fv, "load", None).unwrap(), -9.524);
    }

    #[test]
    fn test_delta_percent_both_zero() {
        let data = two_variations();
        let percent = Delta::percent(Some("main"), "base", ReprStat::median());
        let value = percent
            .eval(&data, "t", CacheState::FirstView, "zero", None)
            .unwrap();
        assert_eq!(value, 0.0);
    }

    #[test]
    fn test_delta_uses_walked_variation() {
        let data = two_variations();
        let delta = Delta::absolute(None, "base", ReprStat::median());
        let value = delta
            .eval(&data, "t", CacheState::RepeatView, "load", Some("main"))
            .unwrap();
        assert_eq!(value, -10.0);
        assert!(delta
            .eval(&data, "t", CacheState::RepeatView, "load", None)
            .is_err());
    }

    #[test]
    fn test_delta_missing_metric_is_missing_key() {
        let data = two_variations();
        let delta = Delta::value_of(Some("main"), ReprStat::median());
        let err = delta
            .eval(&data, "t", CacheState::RepeatView, "zero", None)
            .unwrap_err();
        assert!(err.is_missing_key());
    }

    #[test]
    fn test_delta_function_list() {
        let options = delta_function_list(&two_variations());
        // 2 value-of + 2 kinds * 2 * 2 ordered pairs
        assert_eq!(options.len(), 10);
        assert_eq!(options[0].spec, "|base|");
        assert_eq!(options[0].label, "base - 0");
        assert!(options
            .iter()
            .any(|o| o.spec == "percent|main|base" && o.label == "(main - base) percent"));
    }
}
