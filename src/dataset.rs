//! Benchmark result dataset and read-only accessors
//!
//! A dataset nests four levels deep: test → variation → cache state →
//! metric. Each metric holds either a scalar or a sequence of per-run
//! measurements (an "aggregate" value).
//!
//! ```json
//! {
//!   "http://example.com": {
//!     "control": [ {"loadTime": [1200, 1310, 1250]}, {"loadTime": [640, 655, 610]} ],
//!     "rewrite": [ {"loadTime": [980, 1010, 1004]}, null ]
//!   }
//! }
//! ```

use crate::error::{AnalysisError, KeyKind, Result};
use crate::reduce::ReprStat;
use crate::stats::{self, ConfidenceInterval};
use crate::visitors::representative_pool;
use crate::walker::Walker;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::Read;
use std::path::Path;

/// Page load cache state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheState {
    /// Cold cache
    FirstView = 0,
    /// Warm cache
    RepeatView = 1,
}

impl CacheState {
    pub const BOTH: [CacheState; 2] = [CacheState::FirstView, CacheState::RepeatView];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(CacheState::FirstView),
            1 => Some(CacheState::RepeatView),
            _ => None,
        }
    }
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheState::FirstView => f.write_str("first view"),
            CacheState::RepeatView => f.write_str("repeat view"),
        }
    }
}

/// A single metric observation: scalar or per-run sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
    Runs(Vec<MetricValue>),
}

impl MetricValue {
    /// Empty sequence, substituted for metrics a metric-set does not contain
    pub fn empty() -> Self {
        MetricValue::Runs(Vec::new())
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, MetricValue::Runs(_))
    }

    /// Numbers are numeric; sequences are numeric when their first element is
    ///
    /// Only the first element is inspected. Mixed sequences are not validated.
    pub fn is_numeric(&self) -> bool {
        match self {
            MetricValue::Number(_) => true,
            MetricValue::Text(_) => false,
            MetricValue::Runs(runs) => runs.first().is_some_and(MetricValue::is_numeric),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// All values as numbers, or `None` if any element is not a number
    ///
    /// A scalar number yields a single-element vector.
    pub fn numbers(&self) -> Option<Vec<f64>> {
        match self {
            MetricValue::Number(n) => Some(vec![*n]),
            MetricValue::Text(_) => None,
            MetricValue::Runs(runs) => runs.iter().map(MetricValue::as_number).collect(),
        }
    }

    /// Number of runs: sequence length, or 1 for a scalar
    pub fn run_count(&self) -> usize {
        match self {
            MetricValue::Runs(runs) => runs.len(),
            _ => 1,
        }
    }

    /// `[min, Q1, Q3, max]`; a scalar number is repeated four times
    pub fn quartiles(&self) -> Option<[f64; 4]> {
        match self {
            MetricValue::Number(n) => Some([*n; 4]),
            MetricValue::Text(_) => None,
            MetricValue::Runs(_) => self.numbers().map(|values| stats::quartiles(&values)),
        }
    }

    /// 95% interval of the mean; a scalar number is its own interval
    pub fn conf_interval(&self, z: f64) -> Option<ConfidenceInterval> {
        match self {
            MetricValue::Number(n) => Some(ConfidenceInterval::point(*n)),
            MetricValue::Text(_) => None,
            MetricValue::Runs(_) => self
                .numbers()
                .map(|values| stats::conf_interval_with(&values, z)),
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Number(n) => write!(f, "{}", n),
            MetricValue::Text(s) => f.write_str(s),
            MetricValue::Runs(runs) => {
                f.write_str("[")?;
                for (i, run) in runs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", run)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Number(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        MetricValue::Text(value.to_string())
    }
}

impl From<Vec<f64>> for MetricValue {
    fn from(values: Vec<f64>) -> Self {
        MetricValue::Runs(values.into_iter().map(MetricValue::Number).collect())
    }
}

/// Metric name → value for one (test, variation, cache state)
pub type MetricSet = BTreeMap<String, MetricValue>;

/// The two cache-state slots of one variation
///
/// A slot may be `null` or `{}` in the source data when no metrics were
/// observed for that view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariationRecord(pub [Option<MetricSet>; 2]);

impl VariationRecord {
    pub fn new(first_view: MetricSet, repeat_view: MetricSet) -> Self {
        Self([Some(first_view), Some(repeat_view)])
    }

    /// Metric-set for a view, `None` when absent or empty
    pub fn view(&self, cached: CacheState) -> Option<&MetricSet> {
        self.0[cached.index()].as_ref().filter(|set| !set.is_empty())
    }

    /// Mutable metric-set for a view, created on demand
    pub fn view_mut(&mut self, cached: CacheState) -> &mut MetricSet {
        self.0[cached.index()].get_or_insert_with(MetricSet::new)
    }

    fn metric_sets(&self) -> impl Iterator<Item = &MetricSet> {
        self.0.iter().flatten()
    }
}

/// Variation name → variation record for one test
pub type TestRecord = BTreeMap<String, VariationRecord>;

/// Filter on metric value type, mirroring the numeric mask of the index page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetricKind {
    #[default]
    All,
    Numeric,
}

/// Chart column type of a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Number,
    String,
}

/// Parameters for [`Dataset::metrics`]
#[derive(Debug, Clone, Default)]
pub struct MetricQuery {
    pub kind: MetricKind,
    pub names: Option<Vec<String>>,
}

impl MetricQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn numeric() -> Self {
        Self {
            kind: MetricKind::Numeric,
            names: None,
        }
    }

    pub fn with_names(mut self, names: &[String]) -> Self {
        self.names = Some(names.to_vec());
        self
    }
}

/// Test name → test record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    tests: BTreeMap<String, TestRecord>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn insert(&mut self, test: impl Into<String>, record: TestRecord) {
        self.tests.insert(test.into(), record);
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TestRecord)> {
        self.tests.iter()
    }

    pub fn get(&self, test: &str) -> Option<&TestRecord> {
        self.tests.get(test)
    }

    pub fn test(&self, test: &str) -> Result<&TestRecord> {
        self.tests
            .get(test)
            .ok_or_else(|| AnalysisError::missing(KeyKind::Test, test))
    }

    pub fn variation(&self, test: &str, variation: &str) -> Result<&VariationRecord> {
        self.test(test)?
            .get(variation)
            .ok_or_else(|| AnalysisError::missing(KeyKind::Variation, variation))
    }

    pub fn metric_set(&self, test: &str, variation: &str, cached: CacheState) -> Result<&MetricSet> {
        self.variation(test, variation)?.0[cached.index()]
            .as_ref()
            .ok_or_else(|| AnalysisError::missing(KeyKind::CacheState, cached.to_string()))
    }

    /// Strict lookup of one metric value
    pub fn metric(
        &self,
        test: &str,
        variation: &str,
        cached: CacheState,
        metric: &str,
    ) -> Result<&MetricValue> {
        self.metric_set(test, variation, cached)?
            .get(metric)
            .ok_or_else(|| AnalysisError::missing(KeyKind::Metric, metric))
    }

    /// Union of variation names across all tests, sorted
    pub fn variations(&self) -> Vec<String> {
        let names: BTreeSet<&String> = self.tests.values().flat_map(|t| t.keys()).collect();
        names.into_iter().cloned().collect()
    }

    /// Maximum run count over every metric of every test
    pub fn runs(&self) -> usize {
        self.tests
            .values()
            .map(test_run_count)
            .max()
            .unwrap_or(0)
    }

    /// Tests with at least one metric reaching the dataset run count
    ///
    /// Partially completed tests (fewer runs than the rest) are left out.
    pub fn tests(&self) -> Vec<String> {
        let runs = self.runs();
        self.tests
            .iter()
            .filter(|(_, record)| test_run_count(record) >= runs)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Metrics with their chart column type, sorted by name
    ///
    /// The representative metric-set is the first-view set of each test's
    /// first variation that has the most metrics.
    pub fn metrics(&self, query: &MetricQuery) -> Vec<(ColumnType, String)> {
        let Some(representative) = self.representative_metrics() else {
            return Vec::new();
        };

        representative
            .iter()
            .filter(|(name, _)| {
                query
                    .names
                    .as_ref()
                    .map_or(true, |names| names.iter().any(|n| n == *name))
            })
            .filter(|(_, value)| query.kind == MetricKind::All || value.is_numeric())
            .map(|(name, value)| {
                let column = if value.is_numeric() {
                    ColumnType::Number
                } else {
                    ColumnType::String
                };
                (column, name.clone())
            })
            .collect()
    }

    /// Metric names only, sorted
    pub fn metric_names(&self, query: &MetricQuery) -> Vec<String> {
        self.metrics(query).into_iter().map(|(_, name)| name).collect()
    }

    fn representative_metrics(&self) -> Option<&MetricSet> {
        let mut best: Option<&MetricSet> = None;
        for record in self.tests.values() {
            let Some(variation) = record.values().next() else {
                continue;
            };
            let Some(set) = variation.0[CacheState::FirstView.index()].as_ref() else {
                continue;
            };
            if best.map_or(true, |b| set.len() > b.len()) {
                best = Some(set);
            }
        }
        best
    }
}

fn test_run_count(record: &TestRecord) -> usize {
    record
        .values()
        .flat_map(VariationRecord::metric_sets)
        .flat_map(|set| set.values())
        .map(MetricValue::run_count)
        .max()
        .unwrap_or(0)
}

impl FromIterator<(String, TestRecord)> for Dataset {
    fn from_iter<I: IntoIterator<Item = (String, TestRecord)>>(iter: I) -> Self {
        Self {
            tests: iter.into_iter().collect(),
        }
    }
}

/// Which slice of a dataset an analysis runs over
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DatasetScope {
    /// Every test as recorded
    #[default]
    All,
    /// One synthetic test pooling each test's representative statistic
    Aggregate,
    /// A single named test
    Test(String),
}

impl DatasetScope {
    pub const ALL: &'static str = "__all";
    pub const AGGREGATE: &'static str = "__aggregate";

    /// `__all`, `__aggregate`, or a test name; empty means `__all`
    pub fn parse(scope: &str) -> Self {
        match scope {
            "" | Self::ALL => DatasetScope::All,
            Self::AGGREGATE => DatasetScope::Aggregate,
            test => DatasetScope::Test(test.to_string()),
        }
    }

    /// Build the dataset this scope describes
    pub fn apply(&self, data: &Dataset, repr: ReprStat) -> Result<Dataset> {
        match self {
            DatasetScope::All => Ok(data.clone()),
            DatasetScope::Aggregate => Walker::new(data).walk(representative_pool(repr)),
            DatasetScope::Test(test) => {
                let record = data.test(test)?.clone();
                Ok(std::iter::once((test.clone(), record)).collect())
            }
        }
    }
}

impl fmt::Display for DatasetScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetScope::All => f.write_str(Self::ALL),
            DatasetScope::Aggregate => f.write_str(Self::AGGREGATE),
            DatasetScope::Test(test) => f.write_str(test),
        }
    }
}
