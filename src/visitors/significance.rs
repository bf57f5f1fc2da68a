//! Confidence interval comparison against a base variation

use super::ChartRow;
use crate::dataset::{CacheState, MetricValue};
use crate::error::{AnalysisError, Result};
use crate::reduce::OutlierFilter;
use crate::stats::{ConfidenceInterval, Z_95};
use crate::walker::{Visitor, WalkContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Base and main variation intervals for one test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalRow {
    pub test: String,
    pub base: ConfidenceInterval,
    pub main: ConfidenceInterval,
}

impl IntervalRow {
    /// The base variation had no value for this metric
    pub fn is_missing(&self) -> bool {
        self.base == ConfidenceInterval::MISSING
    }

    /// Non-overlapping intervals
    pub fn is_significant(&self) -> bool {
        !self.is_missing() && self.base.is_disjoint(&self.main)
    }
}

/// Interval table per metric, plus chart rows, indexed by cache state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignificanceReport {
    /// metric → one row per test
    pub table: [BTreeMap<String, Vec<IntervalRow>>; 2],
    /// `[test, base lower, base upper, main lower, main upper, ...]` per metric
    pub chart: [Vec<ChartRow>; 2],
}

/// Compares each walked variation with a fixed base variation
pub struct SignificanceVisitor {
    base: String,
    filter: OutlierFilter,
    z: f64,
    table: [BTreeMap<String, Vec<IntervalRow>>; 2],
}

impl SignificanceVisitor {
    pub fn new(base: impl Into<String>, filter: OutlierFilter) -> Self {
        Self {
            base: base.into(),
            filter,
            z: Z_95,
            table: Default::default(),
        }
    }

    /// Critical value for the intervals (1.96 by default)
    pub fn with_z(mut self, z: f64) -> Self {
        self.z = z;
        self
    }

    fn interval(&self, value: &MetricValue, context: &str) -> Result<ConfidenceInterval> {
        self.filter
            .apply_value(value)
            .conf_interval(self.z)
            .ok_or_else(|| AnalysisError::non_numeric(format!("confidence interval of {}", context)))
    }
}

impl Visitor for SignificanceVisitor {
    type Output = SignificanceReport;

    fn metric(
        &mut self,
        cx: &WalkContext<'_>,
        metric: &str,
        value: &MetricValue,
        cached: CacheState,
        _variation: &str,
        test: &str,
    ) -> Result<()> {
        let row = match cx.dataset().metric(test, &self.base, cached, metric) {
            Ok(base_value) => IntervalRow {
                test: test.to_string(),
                base: self.interval(base_value, metric)?,
                main: self.interval(value, metric)?,
            },
            Err(e) if e.is_missing_key() => {
                tracing::debug!(test = %test, metric = %metric, "base variation missing");
                IntervalRow {
                    test: test.to_string(),
                    base: ConfidenceInterval::MISSING,
                    main: ConfidenceInterval::MISSING,
                }
            }
            Err(e) => return Err(e),
        };

        self.table[cached.index()]
            .entry(metric.to_string())
            .or_default()
            .push(row);
        Ok(())
    }

    fn finish(self) -> SignificanceReport {
        let mut chart: [Vec<ChartRow>; 2] = Default::default();
        for (cached, metrics) in self.table.iter().enumerate() {
            let rows = &mut chart[cached];
            for intervals in metrics.values() {
                for interval in intervals {
                    let index = match rows.iter().position(|r| r.label == interval.test) {
                        Some(index) => index,
                        None => {
                            rows.push(ChartRow::new(interval.test.as_str()));
                            rows.len() - 1
                        }
                    };
                    rows[index].values.extend([
                        interval.base.lower,
                        interval.base.upper,
                        interval.main.lower,
                        interval.main.upper,
                    ]);
                }
            }
        }
        SignificanceReport {
            table: self.table,
            chart,
        }
    }
}
