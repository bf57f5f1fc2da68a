//! Independent vs dependent metric correlation

use crate::dataset::{CacheState, MetricValue};
use crate::error::Result;
use crate::reduce::Delta;
use crate::stats;
use crate::walker::{Visitor, WalkContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One scatter point set: the independent value and one value per dependent metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterRow {
    pub independent: f64,
    pub dependent: Vec<f64>,
    /// Test the row came from
    pub test: String,
}

/// Scatter rows and Pearson r per dependent metric, indexed by cache state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationReport {
    pub scatter: [Vec<ScatterRow>; 2],
    pub coefficients: [BTreeMap<String, f64>; 2],
}

/// Pairs an independent metric's delta with each walked metric's delta
///
/// A missing key on the independent side counts as 0; on the dependent side
/// the pair is skipped, and the scatter row is kept only if every dependent
/// metric produced a value.
pub struct CorrelationVisitor {
    independent: Delta,
    dependent: Delta,
    imetric: String,
    current: Vec<f64>,
    scatter: [Vec<ScatterRow>; 2],
    pairs: [BTreeMap<String, Vec<(f64, f64)>>; 2],
}

impl CorrelationVisitor {
    pub fn new(independent: Delta, dependent: Delta, imetric: impl Into<String>) -> Self {
        Self {
            independent,
            dependent,
            imetric: imetric.into(),
            current: Vec::new(),
            scatter: Default::default(),
            pairs: Default::default(),
        }
    }
}

impl Visitor for CorrelationVisitor {
    type Output = CorrelationReport;

    fn pre_cached(
        &mut self,
        cx: &WalkContext<'_>,
        cached: CacheState,
        variation: &str,
        test: &str,
    ) -> Result<()> {
        let independent =
            match self
                .independent
                .eval(cx.dataset(), test, cached, &self.imetric, Some(variation))
            {
                Ok(value) => value,
                Err(e) if e.is_missing_key() => {
                    tracing::debug!(test = %test, error = %e, "independent metric missing, using 0");
                    0.0
                }
                Err(e) => return Err(e),
            };
        self.current = vec![independent];
        Ok(())
    }

    fn metric(
        &mut self,
        cx: &WalkContext<'_>,
        metric: &str,
        _value: &MetricValue,
        cached: CacheState,
        variation: &str,
        test: &str,
    ) -> Result<()> {
        let value = match self
            .dependent
            .eval(cx.dataset(), test, cached, metric, Some(variation))
        {
            Ok(value) => value,
            Err(e) if e.is_missing_key() => return Ok(()),
            Err(e) => return Err(e),
        };

        self.current.push(value);
        self.pairs[cached.index()]
            .entry(metric.to_string())
            .or_default()
            .push((self.current[0], value));
        Ok(())
    }

    fn post_cached(
        &mut self,
        cx: &WalkContext<'_>,
        cached: CacheState,
        _variation: &str,
        test: &str,
    ) -> Result<()> {
        if self.current.len() == cx.metrics().len() + 1 {
            self.scatter[cached.index()].push(ScatterRow {
                independent: self.current[0],
                dependent: self.current[1..].to_vec(),
                test: test.to_string(),
            });
        }
        Ok(())
    }

    fn finish(self) -> CorrelationReport {
        let mut coefficients: [BTreeMap<String, f64>; 2] = Default::default();
        for (cached, pairs) in self.pairs.iter().enumerate() {
            for (metric, points) in pairs {
                coefficients[cached].insert(metric.clone(), stats::correlation(points));
            }
        }
        CorrelationReport {
            scatter: self.scatter,
            coefficients,
        }
    }
}
