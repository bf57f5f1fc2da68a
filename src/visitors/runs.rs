//! Per-run values for run-over-run trend charts

use crate::dataset::{CacheState, Dataset, MetricValue};
use crate::error::Result;
use crate::walker::{Visitor, WalkContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder for runs a metric does not have
pub const MISSING_RUN: f64 = -1.0;

/// `["Run N", value per visited metric...]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRow {
    pub label: String,
    pub values: Vec<MetricValue>,
}

/// Lays out every run of every visited metric, per variation and cache state
pub struct RunsVisitor {
    runs: usize,
    result: [BTreeMap<String, Vec<RunRow>>; 2],
}

impl RunsVisitor {
    /// Size rows to the dataset's run count
    pub fn new(data: &Dataset) -> Self {
        Self::with_runs(data.runs())
    }

    pub fn with_runs(runs: usize) -> Self {
        Self {
            runs,
            result: Default::default(),
        }
    }
}

fn run_value(value: &MetricValue, run: usize) -> Option<&MetricValue> {
    match value {
        MetricValue::Runs(runs) => runs.get(run),
        scalar if run == 0 => Some(scalar),
        _ => None,
    }
}

impl Visitor for RunsVisitor {
    type Output = [BTreeMap<String, Vec<RunRow>>; 2];

    fn pre_cached(
        &mut self,
        _cx: &WalkContext<'_>,
        cached: CacheState,
        variation: &str,
        _test: &str,
    ) -> Result<()> {
        let runs = self.runs;
        self.result[cached.index()]
            .entry(variation.to_string())
            .or_insert_with(|| {
                (0..runs)
                    .map(|run| RunRow {
                        label: format!("Run {}", run),
                        values: Vec::new(),
                    })
                    .collect()
            });
        Ok(())
    }

    fn metric(
        &mut self,
        _cx: &WalkContext<'_>,
        _metric: &str,
        value: &MetricValue,
        cached: CacheState,
        variation: &str,
        _test: &str,
    ) -> Result<()> {
        let Some(rows) = self.result[cached.index()].get_mut(variation) else {
            return Ok(());
        };
        for (run, row) in rows.iter_mut().enumerate() {
            let cell = run_value(value, run)
                .cloned()
                .unwrap_or(MetricValue::Number(MISSING_RUN));
            row.values.push(cell);
        }
        Ok(())
    }

    fn finish(self) -> [BTreeMap<String, Vec<RunRow>>; 2] {
        self.result
    }
}
