//! Pools all tests into one synthetic "Aggregate" test

use crate::dataset::{CacheState, Dataset, MetricValue, TestRecord};
use crate::error::Result;
use crate::reduce::ReprStat;
use crate::walker::{Visitor, WalkContext};

/// Name of the single test in a pooled dataset
pub const AGGREGATE_TEST: &str = "Aggregate";

/// Extends one pool per (variation, cache state, metric) with every test's runs
///
/// The filter sees each visited value as a sequence (scalars are wrapped)
/// and returns what gets appended to the pool.
pub struct AggregatePoolVisitor<F> {
    filter: F,
    pool: TestRecord,
}

fn keep(runs: Vec<MetricValue>) -> Result<Vec<MetricValue>> {
    Ok(runs)
}

impl AggregatePoolVisitor<fn(Vec<MetricValue>) -> Result<Vec<MetricValue>>> {
    /// Pool raw runs unchanged
    pub fn unfiltered() -> Self {
        Self::new(keep)
    }
}

impl<F> AggregatePoolVisitor<F>
where
    F: FnMut(Vec<MetricValue>) -> Result<Vec<MetricValue>>,
{
    pub fn new(filter: F) -> Self {
        Self {
            filter,
            pool: TestRecord::new(),
        }
    }
}

/// Pool each test's representative statistic rather than its raw runs
///
/// This is the "aggregate" dataset scope: one value per test per metric.
pub fn representative_pool(
    repr: ReprStat,
) -> AggregatePoolVisitor<impl FnMut(Vec<MetricValue>) -> Result<Vec<MetricValue>>> {
    AggregatePoolVisitor::new(move |runs| Ok(vec![repr.reduce(&MetricValue::Runs(runs))?]))
}

impl<F> Visitor for AggregatePoolVisitor<F>
where
    F: FnMut(Vec<MetricValue>) -> Result<Vec<MetricValue>>,
{
    type Output = Dataset;

    fn pre_variation(&mut self, _cx: &WalkContext<'_>, variation: &str, _test: &str) -> Result<()> {
        self.pool.entry(variation.to_string()).or_default();
        Ok(())
    }

    fn metric(
        &mut self,
        _cx: &WalkContext<'_>,
        metric: &str,
        value: &MetricValue,
        cached: CacheState,
        variation: &str,
        _test: &str,
    ) -> Result<()> {
        let runs = match value {
            MetricValue::Runs(runs) => runs.clone(),
            scalar => vec![scalar.clone()],
        };
        let filtered = (self.filter)(runs)?;

        let slot = self
            .pool
            .entry(variation.to_string())
            .or_default()
            .view_mut(cached)
            .entry(metric.to_string())
            .or_insert_with(MetricValue::empty);
        if let MetricValue::Runs(pooled) = slot {
            pooled.extend(filtered);
        }
        Ok(())
    }

    fn finish(self) -> Dataset {
        let mut data = Dataset::new();
        data.insert(AGGREGATE_TEST, self.pool);
        data
    }
}
