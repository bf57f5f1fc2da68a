//! Flat per-(test, variation) records for tabular export

use crate::dataset::{CacheState, MetricValue};
use crate::error::Result;
use crate::reduce::OutlierFilter;
use crate::stats;
use crate::walker::{Visitor, WalkContext};
use std::collections::BTreeMap;

/// Column name → value
pub type FlatRecord = BTreeMap<String, MetricValue>;

/// Prefix for columns that come from the repeat view
pub const REPEAT_VIEW_PREFIX: &str = "rv_";

/// Merges every metric of a (test, variation) into one record
///
/// Numeric aggregate metrics expand into `<metric>_median` and
/// `<metric>_mean`; everything else is copied verbatim. Repeat-view columns
/// carry the [`REPEAT_VIEW_PREFIX`].
#[derive(Debug, Default)]
pub struct FlatRecordVisitor {
    filter: OutlierFilter,
    current: FlatRecord,
    records: Vec<FlatRecord>,
}

impl FlatRecordVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter runs before the median and mean are taken
    pub fn with_filter(mut self, filter: OutlierFilter) -> Self {
        self.filter = filter;
        self
    }
}

fn column(cached: CacheState, metric: &str) -> String {
    match cached {
        CacheState::FirstView => metric.to_string(),
        CacheState::RepeatView => format!("{}{}", REPEAT_VIEW_PREFIX, metric),
    }
}

impl Visitor for FlatRecordVisitor {
    type Output = Vec<FlatRecord>;

    fn pre_variation(&mut self, _cx: &WalkContext<'_>, variation: &str, test: &str) -> Result<()> {
        self.current = FlatRecord::new();
        self.current.insert("test".to_string(), test.into());
        self.current.insert("variation".to_string(), variation.into());
        Ok(())
    }

    fn metric(
        &mut self,
        _cx: &WalkContext<'_>,
        metric: &str,
        value: &MetricValue,
        cached: CacheState,
        _variation: &str,
        _test: &str,
    ) -> Result<()> {
        let name = column(cached, metric);
        let numbers = value
            .is_aggregate()
            .then(|| value.numbers())
            .flatten()
            .filter(|n| !n.is_empty());

        match numbers {
            Some(numbers) => {
                let kept = self.filter.apply(&numbers);
                self.current
                    .insert(format!("{}_median", name), stats::median(&kept).into());
                self.current
                    .insert(format!("{}_mean", name), stats::mean(&kept).into());
            }
            None => {
                self.current.insert(name, value.clone());
            }
        }
        Ok(())
    }

    fn post_variation(&mut self, _cx: &WalkContext<'_>, _variation: &str, _test: &str) -> Result<()> {
        self.records.push(std::mem::take(&mut self.current));
        Ok(())
    }

    fn finish(self) -> Vec<FlatRecord> {
        self.records
    }
}
