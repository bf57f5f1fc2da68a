//! Representative values per test, split into numeric rows and text cells

use crate::dataset::{CacheState, MetricValue};
use crate::error::Result;
use crate::reduce::ReprStat;
use crate::walker::{Visitor, WalkContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `[variation, value per numeric metric...]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRow {
    pub variation: String,
    pub values: Vec<MetricValue>,
}

/// `(variation, metric, value)` for a non-numeric metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextCell {
    pub variation: String,
    pub metric: String,
    pub value: MetricValue,
}

/// Four tables per test, each indexed by cache state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewTables {
    pub numeric: [Vec<ViewRow>; 2],
    pub text: [Vec<TextCell>; 2],
}

/// Reduces every metric with a representative statistic
pub struct ViewDataVisitor {
    repr: ReprStat,
    current_test: ViewTables,
    current_row: Option<ViewRow>,
    result: BTreeMap<String, ViewTables>,
}

impl ViewDataVisitor {
    pub fn new(repr: ReprStat) -> Self {
        Self {
            repr,
            current_test: ViewTables::default(),
            current_row: None,
            result: BTreeMap::new(),
        }
    }
}

impl Visitor for ViewDataVisitor {
    type Output = BTreeMap<String, ViewTables>;

    fn pre_test(&mut self, _cx: &WalkContext<'_>, _test: &str) -> Result<()> {
        self.current_test = ViewTables::default();
        Ok(())
    }

    fn pre_cached(
        &mut self,
        _cx: &WalkContext<'_>,
        _cached: CacheState,
        variation: &str,
        _test: &str,
    ) -> Result<()> {
        self.current_row = Some(ViewRow {
            variation: variation.to_string(),
            values: Vec::new(),
        });
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
        let reduced = self.repr.reduce(value)?;
        if value.is_numeric() {
            if let Some(row) = self.current_row.as_mut() {
                row.values.push(reduced);
            }
        } else {
            self.current_test.text[cached.index()].push(TextCell {
                variation: variation.to_string(),
                metric: metric.to_string(),
                value: self.repr.reduce(&reduced)?,
            });
        }
        Ok(())
    }

    fn post_cached(
        &mut self,
        _cx: &WalkContext<'_>,
        cached: CacheState,
        _variation: &str,
        _test: &str,
    ) -> Result<()> {
        if let Some(row) = self.current_row.take() {
            self.current_test.numeric[cached.index()].push(row);
        }
        Ok(())
    }

    fn post_test(&mut self, _cx: &WalkContext<'_>, test: &str) -> Result<()> {
        self.result
            .insert(test.to_string(), std::mem::take(&mut self.current_test));
        Ok(())
    }

    fn finish(self) -> BTreeMap<String, ViewTables> {
        self.result
    }
}
