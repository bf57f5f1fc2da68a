//! Single-metric delta bars and quartiles per test

use super::ChartRow;
use crate::dataset::{CacheState, MetricValue};
use crate::error::{AnalysisError, Result};
use crate::reduce::Delta;
use crate::walker::{Visitor, WalkContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `[variation, min, Q1, Q3, max]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuartileRow {
    pub variation: String,
    pub quartiles: [f64; 4],
}

/// Bar chart rows and quartile rows, both indexed by cache state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicStatReport {
    /// `[test, delta per variation...]`; only rows covering every variation
    pub chart: [Vec<ChartRow>; 2],
    /// test → quartile rows per variation
    pub quartiles: BTreeMap<String, [Vec<QuartileRow>; 2]>,
}

/// Evaluates a delta function for every visited (variation, metric)
///
/// Intended for a single metric. A test's row is dropped for a cache state
/// unless it holds exactly one value per variation of that test.
pub struct BasicStatVisitor {
    delta: Delta,
    current: [ChartRow; 2],
    report: BasicStatReport,
}

impl BasicStatVisitor {
    pub fn new(delta: Delta) -> Self {
        Self {
            delta,
            current: [ChartRow::new(""), ChartRow::new("")],
            report: BasicStatReport::default(),
        }
    }
}

impl Visitor for BasicStatVisitor {
    type Output = BasicStatReport;

    fn pre_test(&mut self, _cx: &WalkContext<'_>, test: &str) -> Result<()> {
        self.current = [ChartRow::new(test), ChartRow::new(test)];
        self.report
            .quartiles
            .insert(test.to_string(), Default::default());
        Ok(())
    }

    fn metric(
        &mut self,
        cx: &WalkContext<'_>,
        metric: &str,
        value: &MetricValue,
        cached: CacheState,
        variation: &str,
        test: &str,
    ) -> Result<()> {
        let delta = self
            .delta
            .eval(cx.dataset(), test, cached, metric, Some(variation))?;
        self.current[cached.index()].values.push(delta);

        let quartiles = value
            .quartiles()
            .ok_or_else(|| AnalysisError::non_numeric(format!("quartiles of {}", metric)))?;
        if let Some(rows) = self.report.quartiles.get_mut(test) {
            rows[cached.index()].push(QuartileRow {
                variation: variation.to_string(),
                quartiles,
            });
        }
        Ok(())
    }

    fn post_test(&mut self, cx: &WalkContext<'_>, test: &str) -> Result<()> {
        let variations = cx.dataset().test(test)?.len();
        let rows = std::mem::replace(&mut self.current, [ChartRow::new(""), ChartRow::new("")]);
        for (cached, row) in rows.into_iter().enumerate() {
            if row.values.len() == variations {
                self.report.chart[cached].push(row);
            } else {
                tracing::debug!(
                    test = %test,
                    cached,
                    values = row.values.len(),
                    variations,
                    "dropping incomplete chart row"
                );
            }
        }
        Ok(())
    }

    fn finish(self) -> BasicStatReport {
        self.report
    }
}
