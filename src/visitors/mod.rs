// Aggregation visitors over benchmark result datasets
//
// Each visitor is one accumulation strategy driven by `walker::Walker` and
// produces one output shape for a presentation layer to render:
//
// - FlatRecordVisitor:    one flat record per (test, variation) for tabular export
// - AggregatePoolVisitor: every test pooled into a single "Aggregate" test
// - ViewDataVisitor:      representative values per test, numeric and text
// - BasicStatVisitor:     per-test delta bars plus quartiles per variation
// - CorrelationVisitor:   independent vs dependent metric scatter and Pearson r
// - SignificanceVisitor:  base vs main variation confidence intervals
// - RunsVisitor:          per-run values for run-over-run trends
//
// Outputs indexed by cache state are `[first view, repeat view]` arrays.

mod aggregate;
mod basic;
mod correlation;
mod flat;
mod runs;
mod significance;
mod view;

pub use aggregate::{representative_pool, AggregatePoolVisitor, AGGREGATE_TEST};
pub use basic::{BasicStatReport, BasicStatVisitor, QuartileRow};
pub use correlation::{CorrelationReport, CorrelationVisitor, ScatterRow};
pub use flat::{FlatRecord, FlatRecordVisitor, REPEAT_VIEW_PREFIX};
pub use runs::{RunRow, RunsVisitor, MISSING_RUN};
pub use significance::{IntervalRow, SignificanceReport, SignificanceVisitor};
pub use view::{TextCell, ViewDataVisitor, ViewRow, ViewTables};

use serde::{Deserialize, Serialize};

/// A labelled row of chart values, e.g. `[test, v1, v2, ...]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRow {
    pub label: String,
    pub values: Vec<f64>,
}

impl ChartRow {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            values: Vec::new(),
        }
    }
}
