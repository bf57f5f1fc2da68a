//! Dataset index: the choices a report over this dataset can be built from

use crate::dataset::{ColumnType, Dataset, MetricQuery};
use crate::reduce::{delta_function_list, DeltaOption, ReprKind};
use serde::{Deserialize, Serialize};

/// Tests, variations, metrics, run count and delta functions of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// Complete tests only
    pub tests: Vec<String>,
    pub variations: Vec<String>,
    /// Numeric metrics, suitable for charts
    pub metrics: Vec<String>,
    pub all_metrics: Vec<(ColumnType, String)>,
    pub runs: usize,
    pub reprstats: Vec<String>,
    pub delta_functions: Vec<DeltaOption>,
}

impl DatasetSummary {
    pub fn from_dataset(data: &Dataset) -> Self {
        let summary = Self {
            tests: data.tests(),
            variations: data.variations(),
            metrics: data.metric_names(&MetricQuery::numeric()),
            all_metrics: data.metrics(&MetricQuery::all()),
            runs: data.runs(),
            reprstats: ReprKind::ALL.iter().map(|k| k.name().to_string()).collect(),
            delta_functions: delta_function_list(data),
        };
        tracing::debug!(
            tests = summary.tests.len(),
            variations = summary.variations.len(),
            runs = summary.runs,
            "summarized dataset"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_fields() {
        let data = Dataset::from_json_str(
            r#"{
                "a.com": {
                    "control": [{"load": [1, 2, 3], "server": "nginx"}, {}],
                    "rewrite": [{"load": [1, 2, 3], "server": "nginx"}, {}]
                },
                "b.com": {
                    "control": [{"load": [1]}, {}]
                }
            }"#,
        )
        .unwrap();
        let summary = DatasetSummary::from_dataset(&data);

        assert_eq!(summary.tests, vec!["a.com"]);
        assert_eq!(summary.variations, vec!["control", "rewrite"]);
        assert_eq!(summary.metrics, vec!["load"]);
        assert_eq!(
            summary.all_metrics,
            vec![
                (ColumnType::Number, "load".to_string()),
                (ColumnType::String, "server".to_string())
            ]
        );
        assert_eq!(summary.runs, 3);
        assert_eq!(summary.reprstats, vec!["median", "mean"]);
        assert_eq!(summary.delta_functions.len(), 10);
    }

    #[test]
    fn test_summary_empty_dataset() {
        let summary = DatasetSummary::from_dataset(&Dataset::new());
        assert!(summary.tests.is_empty());
        assert!(summary.metrics.is_empty());
        assert_eq!(summary.runs, 0);
        assert!(summary.delta_functions.is_empty());
    }
}
