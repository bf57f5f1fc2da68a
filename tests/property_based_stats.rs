//! Property-based tests for the numeric utilities and reducers
//!
//! Core properties tested:
//! 1. Median, mean and quartiles stay within the data range
//! 2. Pearson r is finite and within [-1, 1]
//! 3. Confidence intervals contain their mean
//! 4. The IQR outlier filter drops exactly a planted outlier, and never
//!    touches sequences of ten values or fewer

use pagestat::dataset::MetricValue;
use pagestat::reduce::{OutlierFilter, ReprStat};
use pagestat::stats;
use proptest::prelude::*;

const EPSILON: f64 = 1e-9;

fn bounds(values: &[f64]) -> (f64, f64) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (min, max)
}

#[test]
fn test_documented_values() {
    assert_eq!(stats::median(&[]), 0.0);
    assert_eq!(stats::mean(&[]), 0.0);
    assert_eq!(stats::median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
    assert_eq!(stats::median(&[1.0, 2.0, 3.0]), 2.0);
    assert_eq!(stats::quartiles(&[4.0, 1.0, 3.0, 2.0]), [1.0, 1.5, 3.5, 4.0]);
    assert_eq!(
        stats::quartiles(&[1.0, 2.0, 3.0, 4.0, 5.0]),
        [1.0, 1.5, 4.5, 5.0]
    );
    assert_eq!(
        stats::correlation(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]),
        1.0
    );
    assert_eq!(stats::correlation(&[(1.0, 1.0), (1.0, 2.0)]), 0.0);
}

#[test]
fn test_outlier_filter_eleven_values() {
    let values = [12.0, 10.0, 11.0, 13.0, 9.0, 10.0, 400.0, 12.0, 11.0, 10.0, 11.0];
    let kept = OutlierFilter::basic().apply(&values);
    assert_eq!(kept.len(), 10);
    assert!(!kept.contains(&400.0));

    let short = &values[..10];
    assert_eq!(OutlierFilter::basic().apply(short), short.to_vec());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_central_values_within_range(
        values in prop::collection::vec(-1.0e6f64..1.0e6, 1..40),
    ) {
        let (min, max) = bounds(&values);
        let median = stats::median(&values);
        let mean = stats::mean(&values);
        let slack = EPSILON * min.abs().max(max.abs()).max(1.0);
        prop_assert!(median >= min && median <= max);
        prop_assert!(mean >= min - slack && mean <= max + slack);
    }

    #[test]
    fn prop_quartiles_ordered(
        values in prop::collection::vec(-1.0e6f64..1.0e6, 1..40),
    ) {
        let (min, max) = bounds(&values);
        let [q0, q1, q3, q4] = stats::quartiles(&values);
        prop_assert_eq!(q0, min);
        prop_assert_eq!(q4, max);
        prop_assert!(q0 <= q1 && q1 <= q3 && q3 <= q4);
    }

    #[test]
    fn prop_correlation_bounded(
        pairs in prop::collection::vec((-1.0e3f64..1.0e3, -1.0e3f64..1.0e3), 0..30),
    ) {
        let r = stats::correlation(&pairs);
        prop_assert!(r.is_finite());
        prop_assert!((-1.0 - 1e-9..=1.0 + 1e-9).contains(&r));
    }

    #[test]
    fn prop_conf_interval_contains_mean(
        values in prop::collection::vec(0.0f64..1.0e4, 2..30),
    ) {
        let interval = stats::conf_interval(&values);
        prop_assert!(interval.lower <= interval.mean);
        prop_assert!(interval.mean <= interval.upper);
    }

    #[test]
    fn prop_short_sequences_never_filtered(
        values in prop::collection::vec(-1.0e9f64..1.0e9, 0..=10),
    ) {
        prop_assert_eq!(OutlierFilter::basic().apply(&values), values);
    }

    #[test]
    fn prop_filter_drops_planted_outlier(
        start in 0.0f64..1000.0,
        step in 0.5f64..50.0,
        distance in 20.0f64..1000.0,
        position in 0usize..=10,
    ) {
        // Ten evenly spaced values plus one far above them
        let mut values: Vec<f64> = (0..10).map(|k| start + step * k as f64).collect();
        let outlier = start + step * 9.0 + step * distance;
        values.insert(position, outlier);

        let kept = OutlierFilter::basic().apply(&values);
        let mut expected = values.clone();
        expected.remove(position);
        prop_assert_eq!(kept, expected);
    }

    #[test]
    fn prop_filtered_values_are_a_subset(
        values in prop::collection::vec(0.0f64..1.0e5, 11..60),
    ) {
        let kept = OutlierFilter::basic().apply(&values);
        prop_assert!(!kept.is_empty());
        prop_assert!(kept.len() <= values.len());
        prop_assert!(kept.iter().all(|v| values.contains(v)));
    }

    #[test]
    fn prop_repr_stat_matches_stats(
        values in prop::collection::vec(0.0f64..1.0e5, 1..30),
    ) {
        let runs = MetricValue::from(values.clone());
        prop_assert_eq!(
            ReprStat::median().reduce_number(&runs).unwrap(),
            stats::median(&values)
        );
        prop_assert_eq!(
            ReprStat::mean().reduce_number(&runs).unwrap(),
            stats::mean(&values)
        );
    }
}
