//! Numeric utilities for per-run benchmark measurements
//!
//! Benchmark data routinely contains empty, single-sample and constant
//! series, so every function here returns a defined sentinel for degenerate
//! input instead of failing. The only exception is [`std_dev`], whose
//! `n >= 2` requirement is a caller precondition.

use serde::{Deserialize, Serialize};

/// Two-tailed 95% critical value of the standard normal distribution
pub const Z_95: f64 = 1.96;

/// A confidence interval around a sample mean
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub mean: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    /// Marker used when the base variation of a comparison has no value
    pub const MISSING: ConfidenceInterval = ConfidenceInterval {
        lower: -1.0,
        mean: -1.0,
        upper: -1.0,
    };

    /// Interval of a single observed value
    pub fn point(value: f64) -> Self {
        Self {
            lower: value,
            mean: value,
            upper: value,
        }
    }

    /// True if the two intervals share no values
    pub fn is_disjoint(&self, other: &ConfidenceInterval) -> bool {
        self.upper < other.lower || other.upper < self.lower
    }
}

/// Arithmetic mean; 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut copy = values.to_vec();
    copy.sort_by(f64::total_cmp);
    copy
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let len = sorted.len();
    match len {
        0 => 0.0,
        _ if len % 2 == 1 => sorted[len / 2],
        _ => (sorted[len / 2] + sorted[len / 2 - 1]) / 2.0,
    }
}

/// Median of a sorted copy; 0 for an empty slice
pub fn median(values: &[f64]) -> f64 {
    median_of_sorted(&sorted(values))
}

/// `[min, Q1, Q3, max]` of a set of values
///
/// With fewer than four values the inner quartiles collapse to the median.
/// Otherwise the sorted values are split into a lower half of `floor(n/2)`
/// elements and an upper half starting at `ceil(n/2)`, so the middle element
/// of an odd-length input belongs to neither half. This differs from the
/// split that keeps the middle element in the upper half, which would give
/// Q3 = 4 for `[1, 2, 3, 4, 5]`.
///
/// ```
/// use pagestat::stats::quartiles;
///
/// assert_eq!(quartiles(&[4.0, 1.0, 3.0, 2.0]), [1.0, 1.5, 3.5, 4.0]);
/// assert_eq!(quartiles(&[1.0, 2.0, 3.0, 4.0, 5.0]), [1.0, 1.5, 4.5, 5.0]);
/// ```
pub fn quartiles(values: &[f64]) -> [f64; 4] {
    if values.is_empty() {
        return [0.0; 4];
    }

    let sorted = sorted(values);
    let len = sorted.len();
    let min = sorted[0];
    let max = sorted[len - 1];

    if len < 4 {
        let mid = median_of_sorted(&sorted);
        return [min, mid, mid, max];
    }

    let lower = &sorted[..len / 2];
    let upper = &sorted[len.div_ceil(2)..];
    [min, median_of_sorted(lower), median_of_sorted(upper), max]
}

/// Pearson correlation coefficient (r) of `(x, y)` pairs
///
/// Uses the single-pass sum formula. A zero denominator (constant series,
/// fewer than two points) yields 0.
pub fn correlation(pairs: &[(f64, f64)]) -> f64 {
    let n = pairs.len() as f64;
    let (mut ex, mut ey, mut exy, mut ex2, mut ey2) = (0.0, 0.0, 0.0, 0.0, 0.0);

    for &(x, y) in pairs {
        ex += x;
        ey += y;
        exy += x * y;
        ex2 += x * x;
        ey2 += y * y;
    }

    let numerator = n * exy - ex * ey;
    let denominator = ((n * ex2 - ex * ex) * (n * ey2 - ey * ey)).sqrt();

    // NaN from rounding below zero counts as degenerate too
    if denominator == 0.0 || denominator.is_nan() {
        return 0.0;
    }
    (numerator / denominator).clamp(-1.0, 1.0)
}

/// Sample standard deviation (n - 1 denominator)
///
/// Callers must pass at least two values; fewer produces a non-finite result.
pub fn std_dev(values: &[f64]) -> f64 {
    let mean = mean(values);
    let sum_sq: f64 = values.iter().map(|x| (mean - x).powi(2)).sum();
    (sum_sq / (values.len() as f64 - 1.0)).sqrt()
}

/// 95% confidence interval of the mean
pub fn conf_interval(values: &[f64]) -> ConfidenceInterval {
    conf_interval_with(values, Z_95)
}

/// Confidence interval of the mean for a given critical value
///
/// Fewer than two samples cannot estimate spread and give `(0, mean, 0)`.
pub fn conf_interval_with(values: &[f64], z: f64) -> ConfidenceInterval {
    let stat = mean(values);
    if values.len() < 2 {
        return ConfidenceInterval {
            lower: 0.0,
            mean: stat,
            upper: 0.0,
        };
    }

    let stderr = std_dev(values) / (values.len() as f64).sqrt();
    let margin = z * stderr;
    ConfidenceInterval {
        lower: stat - margin,
        mean: stat,
        upper: stat + margin,
    }
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}
