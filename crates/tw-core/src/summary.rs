//! Descriptive statistics over duration lists.

use serde::Serialize;

/// Milliseconds per second, for converting reported values.
const MS_PER_SECOND: f64 = 1000.0;

/// Summary of one category's durations.
///
/// Times are in seconds. The log fields are over `log10(duration_ms + 1)`,
/// which keeps long-tailed distributions comparable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DurationSummary {
    pub count: usize,
    pub mean_s: f64,
    pub median_s: f64,
    /// Population standard deviation.
    pub std_s: f64,
    pub log_mean: f64,
    pub log_median: f64,
    pub p5_s: f64,
    pub p95_s: f64,
}

impl DurationSummary {
    /// Summarises durations in milliseconds. Returns `None` when empty.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_durations(durations_ms: &[i64]) -> Option<Self> {
        if durations_ms.is_empty() {
            return None;
        }

        let mut sorted: Vec<f64> = durations_ms.iter().map(|&d| d as f64).collect();
        sorted.sort_by(f64::total_cmp);
        let logs: Vec<f64> = sorted.iter().map(|d| (d + 1.0).log10()).collect();

        Some(Self {
            count: sorted.len(),
            mean_s: mean(&sorted) / MS_PER_SECOND,
            median_s: percentile(&sorted, 50.0) / MS_PER_SECOND,
            std_s: std_dev(&sorted) / MS_PER_SECOND,
            log_mean: mean(&logs),
            log_median: percentile(&logs, 50.0),
            p5_s: percentile(&sorted, 5.0) / MS_PER_SECOND,
            p95_s: percentile(&sorted, 95.0) / MS_PER_SECOND,
        })
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[allow(clippy::cast_precision_loss)]
fn std_dev(values: &[f64]) -> f64 {
    let mean = mean(values);
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Percentile with linear interpolation between the closest ranks.
///
/// `sorted` must be ascending and non-empty.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn empty_category_has_no_summary() {
        assert_eq!(DurationSummary::from_durations(&[]), None);
    }

    #[test]
    fn single_duration() {
        let summary = DurationSummary::from_durations(&[2_000]).unwrap();

        assert_eq!(summary.count, 1);
        approx(summary.mean_s, 2.0);
        approx(summary.median_s, 2.0);
        approx(summary.std_s, 0.0);
        approx(summary.p5_s, 2.0);
        approx(summary.p95_s, 2.0);
        approx(summary.log_mean, 2_001f64.log10());
    }

    #[test]
    fn known_distribution() {
        let summary = DurationSummary::from_durations(&[4_000, 1_000, 3_000, 2_000]).unwrap();

        assert_eq!(summary.count, 4);
        approx(summary.mean_s, 2.5);
        approx(summary.median_s, 2.5);
        // population std of 1..4 seconds
        approx(summary.std_s, 1.25f64.sqrt());
        approx(summary.p5_s, 1.15);
        approx(summary.p95_s, 3.85);
    }

    #[test]
    fn log_statistics_use_duration_plus_one() {
        let summary = DurationSummary::from_durations(&[0, 9, 99]).unwrap();

        approx(summary.log_mean, 1.0);
        approx(summary.log_median, 1.0);
    }

    #[test]
    fn percentile_interpolates() {
        let sorted = [10.0, 20.0, 30.0];

        approx(percentile(&sorted, 0.0), 10.0);
        approx(percentile(&sorted, 50.0), 20.0);
        approx(percentile(&sorted, 75.0), 25.0);
        approx(percentile(&sorted, 100.0), 30.0);
    }
}
