//! Log-scale histogram of two duration distributions on shared bins.

use serde::Serialize;

/// One bin of an [`OverlaidHistogram`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bin {
    /// Lower edge in `log10(ms + 1)`.
    pub start: f64,
    /// Upper edge in `log10(ms + 1)`.
    pub end: f64,
    pub manual_count: usize,
    pub auto_count: usize,
    /// Manual density, so the bin areas of the series sum to 1.
    pub manual_density: f64,
    pub auto_density: f64,
}

/// Manual and auto distributions binned over the same range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlaidHistogram {
    pub bins: Vec<Bin>,
    pub manual_total: usize,
    pub auto_total: usize,
}

impl OverlaidHistogram {
    /// Bins `log10(duration + 1)` of both series into `bins` equal-width bins.
    ///
    /// Returns `None` when both series are empty or `bins` is zero. When
    /// every value is identical the range is widened to one unit around it.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn build(manual_ms: &[i64], auto_ms: &[i64], bins: usize) -> Option<Self> {
        if bins == 0 || (manual_ms.is_empty() && auto_ms.is_empty()) {
            return None;
        }

        let manual = log_scale(manual_ms);
        let auto = log_scale(auto_ms);

        let (mut low, mut high) = manual
            .iter()
            .chain(&auto)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if high <= low {
            low -= 0.5;
            high += 0.5;
        }
        let width = (high - low) / bins as f64;

        let mut manual_counts = vec![0_usize; bins];
        let mut auto_counts = vec![0_usize; bins];
        let index = |v: f64| (((v - low) / width) as usize).min(bins - 1);
        for &v in &manual {
            manual_counts[index(v)] += 1;
        }
        for &v in &auto {
            auto_counts[index(v)] += 1;
        }

        let density = |count: usize, total: usize| {
            if total == 0 {
                0.0
            } else {
                count as f64 / (total as f64 * width)
            }
        };

        let bins = (0..bins)
            .map(|i| Bin {
                start: (i as f64).mul_add(width, low),
                end: ((i + 1) as f64).mul_add(width, low),
                manual_count: manual_counts[i],
                auto_count: auto_counts[i],
                manual_density: density(manual_counts[i], manual.len()),
                auto_density: density(auto_counts[i], auto.len()),
            })
            .collect();

        Some(Self {
            bins,
            manual_total: manual.len(),
            auto_total: auto.len(),
        })
    }

    /// Largest density across both series.
    pub fn max_density(&self) -> f64 {
        self.bins
            .iter()
            .map(|bin| bin.manual_density.max(bin.auto_density))
            .fold(0.0, f64::max)
    }
}

#[allow(clippy::cast_precision_loss)]
fn log_scale(durations_ms: &[i64]) -> Vec<f64> {
    durations_ms
        .iter()
        .map(|&d| (d as f64 + 1.0).log10())
        .collect()
}
