//! Load → pair → summarize → histogram, as one typed pipeline.

use std::path::Path;

use thiserror::Error;

use crate::histogram::OverlaidHistogram;
use crate::loader::{LoadError, LoadReport, LoadedEvents, load_file};
use crate::pairing::{Category, PairingOutcome, Tally, pair_events};
use crate::summary::DurationSummary;

/// Default number of histogram bins.
pub const DEFAULT_BINS: usize = 100;

/// Errors that stop an analysis run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("{count} pair(s) closed before they opened; the input is out of order")]
    OutOfOrder { count: usize },
}

/// Knobs for a single analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Number of histogram bins.
    pub bins: usize,
    /// Fail instead of skipping pairs with negative durations.
    pub strict: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            bins: DEFAULT_BINS,
            strict: false,
        }
    }
}

/// Per-category statistics. Either side is `None` when it has no pairs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summaries {
    pub manual: Option<DurationSummary>,
    pub auto: Option<DurationSummary>,
}

impl Summaries {
    pub const fn get(&self, category: Category) -> Option<&DurationSummary> {
        match category {
            Category::Manual => self.manual.as_ref(),
            Category::Auto => self.auto.as_ref(),
        }
    }
}

/// Everything one run produces, ready for rendering.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Events that survived loading.
    pub events: usize,
    pub users: usize,
    pub load: LoadReport,
    pub pairs: PairingOutcome,
    pub summaries: Summaries,
    /// `None` when neither category has pairs.
    pub histogram: Option<OverlaidHistogram>,
}

impl Analysis {
    /// Runs the whole pipeline on a usage log file.
    pub fn from_path(path: &Path, options: &AnalysisOptions) -> Result<Self, AnalysisError> {
        let loaded = load_file(path)?;
        Self::from_events(&loaded, options)
    }

    /// Runs every stage after loading.
    pub fn from_events(
        loaded: &LoadedEvents,
        options: &AnalysisOptions,
    ) -> Result<Self, AnalysisError> {
        let pairs = pair_events(loaded);
        check_order(&pairs.tally, options.strict)?;
        let summaries = summarize(&pairs);
        let histogram = OverlaidHistogram::build(&pairs.manual, &pairs.auto, options.bins);

        Ok(Self {
            events: loaded.len(),
            users: loaded.user_count(),
            load: *loaded.report(),
            pairs,
            summaries,
            histogram,
        })
    }
}

/// Summarises both categories, skipping any that are empty.
pub fn summarize(pairs: &PairingOutcome) -> Summaries {
    let summaries = Summaries {
        manual: DurationSummary::from_durations(&pairs.manual),
        auto: DurationSummary::from_durations(&pairs.auto),
    };
    for category in [Category::Manual, Category::Auto] {
        if summaries.get(category).is_none() {
            tracing::warn!(category = category.label(), "no pairs, skipping statistics");
        }
    }
    summaries
}

/// Rejects out-of-order pairs in strict mode; otherwise they were already
/// skipped and logged during pairing.
pub fn check_order(tally: &Tally, strict: bool) -> Result<(), AnalysisError> {
    if strict && tally.out_of_order > 0 {
        return Err(AnalysisError::OutOfOrder {
            count: tally.out_of_order,
        });
    }
    Ok(())
}
