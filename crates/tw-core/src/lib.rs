//! Core logic for analysing tool window usage logs.
//!
//! This crate contains:
//! - Loading: parsing the CSV usage log into per-user chronological events
//! - Pairing: matching each open with its close to produce durations
//! - Statistics: per-category summaries and a shared-bin log histogram

pub mod event;
pub mod histogram;
pub mod loader;
pub mod pairing;
pub mod pipeline;
pub mod summary;

pub use event::{Event, EventKind, OpenType, UnknownEventKind};
pub use histogram::{Bin, OverlaidHistogram};
pub use loader::{LoadError, LoadReport, LoadedEvents, load_events, load_file};
pub use pairing::{
    Category, Pair, PairingOutcome, SessionMachine, SessionState, Step, Tally, pair_events,
    pair_session,
};
pub use pipeline::{Analysis, AnalysisError, AnalysisOptions, DEFAULT_BINS, Summaries};
pub use summary::DurationSummary;
