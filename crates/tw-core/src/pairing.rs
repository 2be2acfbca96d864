//! Pairing open and close events into durations.
//!
//! # Algorithm Summary
//!
//! Each user's events are walked in chronological order by a two-state
//! machine ([`SessionState::Idle`] / [`SessionState::Open`]):
//!
//! 1. An open while idle becomes the pending open.
//! 2. An open while another open is pending replaces it (overwrite).
//! 3. A close while open yields a duration and returns to idle.
//! 4. A close while idle is dropped.
//! 5. An open still pending at the end of the session is dropped.
//!
//! Users never share state, so sessions are paired in parallel and merged.

use std::ops::AddAssign;

use rayon::prelude::*;
use serde::Serialize;

use crate::event::{Event, EventKind, OpenType};
use crate::loader::LoadedEvents;

/// The two reporting categories a duration can land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Manual,
    Auto,
}

impl Category {
    /// Maps an open type to its category. `Unknown` has none.
    #[must_use]
    pub const fn from_open_type(open_type: OpenType) -> Option<Self> {
        match open_type {
            OpenType::Manual => Some(Self::Manual),
            OpenType::Auto => Some(Self::Auto),
            OpenType::Unknown => None,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Manual => "Manual",
            Self::Auto => "Auto",
        }
    }
}

/// One matched open→close interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pair {
    pub category: Category,
    pub duration_ms: i64,
}

/// Where a user's session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No open event is waiting for a close.
    #[default]
    Idle,
    /// The most recent open, waiting for its close.
    Open { open_type: OpenType, opened_at: i64 },
}

/// The outcome of feeding one event to a [`SessionMachine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Idle → Open.
    Opened,
    /// Open → Open; the previous pending open is discarded.
    Overwrote { discarded_at: i64 },
    /// Open → Idle with a categorised duration.
    Paired(Pair),
    /// Open → Idle, but the open had no category so the duration is dropped.
    UnknownType { duration_ms: i64 },
    /// Open → Idle with the close earlier than the open. Nothing is emitted.
    OutOfOrder { opened_at: i64, closed_at: i64 },
    /// A close with nothing open. State is unchanged.
    OrphanClose,
}

/// State machine for a single user's chronological event sequence.
#[derive(Debug, Clone, Default)]
pub struct SessionMachine {
    state: SessionState,
}

impl SessionMachine {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Applies one event and reports the transition taken.
    pub fn step(&mut self, event: &Event) -> Step {
        match (event.kind, self.state) {
            (EventKind::Opened, SessionState::Idle) => {
                self.open(event);
                Step::Opened
            }
            (EventKind::Opened, SessionState::Open { opened_at, .. }) => {
                self.open(event);
                Step::Overwrote {
                    discarded_at: opened_at,
                }
            }
            (EventKind::Closed, SessionState::Idle) => Step::OrphanClose,
            (
                EventKind::Closed,
                SessionState::Open {
                    open_type,
                    opened_at,
                },
            ) => {
                self.state = SessionState::Idle;
                let duration_ms = event.timestamp - opened_at;
                if duration_ms < 0 {
                    return Step::OutOfOrder {
                        opened_at,
                        closed_at: event.timestamp,
                    };
                }
                match Category::from_open_type(open_type) {
                    Some(category) => Step::Paired(Pair {
                        category,
                        duration_ms,
                    }),
                    None => Step::UnknownType { duration_ms },
                }
            }
        }
    }

    /// Ends the session, returning the timestamp of an open left pending.
    pub const fn finish(self) -> Option<i64> {
        match self.state {
            SessionState::Idle => None,
            SessionState::Open { opened_at, .. } => Some(opened_at),
        }
    }

    const fn open(&mut self, event: &Event) {
        self.state = SessionState::Open {
            open_type: event.open_type,
            opened_at: event.timestamp,
        };
    }
}

/// Accounting of how every consumed event was used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub manual: usize,
    pub auto: usize,
    /// Pairs whose open type was neither manual nor auto.
    pub unknown_type: usize,
    /// Opens replaced by a later open before being closed.
    pub overwritten_opens: usize,
    /// Opens still pending when the user's events ran out.
    pub trailing_opens: usize,
    /// Closes with no pending open.
    pub orphan_closes: usize,
    /// Pairs dropped because the close preceded the open.
    pub out_of_order: usize,
}

impl Tally {
    fn record(&mut self, step: &Step) {
        match step {
            Step::Opened => {}
            Step::Overwrote { .. } => self.overwritten_opens += 1,
            Step::Paired(pair) => match pair.category {
                Category::Manual => self.manual += 1,
                Category::Auto => self.auto += 1,
            },
            Step::UnknownType { .. } => self.unknown_type += 1,
            Step::OutOfOrder { .. } => self.out_of_order += 1,
            Step::OrphanClose => self.orphan_closes += 1,
        }
    }

    /// Number of open and close events this tally accounts for.
    pub const fn events_accounted(&self) -> usize {
        2 * (self.manual + self.auto + self.unknown_type + self.out_of_order)
            + self.overwritten_opens
            + self.trailing_opens
            + self.orphan_closes
    }
}

impl AddAssign for Tally {
    fn add_assign(&mut self, rhs: Self) {
        self.manual += rhs.manual;
        self.auto += rhs.auto;
        self.unknown_type += rhs.unknown_type;
        self.overwritten_opens += rhs.overwritten_opens;
        self.trailing_opens += rhs.trailing_opens;
        self.orphan_closes += rhs.orphan_closes;
        self.out_of_order += rhs.out_of_order;
    }
}

/// Durations per category plus the tally that produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairingOutcome {
    /// Manual durations in milliseconds.
    pub manual: Vec<i64>,
    /// Auto durations in milliseconds.
    pub auto: Vec<i64>,
    pub tally: Tally,
}

impl PairingOutcome {
    pub fn manual_count(&self) -> usize {
        self.manual.len()
    }

    pub fn auto_count(&self) -> usize {
        self.auto.len()
    }

    pub fn durations(&self, category: Category) -> &[i64] {
        match category {
            Category::Manual => &self.manual,
            Category::Auto => &self.auto,
        }
    }

    fn merge(mut self, other: Self) -> Self {
        self.manual.extend(other.manual);
        self.auto.extend(other.auto);
        self.tally += other.tally;
        self
    }

    fn sort(&mut self) {
        self.manual.sort_unstable();
        self.auto.sort_unstable();
    }
}

/// Pairs one user's events, which must already be in chronological order.
///
/// Durations are returned in pairing order, not sorted.
pub fn pair_session(events: &[Event]) -> PairingOutcome {
    let mut machine = SessionMachine::new();
    let mut outcome = PairingOutcome::default();

    for event in events {
        let step = machine.step(event);
        outcome.tally.record(&step);
        match step {
            Step::Paired(pair) => match pair.category {
                Category::Manual => outcome.manual.push(pair.duration_ms),
                Category::Auto => outcome.auto.push(pair.duration_ms),
            },
            Step::OutOfOrder {
                opened_at,
                closed_at,
            } => {
                tracing::warn!(
                    user_id = event.user_id,
                    opened_at,
                    closed_at,
                    "close precedes its open, dropping pair"
                );
            }
            _ => {}
        }
    }

    if let Some(opened_at) = machine.finish() {
        tracing::trace!(opened_at, "dropping open left pending at end of session");
        outcome.tally.trailing_opens += 1;
    }

    outcome
}

/// Pairs every user's session and merges the results.
///
/// Both duration lists come back sorted ascending.
pub fn pair_events(loaded: &LoadedEvents) -> PairingOutcome {
    let sessions: Vec<&[Event]> = loaded.sessions().collect();

    let mut outcome = sessions
        .par_iter()
        .map(|session| pair_session(session))
        .reduce(PairingOutcome::default, PairingOutcome::merge);
    outcome.sort();

    tracing::debug!(tally = ?outcome.tally, users = sessions.len(), "paired events");
    outcome
}
