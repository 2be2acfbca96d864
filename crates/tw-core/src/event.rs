//! Tool window events as they appear in the usage log.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Whether the tool window became visible or hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Opened,
    Closed,
}

impl EventKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "opened" => Ok(Self::Opened),
            "closed" => Ok(Self::Closed),
            _ => Err(UnknownEventKind(s.to_string())),
        }
    }
}

/// Error type for event kind strings other than `opened`/`closed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventKind(String);

impl fmt::Display for UnknownEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event kind: {}", self.0)
    }
}

impl std::error::Error for UnknownEventKind {}

/// Why the tool window was opened.
///
/// Anything other than `manual` or `auto` parses to [`OpenType::Unknown`].
/// Unknown opens still take part in pairing but their durations are
/// discarded instead of being assigned to a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenType {
    /// Opened by the user.
    Manual,
    /// Opened by the IDE.
    Auto,
    Unknown,
}

impl OpenType {
    /// Parses an open type, mapping unrecognised values to `Unknown`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "manual" => Self::Manual,
            "auto" => Self::Auto,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Auto => "auto",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OpenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single row of the usage log after validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Milliseconds on the logging clock.
    pub timestamp: i64,
    pub kind: EventKind,
    /// Only meaningful for [`EventKind::Opened`].
    pub open_type: OpenType,
    pub user_id: i64,
    /// 1-based line in the input the event was read from.
    pub line: u64,
    /// The open type text as written in the input, kept for diagnostics.
    #[serde(skip)]
    pub raw_open_type: String,
}

impl Event {
    /// Builds an event, deriving the raw open type text from `open_type`.
    #[must_use]
    pub fn new(timestamp: i64, kind: EventKind, open_type: OpenType, user_id: i64) -> Self {
        Self {
            timestamp,
            kind,
            open_type,
            user_id,
            line: 0,
            raw_open_type: open_type.as_str().to_string(),
        }
    }

    pub fn opened(timestamp: i64, open_type: OpenType, user_id: i64) -> Self {
        Self::new(timestamp, EventKind::Opened, open_type, user_id)
    }

    pub fn closed(timestamp: i64, user_id: i64) -> Self {
        Self {
            raw_open_type: String::new(),
            ..Self::new(timestamp, EventKind::Closed, OpenType::Unknown, user_id)
        }
    }
}
