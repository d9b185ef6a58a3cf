//! Attempt audit trail model.
//!
//! Every authentication attempt that passes through palisade leaves exactly
//! one [`AttemptRecord`] behind (the attempt that trips the threshold leaves
//! two: one for the failure itself, one marking the block event). Records are
//! append-only and never mutated or deleted.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Outcome of a single authentication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptOutcome {
    /// Credentials were accepted.
    Success,
    /// Credentials were rejected; the failure window grew by one.
    Failed,
    /// An active block was in force, so the attempt never reached the tracker.
    BlockedTry,
    /// Marker for the failure that pushed an identity over the threshold.
    Blocked,
}

impl AttemptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Success => "SUCCESS",
            AttemptOutcome::Failed => "FAILED",
            AttemptOutcome::BlockedTry => "BLOCKED_TRY",
            AttemptOutcome::Blocked => "BLOCKED",
        }
    }

    /// Parse the stored string form back into a variant.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "SUCCESS" => Some(AttemptOutcome::Success),
            "FAILED" => Some(AttemptOutcome::Failed),
            "BLOCKED_TRY" => Some(AttemptOutcome::BlockedTry),
            "BLOCKED" => Some(AttemptOutcome::Blocked),
            _ => None,
        }
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Symbolic state of an identity's failure counter.
///
/// Rendered as `"S0"`, `"S1"`, ... for [`TrackerState::Counting`] and
/// `"BLOCKED"` for [`TrackerState::Blocked`]. `Counting(n)` carries the
/// number of failures inside the current window, so the progression for a
/// threshold of 3 reads `S0 -> S1 -> S2 -> BLOCKED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Counting(u32),
    Blocked,
}

impl TrackerState {
    /// Parse the stored string form (`"S{n}"` or `"BLOCKED"`).
    pub fn parse(value: &str) -> Option<Self> {
        if value == "BLOCKED" {
            return Some(TrackerState::Blocked);
        }
        value
            .strip_prefix('S')
            .and_then(|n| n.parse().ok())
            .map(TrackerState::Counting)
    }
}

impl fmt::Display for TrackerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerState::Counting(n) => write!(f, "S{n}"),
            TrackerState::Blocked => f.write_str("BLOCKED"),
        }
    }
}

impl Serialize for TrackerState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TrackerState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        TrackerState::parse(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid tracker state: {value}")))
    }
}

/// One row of the attempt audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub id: i64,
    /// Opaque key identifying the attempt source, typically a client address.
    pub identity: String,
    pub outcome: AttemptOutcome,
    pub state: TrackerState,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_roundtrip() {
        for outcome in [
            AttemptOutcome::Success,
            AttemptOutcome::Failed,
            AttemptOutcome::BlockedTry,
            AttemptOutcome::Blocked,
        ] {
            assert_eq!(AttemptOutcome::parse(outcome.as_str()), Some(outcome));
        }
        assert_eq!(AttemptOutcome::parse("GARBAGE"), None);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(TrackerState::Counting(0).to_string(), "S0");
        assert_eq!(TrackerState::Counting(2).to_string(), "S2");
        assert_eq!(TrackerState::Blocked.to_string(), "BLOCKED");
    }

    #[test]
    fn test_state_parse() {
        assert_eq!(TrackerState::parse("S0"), Some(TrackerState::Counting(0)));
        assert_eq!(TrackerState::parse("S12"), Some(TrackerState::Counting(12)));
        assert_eq!(TrackerState::parse("BLOCKED"), Some(TrackerState::Blocked));
        assert_eq!(TrackerState::parse("S"), None);
        assert_eq!(TrackerState::parse("blocked"), None);
    }

    #[test]
    fn test_state_serde_as_string() {
        let json = serde_json::to_string(&TrackerState::Counting(2)).unwrap();
        assert_eq!(json, "\"S2\"");
        let state: TrackerState = serde_json::from_str("\"BLOCKED\"").unwrap();
        assert_eq!(state, TrackerState::Blocked);
    }
}
