//! Configuration for attempt tracking and blocking.

use chrono::Duration;
use serde::{Deserialize, Deserializer};

/// Tunable parameters for the failure tracker and block registry.
///
/// Pass this explicitly at construction time rather than reading ambient
/// globals, so tests can vary the parameters per case.
///
/// Durations deserialize from whole seconds, e.g.
/// `{ "threshold": 3, "window": 60, "block_duration": 300 }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// When false, evaluation is a pass-through and nothing is recorded.
    pub enabled: bool,
    /// Failures within the window needed (inclusive) to trigger a block.
    pub threshold: u32,
    /// Width of the sliding window failures are counted over.
    #[serde(deserialize_with = "duration_seconds")]
    pub window: Duration,
    /// How long a newly created block lasts.
    #[serde(deserialize_with = "duration_seconds")]
    pub block_duration: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 3,
            window: Duration::seconds(60),
            block_duration: Duration::seconds(300),
        }
    }
}

impl TrackerConfig {
    /// A configuration with tracking turned off entirely.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

fn duration_seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = i64::deserialize(deserializer)?;
    Ok(Duration::seconds(seconds))
}
