//! Sliding failure window.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

/// Ordered failure timestamps bounded to the trailing window width.
///
/// Timestamps are pushed in evaluation order, so the oldest entry is always
/// at the front and pruning only ever pops from there. An entry exactly one
/// window old still counts; anything strictly older is dropped.
#[derive(Debug, Clone, Default)]
pub struct FailureWindow {
    timestamps: VecDeque<DateTime<Utc>>,
}

impl FailureWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop entries older than `window` as seen from `now`.
    pub fn prune(&mut self, window: Duration, now: DateTime<Utc>) {
        while let Some(first) = self.timestamps.front() {
            if now - *first > window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn record(&mut self, at: DateTime<Utc>) {
        self.timestamps.push_back(at);
    }

    pub fn clear(&mut self) {
        self.timestamps.clear();
    }

    pub fn len(&self) -> u32 {
        self.timestamps.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    #[test]
    fn test_prune_drops_stale_entries() {
        let mut window = FailureWindow::new();
        window.record(at(0));
        window.record(at(70));
        window.record(at(71));

        window.prune(Duration::seconds(60), at(71));
        // Only t=70 and t=71 are within 60s of t=71.
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn test_entry_exactly_window_old_still_counts() {
        let mut window = FailureWindow::new();
        window.record(at(0));

        window.prune(Duration::seconds(60), at(60));
        assert_eq!(window.len(), 1);

        window.prune(Duration::seconds(60), at(61));
        assert!(window.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut window = FailureWindow::new();
        window.record(at(1));
        window.record(at(2));
        window.clear();
        assert!(window.is_empty());
    }
}
