//! Block records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A temporary block on an identity.
///
/// Blocks are insert-and-delete only: once created the fields never change,
/// and the only mutation is removal by an explicit unblock. A block is active
/// while `now < blocked_until`; expired rows are simply ignored by queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: i64,
    pub identity: String,
    pub blocked_until: DateTime<Utc>,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl Block {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.blocked_until
    }

    /// Whole seconds until expiry, floored at zero.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.blocked_until - now).num_seconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn block_until(blocked_until: DateTime<Utc>) -> Block {
        Block {
            id: 1,
            identity: "10.0.0.1".to_string(),
            blocked_until,
            reason: "threshold_exceeded".to_string(),
            created_at: blocked_until - Duration::seconds(300),
        }
    }

    #[test]
    fn test_active_until_expiry_instant() {
        let now = Utc::now();
        let block = block_until(now + Duration::seconds(10));

        assert!(block.is_active(now));
        assert!(block.is_active(now + Duration::seconds(9)));
        // Exactly at blocked_until the block is no longer active.
        assert!(!block.is_active(now + Duration::seconds(10)));
        assert!(!block.is_active(now + Duration::seconds(11)));
    }

    #[test]
    fn test_remaining_seconds() {
        let now = Utc::now();
        let block = block_until(now + Duration::seconds(297));

        assert_eq!(block.remaining_seconds(now), 297);
        assert_eq!(block.remaining_seconds(now + Duration::seconds(500)), 0);
    }
}
