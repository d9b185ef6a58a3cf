//! Repository trait for the attempt audit trail.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    Error,
    attempt::{AttemptOutcome, AttemptRecord, TrackerState},
};

/// Append-only store of authentication attempts.
///
/// Rows are written once and never updated or deleted; the audit trail is
/// the historical record, not the source of truth for the live failure
/// window. Identity strings are stored as opaque values without validation.
#[async_trait]
pub trait AttemptRepository: Send + Sync + 'static {
    /// Append one attempt to the audit trail.
    ///
    /// # Returns
    ///
    /// The created [`AttemptRecord`] with its assigned id.
    async fn record_attempt(
        &self,
        identity: &str,
        outcome: AttemptOutcome,
        state: TrackerState,
        at: DateTime<Utc>,
    ) -> Result<AttemptRecord, Error>;

    /// Fetch up to `limit` attempts, most recent first.
    async fn list_recent(&self, limit: u32) -> Result<Vec<AttemptRecord>, Error>;
}
