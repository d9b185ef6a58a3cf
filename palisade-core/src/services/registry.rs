//! Active-block bookkeeping.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{Error, block::Block, config::TrackerConfig, repositories::BlockRepository};

/// Registry of identity blocks.
///
/// Answers "is this identity currently blocked, and for how much longer"
/// and creates new blocks when the tracker reports a threshold trip.
/// Expired blocks are filtered at read time; the optional cleanup task only
/// reclaims storage.
pub struct BlockRegistry<R: BlockRepository> {
    repository: Arc<R>,
    config: TrackerConfig,
}

impl<R: BlockRepository> BlockRegistry<R> {
    pub fn new(repository: Arc<R>, config: TrackerConfig) -> Self {
        Self { repository, config }
    }

    /// The active block for `identity`, if any.
    ///
    /// With overlapping blocks the one expiring last is returned, so the
    /// identity stays reported as blocked for the union of the intervals.
    pub async fn active_block(
        &self,
        identity: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Block>, Error> {
        self.repository.get_active_block(identity, now).await
    }

    /// Whether `identity` is currently blocked (convenience method).
    pub async fn is_blocked(&self, identity: &str, now: DateTime<Utc>) -> Result<bool, Error> {
        Ok(self.active_block(identity, now).await?.is_some())
    }

    /// Create a new block lasting the configured block duration.
    pub async fn block(
        &self,
        identity: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Block, Error> {
        let blocked_until = now + self.config.block_duration;
        let block = self
            .repository
            .create_block(identity, blocked_until, reason, now)
            .await?;
        tracing::info!(
            identity,
            reason,
            blocked_until = %block.blocked_until,
            "identity blocked"
        );
        Ok(block)
    }

    /// Delete a block by id, active or not.
    ///
    /// # Returns
    ///
    /// `true` if a record existed, `false` for an unknown id.
    pub async fn unblock(&self, id: i64) -> Result<bool, Error> {
        let removed = self.repository.delete_block(id).await?;
        if removed {
            tracing::info!(block_id = id, "block removed");
        }
        Ok(removed)
    }

    /// All active blocks, most recent expiry first.
    pub async fn active_blocks(&self, now: DateTime<Utc>) -> Result<Vec<Block>, Error> {
        self.repository.list_active_blocks(now).await
    }

    /// Start the background cleanup task.
    ///
    /// Spawns a task that periodically deletes expired block rows. This is
    /// storage housekeeping only; block enforcement does not depend on it.
    ///
    /// # Arguments
    ///
    /// * `shutdown` - A watch receiver that signals when to stop the task
    pub fn start_cleanup_task(
        &self,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        let repository = Arc::clone(&self.repository);

        const CLEANUP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(3600);

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(CLEANUP_INTERVAL);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        match repository.cleanup_expired(Utc::now()).await {
                            Ok(count) if count > 0 => {
                                tracing::info!(count, "Cleaned up expired block records");
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "Failed to cleanup expired block records");
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown.changed() => {
                        tracing::info!("Shutting down block cleanup task");
                        break;
                    }
                }
            }
        })
    }
}
