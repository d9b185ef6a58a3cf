//! Sliding-window failure tracker.
//!
//! This module classifies each authentication attempt into a symbolic state
//! and decides whether it pushes an identity over the failure threshold.
//!
//! # Window semantics
//!
//! The live failure window is an explicit in-process state map: one
//! [`FailureWindow`] per identity, created on the first failure and evicted
//! when the window resets (successful login or threshold trip) or when all
//! of its failures age out, swept by [`AttemptTracker::prune_stale`] and the
//! background cleanup task. The audit trail written through the repository
//! is historical only and is never read back to derive counts.
//!
//! # Example
//!
//! ```rust,ignore
//! use palisade_core::services::AttemptTracker;
//! use palisade_core::TrackerConfig;
//!
//! let tracker = AttemptTracker::new(repository, TrackerConfig::default());
//!
//! let evaluation = tracker.evaluate("10.0.0.1", false, Utc::now()).await?;
//! if evaluation.triggered_block {
//!     // Tell the block registry to create a block for this identity.
//! }
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::{
    Error,
    attempt::{AttemptOutcome, AttemptRecord, TrackerState},
    config::TrackerConfig,
    repositories::AttemptRepository,
    window::FailureWindow,
};

/// Result of evaluating a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub outcome: AttemptOutcome,
    pub state: TrackerState,
    /// Failures inside the window counting this attempt.
    pub failures: u32,
    /// Whether this attempt reached the threshold and a block must be created.
    pub triggered_block: bool,
}

impl Evaluation {
    fn success() -> Self {
        Self {
            outcome: AttemptOutcome::Success,
            state: TrackerState::Counting(0),
            failures: 0,
            triggered_block: false,
        }
    }

    fn failed(failures: u32) -> Self {
        Self {
            outcome: AttemptOutcome::Failed,
            state: TrackerState::Counting(failures),
            failures,
            triggered_block: false,
        }
    }

    fn blocked(failures: u32) -> Self {
        Self {
            outcome: AttemptOutcome::Blocked,
            state: TrackerState::Blocked,
            failures,
            triggered_block: true,
        }
    }
}

/// Per-identity sliding-window failure counter.
///
/// # Thread Safety
///
/// The service is thread-safe and can be shared across tasks. Attempts for
/// the same identity are serialized by the state map's per-key locking, so
/// two concurrent failures can never both observe the count one below the
/// threshold. Attempts for different identities never contend.
pub struct AttemptTracker<R: AttemptRepository> {
    repository: Arc<R>,
    config: TrackerConfig,
    windows: Arc<DashMap<String, FailureWindow>>,
}

impl<R: AttemptRepository> AttemptTracker<R> {
    pub fn new(repository: Arc<R>, config: TrackerConfig) -> Self {
        Self {
            repository,
            config,
            windows: Arc::new(DashMap::new()),
        }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Evaluate one attempt for an identity that is not currently blocked.
    ///
    /// The caller must have checked the block registry first; attempts made
    /// while a block is active go through [`record_rejected`] instead and
    /// never touch the window.
    ///
    /// A successful attempt resets the window to empty. A failed attempt
    /// with `n = k + 1` windowed failures yields state `S{n}` below the
    /// threshold, or trips the threshold at `n >= threshold`, in which case
    /// the window is also reset and the caller is expected to create the
    /// block.
    ///
    /// Appends one audit record per call, plus a second `BLOCKED` marker
    /// record on the attempt that trips the threshold.
    ///
    /// [`record_rejected`]: AttemptTracker::record_rejected
    pub async fn evaluate(
        &self,
        identity: &str,
        success: bool,
        now: DateTime<Utc>,
    ) -> Result<Evaluation, Error> {
        if !self.config.enabled {
            return Ok(if success {
                Evaluation::success()
            } else {
                Evaluation::failed(0)
            });
        }

        let evaluation = self.decide(identity, success, now);

        // Audit append happens after the decision, outside the map lock.
        let (outcome, state) = if success {
            (AttemptOutcome::Success, TrackerState::Counting(0))
        } else {
            // The triggering failure is still logged as FAILED with its
            // numbered state; the block event gets its own marker row.
            (
                AttemptOutcome::Failed,
                TrackerState::Counting(evaluation.failures),
            )
        };
        self.repository
            .record_attempt(identity, outcome, state, now)
            .await?;

        if evaluation.triggered_block {
            self.repository
                .record_attempt(identity, AttemptOutcome::Blocked, TrackerState::Blocked, now)
                .await?;
            tracing::info!(
                identity,
                failures = evaluation.failures,
                "failure threshold reached"
            );
        } else {
            tracing::debug!(identity, state = %evaluation.state, "attempt evaluated");
        }

        Ok(evaluation)
    }

    /// Record an attempt rejected upstream because a block was active.
    pub async fn record_rejected(
        &self,
        identity: &str,
        now: DateTime<Utc>,
    ) -> Result<AttemptRecord, Error> {
        self.repository
            .record_attempt(
                identity,
                AttemptOutcome::BlockedTry,
                TrackerState::Blocked,
                now,
            )
            .await
    }

    /// Fetch up to `limit` audit records, most recent first.
    pub async fn recent_attempts(&self, limit: u32) -> Result<Vec<AttemptRecord>, Error> {
        self.repository.list_recent(limit).await
    }

    /// Number of identities with a live (non-empty) failure window.
    pub fn tracked_identities(&self) -> usize {
        self.windows.len()
    }

    /// Drop windows whose failures have all aged out of the trailing window.
    ///
    /// `decide` only evicts an identity's entry on a reset, so an identity
    /// that fails a few times and never returns would pin its entry forever.
    /// Identity cardinality is attacker-controlled, so those entries must be
    /// reclaimed. Returns the number of entries dropped.
    pub fn prune_stale(&self, now: DateTime<Utc>) -> usize {
        sweep_stale(&self.windows, self.config.window, now)
    }

    /// Start the background sweep of stale failure windows.
    ///
    /// Spawns a task that runs [`prune_stale`] once per window length. This
    /// bounds the map to identities seen within roughly one window; counting
    /// itself stays correct without it, since `decide` prunes the window it
    /// touches on every attempt.
    ///
    /// # Arguments
    ///
    /// * `shutdown` - A watch receiver that signals when to stop the task
    ///
    /// [`prune_stale`]: AttemptTracker::prune_stale
    pub fn start_cleanup_task(
        &self,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        let windows = Arc::clone(&self.windows);
        let width = self.config.window;
        let sweep_interval = width
            .to_std()
            .unwrap_or_default()
            .max(std::time::Duration::from_secs(1));

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(sweep_interval);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let evicted = sweep_stale(&windows, width, Utc::now());
                        if evicted > 0 {
                            tracing::debug!(evicted, "Reclaimed stale failure windows");
                        }
                    }
                    _ = shutdown.changed() => {
                        tracing::info!("Shutting down failure window sweep task");
                        break;
                    }
                }
            }
        })
    }

    // The read-modify-write on the window happens entirely under the entry
    // guard; the guard is never held across an await.
    fn decide(&self, identity: &str, success: bool, now: DateTime<Utc>) -> Evaluation {
        match self.windows.entry(identity.to_string()) {
            Entry::Occupied(mut occupied) => {
                if success {
                    occupied.remove();
                    return Evaluation::success();
                }
                let window = occupied.get_mut();
                window.prune(self.config.window, now);
                window.record(now);
                let failures = window.len();
                if failures < self.config.threshold {
                    Evaluation::failed(failures)
                } else {
                    occupied.remove();
                    Evaluation::blocked(failures)
                }
            }
            Entry::Vacant(vacant) => {
                if success {
                    Evaluation::success()
                } else if self.config.threshold <= 1 {
                    Evaluation::blocked(1)
                } else {
                    let mut window = FailureWindow::new();
                    window.record(now);
                    vacant.insert(window);
                    Evaluation::failed(1)
                }
            }
        }
    }
}

// Shared by `prune_stale` and the background sweep task.
fn sweep_stale(
    windows: &DashMap<String, FailureWindow>,
    width: chrono::Duration,
    now: DateTime<Utc>,
) -> usize {
    let before = windows.len();
    windows.retain(|_, window| {
        window.prune(width, now);
        !window.is_empty()
    });
    before.saturating_sub(windows.len())
}
