//! # Palisade
//!
//! Palisade is a login brute-force mitigation library. It tracks failed
//! authentication attempts per identity (typically a client address) inside
//! a sliding time window and temporarily blocks an identity once failures
//! exceed a threshold. The caller performs the actual credential check;
//! palisade decides whether the attempt should have been allowed at all and
//! keeps the audit trail.
//!
//! The flow for each attempt:
//!
//! 1. The block registry is consulted first. An active block rejects the
//!    attempt outright; the tracker is never touched.
//! 2. Otherwise the attempt is evaluated against the identity's sliding
//!    failure window. A success resets the window; a failure advances the
//!    symbolic state `S1`, `S2`, ... until the threshold trips and a block
//!    is created.
//!
//! ## Example
//!
//! ```rust,no_run
//! use palisade::{AttemptDecision, Palisade};
//! use palisade_storage_sqlite::SqliteRepositoryProvider;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let repositories = Arc::new(
//!         SqliteRepositoryProvider::connect("sqlite::memory:").await.unwrap(),
//!     );
//!     let palisade = Palisade::new(repositories);
//!     palisade.migrate().await.unwrap();
//!
//!     let password_ok = false; // caller's credential check
//!     match palisade.check_and_record_attempt("10.0.0.1", password_ok).await.unwrap() {
//!         AttemptDecision::Rejected { block } => {
//!             println!("blocked, retry in {}s", block.remaining_seconds(chrono::Utc::now()));
//!         }
//!         AttemptDecision::Evaluated { state, new_block, .. } => {
//!             println!("state {state}, new block: {}", new_block.is_some());
//!         }
//!     }
//! }
//! ```

use std::sync::Arc;

use chrono::Utc;
use palisade_core::{
    repositories::{AttemptRepositoryAdapter, BlockRepositoryAdapter, RepositoryProvider},
    services::{AttemptTracker, BlockRegistry},
};

/// Re-export core types from palisade_core
///
/// These types are commonly used when working with the Palisade API.
pub use palisade_core::{AttemptOutcome, AttemptRecord, Block, TrackerConfig, TrackerState};

/// Re-export storage backends
///
/// These storage implementations are available when the corresponding feature is enabled.
#[cfg(feature = "sqlite")]
pub use palisade_storage_sqlite::SqliteRepositoryProvider;

/// Reason recorded on blocks created by threshold trips.
const BLOCK_REASON: &str = "threshold_exceeded";

/// Errors that can occur when using Palisade.
#[derive(Debug, thiserror::Error)]
pub enum PalisadeError {
    /// Error when interacting with storage
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Decision for one authentication attempt.
#[derive(Debug, Clone)]
pub enum AttemptDecision {
    /// An active block was in force; the attempt was rejected without
    /// touching the failure window.
    Rejected { block: Block },
    /// The attempt was evaluated against the failure window.
    Evaluated {
        outcome: AttemptOutcome,
        state: TrackerState,
        /// The block created by this attempt, when it tripped the threshold.
        new_block: Option<Block>,
    },
}

impl AttemptDecision {
    pub fn is_rejected(&self) -> bool {
        matches!(self, AttemptDecision::Rejected { .. })
    }

    /// The block created by this attempt, if it tripped the threshold.
    pub fn new_block(&self) -> Option<&Block> {
        match self {
            AttemptDecision::Evaluated { new_block, .. } => new_block.as_ref(),
            AttemptDecision::Rejected { .. } => None,
        }
    }

    /// Seconds until the identity may try again, when a block applies.
    pub fn retry_after_seconds(&self) -> Option<i64> {
        let now = Utc::now();
        match self {
            AttemptDecision::Rejected { block } => Some(block.remaining_seconds(now)),
            AttemptDecision::Evaluated {
                new_block: Some(block),
                ..
            } => Some(block.remaining_seconds(now)),
            AttemptDecision::Evaluated { .. } => None,
        }
    }
}

/// The main entry point for login throttling.
///
/// `Palisade` wires the attempt tracker and block registry to a repository
/// provider and exposes the operations the authentication layer calls.
pub struct Palisade<R: RepositoryProvider> {
    repositories: Arc<R>,
    tracker: AttemptTracker<AttemptRepositoryAdapter<R>>,
    registry: BlockRegistry<BlockRepositoryAdapter<R>>,
}

impl<R: RepositoryProvider> Palisade<R> {
    /// Create a new instance with the default configuration
    /// (3 failures / 60s window / 300s block).
    pub fn new(repositories: Arc<R>) -> Self {
        Self::with_config(repositories, TrackerConfig::default())
    }

    /// Create a new instance with an explicit configuration.
    pub fn with_config(repositories: Arc<R>, config: TrackerConfig) -> Self {
        let attempts = Arc::new(AttemptRepositoryAdapter::new(repositories.clone()));
        let blocks = Arc::new(BlockRepositoryAdapter::new(repositories.clone()));
        Self {
            tracker: AttemptTracker::new(attempts, config.clone()),
            registry: BlockRegistry::new(blocks, config),
            repositories,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &TrackerConfig {
        self.tracker.config()
    }

    /// Run storage migrations.
    pub async fn migrate(&self) -> Result<(), PalisadeError> {
        self.repositories
            .migrate()
            .await
            .map_err(|e| PalisadeError::Storage(e.to_string()))
    }

    /// Check storage connectivity.
    pub async fn health_check(&self) -> Result<(), PalisadeError> {
        self.repositories
            .health_check()
            .await
            .map_err(|e| PalisadeError::Storage(e.to_string()))
    }

    /// Record one authentication attempt and decide its fate.
    ///
    /// `success` is the result of the caller's own credential check. If the
    /// identity is currently blocked the attempt is rejected and only a
    /// `BLOCKED_TRY` audit row is written; the credential result is ignored.
    /// Otherwise the attempt is evaluated, and a threshold trip creates a
    /// new block before returning.
    pub async fn check_and_record_attempt(
        &self,
        identity: &str,
        success: bool,
    ) -> Result<AttemptDecision, PalisadeError> {
        let now = Utc::now();

        if let Some(block) = self
            .registry
            .active_block(identity, now)
            .await
            .map_err(|e| PalisadeError::Storage(e.to_string()))?
        {
            self.tracker
                .record_rejected(identity, now)
                .await
                .map_err(|e| PalisadeError::Storage(e.to_string()))?;
            return Ok(AttemptDecision::Rejected { block });
        }

        let evaluation = self
            .tracker
            .evaluate(identity, success, now)
            .await
            .map_err(|e| PalisadeError::Storage(e.to_string()))?;

        let new_block = if evaluation.triggered_block {
            Some(
                self.registry
                    .block(identity, BLOCK_REASON, now)
                    .await
                    .map_err(|e| PalisadeError::Storage(e.to_string()))?,
            )
        } else {
            None
        };

        Ok(AttemptDecision::Evaluated {
            outcome: evaluation.outcome,
            state: evaluation.state,
            new_block,
        })
    }

    /// Fetch up to `limit` audit records, most recent first.
    pub async fn recent_attempts(&self, limit: u32) -> Result<Vec<AttemptRecord>, PalisadeError> {
        self.tracker
            .recent_attempts(limit)
            .await
            .map_err(|e| PalisadeError::Storage(e.to_string()))
    }

    /// All currently active blocks, most recent expiry first.
    pub async fn active_blocks(&self) -> Result<Vec<Block>, PalisadeError> {
        self.registry
            .active_blocks(Utc::now())
            .await
            .map_err(|e| PalisadeError::Storage(e.to_string()))
    }

    /// Remove a block by id, active or not.
    ///
    /// Returns whether a record existed; no effect on the audit trail.
    pub async fn remove_block(&self, id: i64) -> Result<bool, PalisadeError> {
        self.registry
            .unblock(id)
            .await
            .map_err(|e| PalisadeError::Storage(e.to_string()))
    }

    /// Start the periodic housekeeping tasks.
    ///
    /// One task deletes expired block rows, another reclaims in-memory
    /// failure windows for identities that stopped attempting. Optional;
    /// enforcement filters expired blocks at read time regardless, and
    /// counting prunes each window it touches.
    pub fn start_cleanup_task(
        &self,
        shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        let blocks = self.registry.start_cleanup_task(shutdown.clone());
        let windows = self.tracker.start_cleanup_task(shutdown);
        tokio::spawn(async move {
            let _ = tokio::join!(blocks, windows);
        })
    }
}
