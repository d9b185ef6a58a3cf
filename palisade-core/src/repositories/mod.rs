//! Repository traits for the data access layer
//!
//! Services interact with storage exclusively through these traits, so a
//! backend only has to implement two small interfaces plus lifecycle hooks.
//!
//! # Trait Hierarchy
//!
//! - Individual `*Repository` traits define the operations for each data
//!   domain (the attempt audit trail and the block table).
//! - Individual `*RepositoryProvider` traits provide access to each
//!   repository type.
//! - [`RepositoryProvider`] is a supertrait combining the provider traits
//!   plus migration and health-check lifecycle methods.

pub mod adapter;
pub mod attempt;
pub mod block;

pub use adapter::{AttemptRepositoryAdapter, BlockRepositoryAdapter};
pub use attempt::AttemptRepository;
pub use block::BlockRepository;

use async_trait::async_trait;

use crate::Error;

/// Provider trait for attempt audit trail access.
pub trait AttemptRepositoryProvider: Send + Sync + 'static {
    /// The attempt repository implementation type
    type AttemptRepo: AttemptRepository;

    /// Get the attempt repository
    fn attempts(&self) -> &Self::AttemptRepo;
}

/// Provider trait for block record access.
pub trait BlockRepositoryProvider: Send + Sync + 'static {
    /// The block repository implementation type
    type BlockRepo: BlockRepository;

    /// Get the block repository
    fn blocks(&self) -> &Self::BlockRepo;
}

/// Provider trait that storage implementations must implement to provide all
/// repositories, plus lifecycle methods for migrations and health checks.
#[async_trait]
pub trait RepositoryProvider: AttemptRepositoryProvider + BlockRepositoryProvider {
    /// Run migrations for all repositories
    async fn migrate(&self) -> Result<(), Error>;

    /// Health check for all repositories
    async fn health_check(&self) -> Result<(), Error>;
}
