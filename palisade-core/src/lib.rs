//! Core functionality for the palisade project
//!
//! This crate contains the domain model, repository traits, and services for
//! tracking failed authentication attempts and blocking abusive identities.
//!
//! The two central pieces are [`services::AttemptTracker`], which classifies
//! each attempt against a sliding failure window, and
//! [`services::BlockRegistry`], which answers whether an identity is
//! currently blocked and for how much longer.
//!
//! Storage backends implement the traits in [`repositories`] and expose them
//! through a [`repositories::RepositoryProvider`].

pub mod attempt;
pub mod block;
pub mod config;
pub mod error;
pub mod repositories;
pub mod services;
pub mod window;

pub use attempt::{AttemptOutcome, AttemptRecord, TrackerState};
pub use block::Block;
pub use config::TrackerConfig;
pub use error::Error;
