//! Service layer for business logic
//!
//! This module contains the two services that make up the mitigation core:
//! [`AttemptTracker`] for sliding-window failure counting and
//! [`BlockRegistry`] for active-block bookkeeping.

pub mod registry;
pub mod tracker;

pub use registry::BlockRegistry;
pub use tracker::{AttemptTracker, Evaluation};
