//! SQLite implementations of the palisade repository traits.

pub mod attempt;
pub mod block;

pub use attempt::SqliteAttemptRepository;
pub use block::SqliteBlockRepository;
