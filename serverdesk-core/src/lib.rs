//! Serverdesk Core - shared data structures, storage backends and logging
//!
//! The web crate builds its settings pages and authorization gate on top of
//! the types and the [`Storage`] trait defined here.

pub mod error;
pub mod logging;
pub mod storage;
pub mod types;

pub use error::*;
pub use logging::*;
pub use storage::*;
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
