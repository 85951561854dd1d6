//! Incremental project-model build cache with a priority build scheduler.
//!
//! The cache keeps one entry per manifest document, keyed by normalized
//! identity, and rebuilds only when the document's edit version moves past
//! the last version a build was attempted against. Builds run asynchronously
//! on a bounded scheduler that deduplicates per `(identity, version)` key,
//! orders work by bumpable priority, and shares one outcome among all
//! concurrent requesters.
//!
//! Entry points:
//!
//! - [`ProjectCache`] — versioned cache: `get_or_build`, `snapshot`,
//!   `problems`, `projects`.
//! - [`BuildScheduler`] / [`BuildHandle`] — direct access to the queue for
//!   hosts that manage their own snapshots.
//! - [`CacheConfig`] — worker bound and scheduling policy toggles.

pub mod cache;
pub mod config;
pub mod error;
mod execute;
pub mod scheduler;

pub use cache::ProjectCache;
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use scheduler::{BuildHandle, BuildScheduler};
