//! Generic in-memory cache for optimistic synchronization.
//!
//! This module is backend-agnostic:
//! - Holds one ordered collection of entities keyed by identity
//! - Supports speculative writes with whole-collection snapshot/restore
//! - Tracks revisions for memoized views and generations for stale results

mod handle;
mod store;
mod traits;

pub use handle::StoreHandle;
pub use store::{CacheStore, Snapshot};
pub use traits::Cacheable;
