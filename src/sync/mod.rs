//! Optimistic synchronization of the task cache with the server.

mod coordinator;
mod error;
#[cfg(test)]
mod fake;
mod mutation;

pub use coordinator::{BulkOutcome, MutationCoordinator};
pub use error::{SyncError, SyncResult};
pub use mutation::{Mutation, MutationKind, MutationPhase};
