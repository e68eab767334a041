//! Optimistic task-list cache kept in sync with a remote tasks API.
//!
//! Mutations are applied to the local [`cache`] immediately and settled
//! against the server by the [`sync`] coordinator, which restores a snapshot
//! when the server rejects a change.

pub mod cache;
pub mod config;
pub mod event;
pub mod logging;
pub mod render;
pub mod sync;
pub mod todo;
pub mod view;
