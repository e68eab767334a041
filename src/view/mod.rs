//! Read-only projections of the task cache.

mod filters;
mod memo;
pub mod selectors;

pub use filters::{FilterMode, Filters};
pub use memo::TodoView;
