//! Task domain: wire and domain types, the entity mapper, and the HTTP client.

pub mod api_types;
mod cache;
pub mod client;
pub mod error;
pub mod types;
pub mod validate;

pub use client::{BackendVariant, HttpTaskApi, TaskApi};
pub use error::ApiError;
pub use types::{CreateTodo, DeleteConfirmation, Priority, Todo, UpdateTodo};
