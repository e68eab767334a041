use thiserror::Error;

use crate::todo::error::ApiError;
use crate::todo::validate::ValidationError;

use super::mutation::MutationKind;

#[derive(Debug, Error)]
pub enum SyncError {
  /// Rejected before any speculative write or request
  #[error("Invalid input: {0}")]
  Validation(#[from] ValidationError),

  /// A single request failed; any speculative change was rolled back
  #[error(transparent)]
  Api(#[from] ApiError),

  /// A bulk operation failed part-way; the cache was rolled back, but the
  /// first `applied` requests already took effect on the server
  #[error("{kind} stopped after {applied} of {total} requests: {source}")]
  Bulk {
    kind: MutationKind,
    applied: usize,
    total: usize,
    #[source]
    source: ApiError,
  },
}

pub type SyncResult<T> = Result<T, SyncError>;

impl SyncError {
  /// Short text for user-facing notifications.
  pub fn user_message(&self) -> String {
    match self {
      SyncError::Validation(e) => e.to_string(),
      SyncError::Api(e) => e.user_message(),
      SyncError::Bulk {
        kind,
        applied,
        total,
        source,
      } => format!(
        "{} failed after {} of {} tasks: {}",
        kind,
        applied,
        total,
        source.user_message()
      ),
    }
  }
}
