//! Local validation, applied before any speculative write or request.

use std::collections::HashSet;

use super::types::{CreateTodo, UpdateTodo};

pub const MAX_TEXT_LEN: usize = 500;
pub const MAX_TAG_LEN: usize = 20;

/// Reason a create or update was rejected locally
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
  #[error("Todo text is required")]
  EmptyText,
  #[error("Todo text must be less than 500 characters")]
  TextTooLong,
  #[error("Tag must be less than 20 characters: {0}")]
  TagTooLong(String),
  #[error("Tag can only contain letters, numbers, hyphens, and underscores: {0}")]
  InvalidTag(String),
  #[error("Tag already exists: {0}")]
  DuplicateTag(String),
  #[error("Nothing to update")]
  NoChanges,
  #[error("Task {0} is still being created")]
  PendingCreate(String),
}

/// Reject ids of speculative creates still waiting for their server id.
///
/// Server ids are opaque, so only ids in `pending` are refused.
pub fn persisted_id(id: &str, pending: &HashSet<String>) -> Result<(), ValidationError> {
  if pending.contains(id) {
    return Err(ValidationError::PendingCreate(id.to_string()));
  }
  Ok(())
}

/// Trim and check a create request.
pub fn create(input: CreateTodo) -> Result<CreateTodo, ValidationError> {
  Ok(CreateTodo {
    text: text(&input.text)?,
    priority: input.priority,
    tags: tags(input.tags)?,
  })
}

/// Trim and check an update request. At least one field must be present.
pub fn update(input: UpdateTodo) -> Result<UpdateTodo, ValidationError> {
  if input.is_empty() {
    return Err(ValidationError::NoChanges);
  }

  Ok(UpdateTodo {
    text: input.text.as_deref().map(text).transpose()?,
    tags: input.tags.map(tags).transpose()?,
    ..input
  })
}

fn text(raw: &str) -> Result<String, ValidationError> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Err(ValidationError::EmptyText);
  }
  if trimmed.chars().count() > MAX_TEXT_LEN {
    return Err(ValidationError::TextTooLong);
  }
  Ok(trimmed.to_string())
}

/// Trim tags, drop empty ones, and reject malformed or repeated tags.
fn tags(raw: Vec<String>) -> Result<Vec<String>, ValidationError> {
  let mut result: Vec<String> = Vec::with_capacity(raw.len());
  for tag in raw {
    let tag = tag.trim();
    if tag.is_empty() {
      continue;
    }
    if tag.chars().count() > MAX_TAG_LEN {
      return Err(ValidationError::TagTooLong(tag.to_string()));
    }
    if !tag
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
      return Err(ValidationError::InvalidTag(tag.to_string()));
    }
    if result.iter().any(|t| t == tag) {
      return Err(ValidationError::DuplicateTag(tag.to_string()));
    }
    result.push(tag.to_string());
  }
  Ok(result)
}
