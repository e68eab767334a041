//! Caching implementation for tasks.

use crate::cache::Cacheable;

use super::types::{Todo, TodoPatch};

impl Cacheable for Todo {
  type Patch = TodoPatch;

  fn cache_key(&self) -> &str {
    &self.id
  }

  fn apply_patch(&mut self, patch: &TodoPatch) {
    if let Some(text) = &patch.text {
      self.text = text.clone();
    }
    if let Some(completed) = patch.completed {
      self.completed = completed;
    }
    if let Some(completed_at) = &patch.completed_at {
      self.completed_at = completed_at.clone();
    }
    if let Some(priority) = patch.priority {
      self.priority = Some(priority);
    }
    if let Some(tags) = &patch.tags {
      self.tags = tags.clone();
    }
    if let Some(starred) = patch.starred {
      self.starred = starred;
    }
  }

  fn entity_type() -> &'static str {
    "todo"
  }
}
