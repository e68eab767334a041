use serde::{Deserialize, Serialize};

/// Task priority
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
  Low,
  Medium,
  High,
}

impl Priority {
  pub fn as_str(&self) -> &'static str {
    match self {
      Priority::Low => "low",
      Priority::Medium => "medium",
      Priority::High => "high",
    }
  }
}

impl std::fmt::Display for Priority {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A task as held by the cache and read by every view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
  pub id: String,
  pub text: String,
  pub completed: bool,
  /// ISO-8601, set once at creation
  pub created_at: String,
  /// ISO-8601, present only while completed
  pub completed_at: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub priority: Option<Priority>,
  pub tags: Vec<String>,
  pub starred: bool,
}

impl Todo {
  /// Build the local stand-in for a create that the server has not confirmed yet.
  pub fn speculative(id: String, input: &CreateTodo, created_at: String) -> Self {
    Todo {
      id,
      text: input.text.clone(),
      completed: false,
      created_at,
      completed_at: None,
      priority: input.priority,
      tags: input.tags.clone(),
      starred: false,
    }
  }

  /// Whether the id has the shape of a locally generated temporary id.
  /// Server ids are opaque and may match too.
  pub fn is_temporary(&self) -> bool {
    self.id.starts_with(TEMP_ID_PREFIX)
  }
}

/// Marker prefixed to the id of a speculatively created task.
pub const TEMP_ID_PREFIX: &str = "temp-";

/// Partial set of fields merged into a cached [`Todo`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
  pub text: Option<String>,
  pub completed: Option<bool>,
  pub completed_at: Option<Option<String>>,
  pub priority: Option<Priority>,
  pub tags: Option<Vec<String>>,
  pub starred: Option<bool>,
}

impl TodoPatch {
  /// Patch flipping completion; `completed_at` follows the new state.
  pub fn completion(completed: bool, now: &str) -> Self {
    TodoPatch {
      completed: Some(completed),
      completed_at: Some(completed.then(|| now.to_string())),
      ..Default::default()
    }
  }
}

/// Input for creating a task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTodo {
  pub text: String,
  pub priority: Option<Priority>,
  pub tags: Vec<String>,
}

impl CreateTodo {
  pub fn new(text: impl Into<String>) -> Self {
    CreateTodo {
      text: text.into(),
      ..Default::default()
    }
  }
}

/// Requested field changes for an existing task.
///
/// Serialized as-is for the generic update endpoint; absent fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateTodo {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub text: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub completed: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub priority: Option<Priority>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tags: Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub starred: Option<bool>,
}

impl UpdateTodo {
  pub fn completion(completed: bool) -> Self {
    UpdateTodo {
      completed: Some(completed),
      ..Default::default()
    }
  }

  pub fn starred(starred: bool) -> Self {
    UpdateTodo {
      starred: Some(starred),
      ..Default::default()
    }
  }

  pub fn is_empty(&self) -> bool {
    self.text.is_none()
      && self.completed.is_none()
      && self.priority.is_none()
      && self.tags.is_none()
      && self.starred.is_none()
  }

  /// The target completion state, if completion is the only requested change.
  pub fn completion_only(&self) -> Option<bool> {
    match self {
      UpdateTodo {
        text: None,
        completed: Some(completed),
        priority: None,
        tags: None,
        starred: None,
      } => Some(*completed),
      _ => None,
    }
  }

  /// Speculative patch for this update, stamping `now` as completion time.
  pub fn to_patch(&self, now: &str) -> TodoPatch {
    let mut patch = match self.completed {
      Some(completed) => TodoPatch::completion(completed, now),
      None => TodoPatch::default(),
    };
    patch.text = self.text.clone();
    patch.priority = self.priority;
    patch.tags = self.tags.clone();
    patch.starred = self.starred;
    patch
  }
}

/// Server confirmation of a delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteConfirmation {
  pub message: String,
}
