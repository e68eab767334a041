//! Serde types matching the tasks API, and their mapping to domain types.
//!
//! Wire types stay separate from [`Todo`] so deserialization can follow the
//! backend exactly while the cache works with one normalized shape.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::types::{CreateTodo, DeleteConfirmation, Priority, Todo};

// ============================================================================
// Task - returned by every endpoint except delete
// ============================================================================

/// A task exactly as the backend returns it.
///
/// The extension attributes are only echoed by some deployments, so all of
/// them are optional here and normalized by [`WireTask::into_todo`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTask {
  #[serde(deserialize_with = "deserialize_id")]
  pub id: String,
  pub text: String,
  #[serde(default)]
  pub completed: bool,
  #[serde(default)]
  pub created_date: i64,
  #[serde(default)]
  pub completed_date: Option<i64>,
  #[serde(default)]
  pub priority: Option<Priority>,
  #[serde(default)]
  pub tags: Option<Vec<String>>,
  #[serde(default)]
  pub starred: Option<bool>,
}

/// Ids are opaque strings, but some deployments serialize them as numbers.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum RawId {
    Text(String),
    Number(i64),
  }

  Ok(match RawId::deserialize(deserializer)? {
    RawId::Text(s) => s,
    RawId::Number(n) => n.to_string(),
  })
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CreateTaskBody<'a> {
  pub text: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub priority: Option<Priority>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tags: Option<&'a [String]>,
}

impl<'a> From<&'a CreateTodo> for CreateTaskBody<'a> {
  fn from(input: &'a CreateTodo) -> Self {
    CreateTaskBody {
      text: &input.text,
      priority: input.priority,
      tags: (!input.tags.is_empty()).then_some(input.tags.as_slice()),
    }
  }
}

// ============================================================================
// Error body
// ============================================================================

/// Structured error some backends return alongside a non-2xx status.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
  pub message: Option<String>,
  #[allow(dead_code)]
  pub status_code: Option<u16>,
  #[allow(dead_code)]
  pub timestamp: Option<String>,
}

// ============================================================================
// Conversions to domain types
// ============================================================================

impl WireTask {
  pub fn into_todo(self) -> Todo {
    Todo {
      id: self.id,
      text: self.text,
      completed: self.completed,
      created_at: epoch_millis_to_iso(self.created_date),
      completed_at: self
        .completed_date
        .filter(|&millis| millis != 0)
        .map(epoch_millis_to_iso),
      priority: self.priority,
      tags: self.tags.unwrap_or_default(),
      starred: self.starred.unwrap_or(false),
    }
  }

  /// Overlay this server response on the cached `local` entity.
  ///
  /// Fields the response carries win. Extension attributes the backend did
  /// not echo keep their local value, and a completed task keeps its local
  /// completion time when the server omitted one.
  pub fn reconcile(self, local: &Todo) -> Todo {
    let priority_echoed = self.priority.is_some();
    let tags_echoed = self.tags.is_some();
    let starred_echoed = self.starred.is_some();

    let mut todo = self.into_todo();
    if !priority_echoed {
      todo.priority = local.priority;
    }
    if !tags_echoed {
      todo.tags = local.tags.clone();
    }
    if !starred_echoed {
      todo.starred = local.starred;
    }
    if todo.completed && todo.completed_at.is_none() {
      todo.completed_at = local.completed_at.clone();
    }
    todo
  }
}

impl From<WireTask> for Todo {
  fn from(task: WireTask) -> Self {
    task.into_todo()
  }
}

impl DeleteConfirmation {
  /// Delete answers with plain text, JSON, or nothing at all.
  pub fn from_body(body: &str) -> Self {
    let body = body.trim();
    if body.is_empty() {
      return DeleteConfirmation {
        message: "Task deleted".to_string(),
      };
    }

    let message = serde_json::from_str::<ApiErrorBody>(body)
      .ok()
      .and_then(|b| b.message)
      .unwrap_or_else(|| body.to_string());
    DeleteConfirmation { message }
  }
}

// ============================================================================
// Helpers
// ============================================================================

/// Format epoch milliseconds as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
///
/// Values outside chrono's range fall back to the Unix epoch.
pub fn epoch_millis_to_iso(millis: i64) -> String {
  let time =
    DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
  format_timestamp(time)
}

pub fn format_timestamp(time: DateTime<Utc>) -> String {
  time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time in the domain timestamp format.
pub fn now_iso() -> String {
  format_timestamp(Utc::now())
}
