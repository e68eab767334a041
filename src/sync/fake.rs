//! In-memory tasks backend for coordinator tests.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::todo::api_types::WireTask;
use crate::todo::error::{ApiError, ApiResult};
use crate::todo::{CreateTodo, DeleteConfirmation, TaskApi, UpdateTodo};

/// Fixed clock so server timestamps are predictable
pub const SERVER_NOW: i64 = 1_714_557_600_000;

#[derive(Default)]
struct FakeState {
  tasks: Vec<WireTask>,
  next_id: u64,
  /// Echo priority/tags/starred like the extended deployment
  extended: bool,
  calls: Vec<String>,
  failing: Vec<String>,
  gated: Vec<String>,
}

/// Fake server whose calls can be made to fail or to wait on a gate.
///
/// Calls are recorded as `"METHOD /path"`, with the task text appended for
/// creates. Failure and gating rules match by prefix of that string.
pub struct FakeApi {
  state: Mutex<FakeState>,
  gate: watch::Sender<bool>,
}

impl FakeApi {
  pub fn minimal(tasks: Vec<WireTask>) -> Self {
    let next_id = tasks.len() as u64 + 100;
    Self {
      state: Mutex::new(FakeState {
        tasks,
        next_id,
        ..Default::default()
      }),
      gate: watch::channel(false).0,
    }
  }

  pub fn extended(tasks: Vec<WireTask>) -> Self {
    let api = Self::minimal(tasks);
    api.state().extended = true;
    api
  }

  fn state(&self) -> MutexGuard<'_, FakeState> {
    self.state.lock().unwrap()
  }

  pub fn set_next_id(&self, id: u64) {
    self.state().next_id = id;
  }

  /// Answer calls starting with `prefix` with a 500.
  pub fn fail(&self, prefix: &str) {
    self.state().failing.push(prefix.to_string());
  }

  /// Hold calls starting with `prefix` until [`FakeApi::open_gate`].
  pub fn hold(&self, prefix: &str) {
    self.state().gated.push(prefix.to_string());
  }

  pub fn open_gate(&self) {
    self.gate.send_replace(true);
  }

  pub fn calls(&self) -> Vec<String> {
    self.state().calls.clone()
  }

  pub fn tasks(&self) -> Vec<WireTask> {
    self.state().tasks.clone()
  }

  async fn enter(&self, call: String) -> ApiResult<()> {
    let (gated, failing) = {
      let mut state = self.state();
      let gated = state.gated.iter().any(|p| call.starts_with(p.as_str()));
      let failing = state.failing.iter().any(|p| call.starts_with(p.as_str()));
      state.calls.push(call);
      (gated, failing)
    };

    if gated {
      let mut rx = self.gate.subscribe();
      let _ = rx.wait_for(|open| *open).await;
    }
    if failing {
      return Err(ApiError::from_status(
        500,
        r#"{"message":"Internal failure","statusCode":500}"#,
      ));
    }
    Ok(())
  }

  fn echo(&self, task: &WireTask) -> WireTask {
    if self.state().extended {
      return task.clone();
    }
    WireTask {
      priority: None,
      tags: None,
      starred: None,
      ..task.clone()
    }
  }

  fn modify(&self, id: &str, f: impl FnOnce(&mut WireTask)) -> ApiResult<WireTask> {
    let task = {
      let mut state = self.state();
      let task = state
        .tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| ApiError::from_status(404, ""))?;
      f(task);
      task.clone()
    };
    Ok(self.echo(&task))
  }
}

fn set_completion(task: &mut WireTask, completed: bool) {
  task.completed = completed;
  task.completed_date = completed.then_some(SERVER_NOW);
}

/// Wire task in the minimal shape
pub fn task(id: &str, text: &str, completed: bool) -> WireTask {
  WireTask {
    id: id.to_string(),
    text: text.to_string(),
    completed,
    created_date: SERVER_NOW - 86_400_000,
    completed_date: completed.then_some(SERVER_NOW - 3_600_000),
    priority: None,
    tags: None,
    starred: None,
  }
}

#[async_trait]
impl TaskApi for FakeApi {
  async fn fetch_all(&self) -> ApiResult<Vec<WireTask>> {
    self.enter("GET /tasks".to_string()).await?;
    let tasks = self.tasks();
    Ok(tasks.iter().map(|t| self.echo(t)).collect())
  }

  async fn fetch_completed(&self) -> ApiResult<Vec<WireTask>> {
    self.enter("GET /tasks/completed".to_string()).await?;
    let tasks = self.tasks();
    Ok(
      tasks
        .iter()
        .filter(|t| t.completed)
        .map(|t| self.echo(t))
        .collect(),
    )
  }

  async fn create(&self, input: &CreateTodo) -> ApiResult<WireTask> {
    self.enter(format!("POST /tasks {}", input.text)).await?;
    let task = {
      let mut state = self.state();
      let id = state.next_id.to_string();
      state.next_id += 1;
      let task = WireTask {
        id,
        text: input.text.clone(),
        completed: false,
        created_date: SERVER_NOW,
        completed_date: None,
        priority: input.priority,
        tags: Some(input.tags.clone()),
        starred: Some(false),
      };
      state.tasks.push(task.clone());
      task
    };
    Ok(self.echo(&task))
  }

  async fn update(&self, id: &str, input: &UpdateTodo) -> ApiResult<WireTask> {
    self.enter(format!("POST /tasks/{}", id)).await?;
    let extended = self.state().extended;
    self.modify(id, |task| {
      if let Some(text) = &input.text {
        task.text = text.clone();
      }
      if let Some(completed) = input.completed {
        set_completion(task, completed);
      }
      if extended {
        if let Some(priority) = input.priority {
          task.priority = Some(priority);
        }
        if let Some(tags) = &input.tags {
          task.tags = Some(tags.clone());
        }
        if let Some(starred) = input.starred {
          task.starred = Some(starred);
        }
      }
    })
  }

  async fn set_completed(&self, id: &str, completed: bool) -> ApiResult<WireTask> {
    let action = if completed { "complete" } else { "incomplete" };
    self.enter(format!("POST /tasks/{}/{}", id, action)).await?;
    self.modify(id, |task| set_completion(task, completed))
  }

  async fn delete(&self, id: &str) -> ApiResult<DeleteConfirmation> {
    self.enter(format!("DELETE /tasks/{}", id)).await?;
    let mut state = self.state();
    let before = state.tasks.len();
    state.tasks.retain(|t| t.id != id);
    if state.tasks.len() == before {
      return Err(ApiError::from_status(404, ""));
    }
    Ok(DeleteConfirmation::from_body(""))
  }
}
