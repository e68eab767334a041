//! Optimistic mutation coordinator.
//!
//! Every operation follows the same protocol:
//! 1. Snapshot the cache and apply the intended end state right away
//! 2. Send the request(s)
//! 3. Reconcile with the server response, or restore the snapshot on failure

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::instrument;

use crate::cache::{CacheStore, StoreHandle};
use crate::event::SyncEvent;
use crate::todo::api_types::{format_timestamp, now_iso, WireTask};
use crate::todo::error::ApiResult;
use crate::todo::types::{TodoPatch, TEMP_ID_PREFIX};
use crate::todo::validate::{self, ValidationError};
use crate::todo::{BackendVariant, CreateTodo, DeleteConfirmation, TaskApi, Todo, UpdateTodo};

use super::error::{SyncError, SyncResult};
use super::mutation::{Mutation, MutationKind};

/// Result of a bulk operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkOutcome {
  /// Number of per-task requests sent
  pub requested: usize,
}

/// Applies task mutations to the cache speculatively and settles them
/// against the server.
pub struct MutationCoordinator<A> {
  api: Arc<A>,
  store: StoreHandle<Todo>,
  variant: BackendVariant,
  events: Option<UnboundedSender<SyncEvent>>,
  /// Temporary ids of creates the server has not answered yet
  pending: Mutex<HashSet<String>>,
}

impl<A: TaskApi> MutationCoordinator<A> {
  pub fn new(api: Arc<A>, store: StoreHandle<Todo>, variant: BackendVariant) -> Self {
    Self {
      api,
      store,
      variant,
      events: None,
      pending: Mutex::new(HashSet::new()),
    }
  }

  /// Emit a [`SyncEvent`] for every settled network operation.
  pub fn with_events(mut self, events: UnboundedSender<SyncEvent>) -> Self {
    self.events = Some(events);
    self
  }

  pub fn store(&self) -> &StoreHandle<Todo> {
    &self.store
  }

  /// Replace the cache with the server's full collection.
  #[instrument(skip(self))]
  pub async fn load(&self) -> SyncResult<usize> {
    let todos: Vec<Todo> = self
      .api
      .fetch_all()
      .await?
      .into_iter()
      .map(Todo::from)
      .collect();

    let count = todos.len();
    self.store.write(|store| store.replace_all(todos));
    tracing::info!(count, "Loaded tasks");
    Ok(count)
  }

  /// Completed tasks as reported by the server. The cache is not touched.
  pub async fn fetch_completed(&self) -> SyncResult<Vec<Todo>> {
    let tasks = self.api.fetch_completed().await?;
    Ok(tasks.into_iter().map(Todo::from).collect())
  }

  /// Create a task, showing a temporary entity until the server assigns an id.
  #[instrument(skip(self, input), fields(text = %input.text))]
  pub async fn create(&self, input: CreateTodo) -> SyncResult<Todo> {
    let input = validate::create(input)?;
    let now = Utc::now();

    let (mut mutation, temp_id) = Mutation::start(MutationKind::Create, &self.store, |store| {
      let temp_id = temporary_id(store, now.timestamp_millis());
      store.insert_at_front(Todo::speculative(
        temp_id.clone(),
        &input,
        format_timestamp(now),
      ));
      temp_id
    });
    let _pending = PendingCreate::register(&self.pending, &temp_id);

    match self.api.create(&input).await {
      Ok(task) => {
        let confirmed = task.into_todo();
        mutation.confirm(|store| store.promote(&temp_id, confirmed.clone()));
        tracing::info!(temp_id = %temp_id, id = %confirmed.id, "Created task");
        self.notify(SyncEvent::Confirmed {
          kind: MutationKind::Create,
        });
        Ok(confirmed)
      }
      Err(e) => Err(self.fail(&mut mutation, e.into())),
    }
  }

  /// Apply `input` to task `id`.
  ///
  /// With the state-machine backend, a change to `completed` alone goes
  /// through the dedicated complete/incomplete endpoint.
  #[instrument(skip(self, input))]
  pub async fn update(&self, id: &str, input: UpdateTodo) -> SyncResult<Todo> {
    self.check_persisted(id)?;
    let input = validate::update(input)?;
    let patch = input.to_patch(&now_iso());

    let (mut mutation, patched) = Mutation::start(MutationKind::Update, &self.store, |store| {
      store.patch_by_id(id, &patch)
    });
    if !patched {
      tracing::debug!(id, "Task not cached or already up to date");
    }

    let result = match input.completion_only() {
      Some(completed) if self.variant == BackendVariant::StateMachine => {
        self.api.set_completed(id, completed).await
      }
      _ => self.api.update(id, &input).await,
    };

    match result {
      Ok(task) => {
        let todo = mutation
          .confirm(|store| {
            let canonical = match store.get(id) {
              Some(local) => task.clone().reconcile(local),
              None => task.clone().into_todo(),
            };
            store.replace_by_id(id, canonical.clone());
            canonical
          })
          .unwrap_or_else(|| task.into_todo());
        self.notify(SyncEvent::Confirmed {
          kind: MutationKind::Update,
        });
        Ok(todo)
      }
      Err(e) => Err(self.fail(&mut mutation, e.into())),
    }
  }

  pub async fn set_completed(&self, id: &str, completed: bool) -> SyncResult<Todo> {
    self.update(id, UpdateTodo::completion(completed)).await
  }

  pub async fn set_starred(&self, id: &str, starred: bool) -> SyncResult<Todo> {
    self.update(id, UpdateTodo::starred(starred)).await
  }

  #[instrument(skip(self))]
  pub async fn delete(&self, id: &str) -> SyncResult<DeleteConfirmation> {
    self.check_persisted(id)?;

    let (mut mutation, removed) = Mutation::start(MutationKind::Delete, &self.store, |store| {
      store.remove_by_id(id)
    });
    if !removed {
      tracing::debug!(id, "Task not cached");
    }

    match self.api.delete(id).await {
      Ok(confirmation) => {
        mutation.confirm(|_| ());
        self.notify(SyncEvent::Confirmed {
          kind: MutationKind::Delete,
        });
        Ok(confirmation)
      }
      Err(e) => Err(self.fail(&mut mutation, e.into())),
    }
  }

  /// Mark every task complete or incomplete.
  ///
  /// The server's list decides which tasks need a request; tasks already in
  /// the target state are skipped. Requests go out one at a time.
  #[instrument(skip(self))]
  pub async fn toggle_all(&self, completed: bool) -> SyncResult<BulkOutcome> {
    let kind = MutationKind::ToggleAll;
    let (targets, mut canonical): (Vec<WireTask>, Vec<WireTask>) = self
      .prefetch(kind, self.api.fetch_all())
      .await?
      .into_iter()
      .partition(|task| task.completed != completed);

    let now = now_iso();
    let (mut mutation, _) = Mutation::start(kind, &self.store, |store| {
      let patch = TodoPatch::completion(completed, &now);
      let ids: Vec<String> = store
        .entities()
        .iter()
        .filter(|todo| todo.completed != completed)
        .map(|todo| todo.id.clone())
        .collect();
      for id in &ids {
        store.patch_by_id(id, &patch);
      }
    });

    for (applied, target) in targets.iter().enumerate() {
      match self.send_completion(&target.id, completed).await {
        Ok(task) => canonical.push(task),
        Err(source) => {
          let error = SyncError::Bulk {
            kind,
            applied,
            total: targets.len(),
            source,
          };
          return Err(self.fail(&mut mutation, error));
        }
      }
    }

    mutation.confirm(|store| reconcile_all(store, canonical));
    tracing::info!(requested = targets.len(), completed, "Toggled all tasks");
    self.notify(SyncEvent::Confirmed { kind });
    Ok(BulkOutcome {
      requested: targets.len(),
    })
  }

  /// Delete every completed task, one request per task the server reports as completed.
  #[instrument(skip(self))]
  pub async fn clear_completed(&self) -> SyncResult<BulkOutcome> {
    let kind = MutationKind::ClearCompleted;
    let targets: Vec<String> = self
      .prefetch(kind, self.api.fetch_completed())
      .await?
      .into_iter()
      .map(|task| task.id)
      .collect();

    let (mut mutation, _) = Mutation::start(kind, &self.store, |store| {
      let ids: Vec<String> = store
        .entities()
        .iter()
        .filter(|todo| todo.completed)
        .map(|todo| todo.id.clone())
        .collect();
      for id in &ids {
        store.remove_by_id(id);
      }
    });

    for (applied, id) in targets.iter().enumerate() {
      if let Err(source) = self.api.delete(id).await {
        let error = SyncError::Bulk {
          kind,
          applied,
          total: targets.len(),
          source,
        };
        return Err(self.fail(&mut mutation, error));
      }
    }

    // The server may have known completions the cache had not seen yet
    mutation.confirm(|store| {
      for id in &targets {
        store.remove_by_id(id);
      }
    });
    tracing::info!(requested = targets.len(), "Cleared completed tasks");
    self.notify(SyncEvent::Confirmed { kind });
    Ok(BulkOutcome {
      requested: targets.len(),
    })
  }

  /// Fetch the authoritative list a bulk operation works from. A failure
  /// here ends the operation before anything is speculated.
  async fn prefetch(
    &self,
    kind: MutationKind,
    fetch: impl std::future::Future<Output = ApiResult<Vec<WireTask>>>,
  ) -> SyncResult<Vec<WireTask>> {
    fetch.await.map_err(|e| {
      let error = SyncError::from(e);
      tracing::warn!(%kind, error = %error, "Could not fetch server state");
      self.notify(SyncEvent::Failed {
        kind,
        message: error.user_message(),
      });
      error
    })
  }

  async fn send_completion(&self, id: &str, completed: bool) -> ApiResult<WireTask> {
    match self.variant {
      BackendVariant::StateMachine => self.api.set_completed(id, completed).await,
      BackendVariant::Generic => {
        self
          .api
          .update(id, &UpdateTodo::completion(completed))
          .await
      }
    }
  }

  fn check_persisted(&self, id: &str) -> Result<(), ValidationError> {
    validate::persisted_id(id, &lock(&self.pending))
  }

  /// Roll back `mutation`, report the failure, and hand the error back.
  fn fail(&self, mutation: &mut Mutation<Todo>, error: SyncError) -> SyncError {
    mutation.roll_back();
    tracing::warn!(kind = %mutation.kind(), error = %error, "Mutation failed");
    self.notify(SyncEvent::RolledBack {
      kind: mutation.kind(),
      message: error.user_message(),
    });
    error
  }

  fn notify(&self, event: SyncEvent) {
    if let Some(events) = &self.events {
      // Receiver may have been dropped
      let _ = events.send(event);
    }
  }
}

/// Overlay confirmed server tasks on the cached entities they belong to.
fn reconcile_all(store: &mut CacheStore<Todo>, tasks: Vec<WireTask>) {
  for task in tasks {
    let id = task.id.clone();
    let Some(local) = store.get(&id) else {
      continue;
    };
    let merged = task.reconcile(local);
    store.replace_by_id(&id, merged);
  }
}

fn lock(pending: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
  pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks a temporary id as pending until dropped.
struct PendingCreate<'a> {
  pending: &'a Mutex<HashSet<String>>,
  id: String,
}

impl<'a> PendingCreate<'a> {
  fn register(pending: &'a Mutex<HashSet<String>>, id: &str) -> Self {
    lock(pending).insert(id.to_string());
    Self {
      pending,
      id: id.to_string(),
    }
  }
}

impl Drop for PendingCreate<'_> {
  fn drop(&mut self) {
    lock(self.pending).remove(&self.id);
  }
}

/// `temp-<millis>`, suffixed when another pending create holds that id.
fn temporary_id(store: &CacheStore<Todo>, millis: i64) -> String {
  let base = format!("{}{}", TEMP_ID_PREFIX, millis);
  let mut id = base.clone();
  let mut n = 1;
  while store.get(&id).is_some() {
    id = format!("{}-{}", base, n);
    n += 1;
  }
  id
}
