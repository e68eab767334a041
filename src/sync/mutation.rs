//! Lifecycle of a single speculative mutation.

use std::fmt;

use crate::cache::{CacheStore, Cacheable, Snapshot, StoreHandle};

/// Operation a mutation performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
  Create,
  Update,
  Delete,
  ToggleAll,
  ClearCompleted,
}

impl fmt::Display for MutationKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      MutationKind::Create => "Create",
      MutationKind::Update => "Update",
      MutationKind::Delete => "Delete",
      MutationKind::ToggleAll => "Toggle all",
      MutationKind::ClearCompleted => "Clear completed",
    })
  }
}

/// `Idle -> Speculating -> {Confirmed | RolledBack}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPhase {
  Idle,
  Speculating,
  Confirmed,
  RolledBack,
}

impl MutationPhase {
  pub fn is_terminal(&self) -> bool {
    matches!(self, MutationPhase::Confirmed | MutationPhase::RolledBack)
  }
}

/// One in-flight speculative change against a store.
///
/// The snapshot is captured in the same critical section as the speculative
/// write, so no other operation can slip a change in between. Results that
/// settle after the store was replaced or torn down are dropped without
/// touching it.
///
/// Dropping a mutation that is still speculating rolls it back.
pub struct Mutation<T: Cacheable> {
  kind: MutationKind,
  phase: MutationPhase,
  store: StoreHandle<T>,
  snapshot: Option<Snapshot<T>>,
}

impl<T: Cacheable> Mutation<T> {
  pub fn new(kind: MutationKind, store: &StoreHandle<T>) -> Self {
    Self {
      kind,
      phase: MutationPhase::Idle,
      store: store.clone(),
      snapshot: None,
    }
  }

  pub fn kind(&self) -> MutationKind {
    self.kind
  }

  pub fn phase(&self) -> MutationPhase {
    self.phase
  }

  /// Create a mutation and immediately speculate with `change`.
  pub fn start<R>(
    kind: MutationKind,
    store: &StoreHandle<T>,
    change: impl FnOnce(&mut CacheStore<T>) -> R,
  ) -> (Self, R) {
    let mut mutation = Self::new(kind, store);
    let result = mutation.apply_speculation(change);
    (mutation, result)
  }

  /// Snapshot the store and apply `change` to it.
  ///
  /// Only valid from `Idle`; later calls return `None` and leave the store alone.
  pub fn speculate<R>(&mut self, change: impl FnOnce(&mut CacheStore<T>) -> R) -> Option<R> {
    if self.phase != MutationPhase::Idle {
      tracing::warn!(kind = %self.kind, phase = ?self.phase, "Mutation already started");
      return None;
    }
    Some(self.apply_speculation(change))
  }

  fn apply_speculation<R>(&mut self, change: impl FnOnce(&mut CacheStore<T>) -> R) -> R {
    let (snapshot, result) = self.store.write(|store| {
      let snapshot = store.snapshot();
      (snapshot, change(store))
    });

    tracing::debug!(
      kind = %self.kind,
      entity_type = T::entity_type(),
      generation = snapshot.generation(),
      "Speculating"
    );
    self.snapshot = Some(snapshot);
    self.phase = MutationPhase::Speculating;
    result
  }

  /// Mark the mutation confirmed and apply the reconciling `change`.
  ///
  /// Returns `None` when the store moved to a new generation meanwhile, in
  /// which case the result is discarded.
  pub fn confirm<R>(&mut self, change: impl FnOnce(&mut CacheStore<T>) -> R) -> Option<R> {
    let generation = self.settle(MutationPhase::Confirmed)?;

    let result = self.store.write_if_current(generation, change);
    if result.is_some() {
      tracing::debug!(kind = %self.kind, "Confirmed");
    } else {
      tracing::debug!(kind = %self.kind, "Discarding confirmation for replaced store");
    }
    result
  }

  /// Restore the pre-mutation snapshot. Returns whether the store was written.
  pub fn roll_back(&mut self) -> bool {
    let Some(generation) = self.settle(MutationPhase::RolledBack) else {
      return false;
    };
    let Some(snapshot) = self.snapshot.as_ref() else {
      return false;
    };

    let restored = self
      .store
      .write_if_current(generation, |store| store.restore(snapshot))
      .is_some();
    if restored {
      tracing::info!(kind = %self.kind, "Rolled back");
    } else {
      tracing::debug!(kind = %self.kind, "Skipping rollback for replaced store");
    }
    restored
  }

  /// Move from `Speculating` to a terminal phase, returning the captured generation.
  fn settle(&mut self, phase: MutationPhase) -> Option<u64> {
    if self.phase != MutationPhase::Speculating {
      tracing::warn!(kind = %self.kind, phase = ?self.phase, "Mutation is not speculating");
      return None;
    }
    self.phase = phase;
    self.snapshot.as_ref().map(Snapshot::generation)
  }
}

impl<T: Cacheable> Drop for Mutation<T> {
  fn drop(&mut self) {
    if self.phase == MutationPhase::Speculating {
      self.roll_back();
    }
  }
}
