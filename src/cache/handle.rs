//! Shared handle to the cache store, injected into the coordinator and views.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::store::{CacheStore, Snapshot};
use super::traits::Cacheable;

/// Owned, cloneable handle to a single [`CacheStore`].
///
/// The lock is only ever taken for synchronous sections and never held
/// across an `.await`, so operations awaiting the network interleave freely
/// while each store write stays atomic.
pub struct StoreHandle<T> {
  inner: Arc<Mutex<CacheStore<T>>>,
}

impl<T: Cacheable> StoreHandle<T> {
  pub fn new() -> Self {
    Self {
      inner: Arc::new(Mutex::new(CacheStore::new())),
    }
  }

  fn lock(&self) -> MutexGuard<'_, CacheStore<T>> {
    // Store operations never leave a half-applied state, so a poisoned lock
    // still guards a consistent sequence.
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Run `f` with shared access to the store.
  pub fn read<R>(&self, f: impl FnOnce(&CacheStore<T>) -> R) -> R {
    f(&self.lock())
  }

  /// Run `f` with exclusive access to the store.
  pub fn write<R>(&self, f: impl FnOnce(&mut CacheStore<T>) -> R) -> R {
    f(&mut self.lock())
  }

  /// Run `f` only if the store is still in `generation`.
  ///
  /// Returns `None` without touching the store when the contents were
  /// replaced or torn down since the generation was observed.
  pub fn write_if_current<R>(
    &self,
    generation: u64,
    f: impl FnOnce(&mut CacheStore<T>) -> R,
  ) -> Option<R> {
    let mut store = self.lock();
    if store.generation() != generation {
      return None;
    }
    Some(f(&mut store))
  }

  pub fn snapshot(&self) -> Snapshot<T> {
    self.lock().snapshot()
  }

  /// Copy of the current sequence.
  pub fn to_vec(&self) -> Vec<T> {
    self.lock().entities().to_vec()
  }

  pub fn revision(&self) -> u64 {
    self.lock().revision()
  }

  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.lock().is_empty()
  }

  pub fn get(&self, id: &str) -> Option<T> {
    self.lock().get(id).cloned()
  }

  pub fn teardown(&self) {
    self.lock().teardown();
  }
}

impl<T: Cacheable> Default for StoreHandle<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> Clone for StoreHandle<T> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}
