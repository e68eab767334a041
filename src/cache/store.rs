//! In-memory cache store holding the canonical entity sequence.

use std::sync::Arc;

use super::traits::Cacheable;

/// Immutable copy of the store sequence, captured before a speculative
/// mutation and handed back to [`CacheStore::restore`] on rollback.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
  entities: Arc<[T]>,
  generation: u64,
}

impl<T> Snapshot<T> {
  /// The captured entities in store order.
  pub fn entities(&self) -> &[T] {
    &self.entities
  }

  /// Store generation at capture time.
  pub fn generation(&self) -> u64 {
    self.generation
  }

  pub fn len(&self) -> usize {
    self.entities.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entities.is_empty()
  }
}

/// Ordered collection of entities keyed by [`Cacheable::cache_key`].
///
/// Every mutating operation is synchronous and either applies completely or
/// leaves the store untouched. Targeting an id that is not present is a
/// silent no-op.
///
/// Two counters accompany the sequence:
/// - `revision` is bumped by every effective change; views memoize on it.
/// - `generation` is bumped when the contents are replaced wholesale
///   (`replace_all`, `teardown`); results captured under an older generation
///   are stale and must not be written back.
///
/// Entities swapped in with [`CacheStore::promote`] are remembered for the
/// rest of the generation, so restoring a snapshot taken before the swap
/// does not bring the provisional entity back.
#[derive(Debug)]
pub struct CacheStore<T> {
  entities: Vec<T>,
  revision: u64,
  generation: u64,
  /// `(provisional id, confirmed entity)`
  promotions: Vec<(String, T)>,
}

impl<T: Cacheable> Default for CacheStore<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: Cacheable> CacheStore<T> {
  pub fn new() -> Self {
    Self {
      entities: Vec::new(),
      revision: 0,
      generation: 0,
      promotions: Vec::new(),
    }
  }

  pub fn entities(&self) -> &[T] {
    &self.entities
  }

  pub fn len(&self) -> usize {
    self.entities.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entities.is_empty()
  }

  pub fn revision(&self) -> u64 {
    self.revision
  }

  pub fn generation(&self) -> u64 {
    self.generation
  }

  pub fn get(&self, id: &str) -> Option<&T> {
    self.entities.iter().find(|e| e.cache_key() == id)
  }

  fn position(&self, id: &str) -> Option<usize> {
    self.entities.iter().position(|e| e.cache_key() == id)
  }

  /// Replace the entire sequence, typically after a full fetch.
  ///
  /// Later duplicates of an id are dropped so the store never holds two
  /// entities with the same key.
  pub fn replace_all(&mut self, entities: Vec<T>) {
    let mut unique: Vec<T> = Vec::with_capacity(entities.len());
    for entity in entities {
      if unique.iter().any(|e| e.cache_key() == entity.cache_key()) {
        tracing::warn!(
          entity_type = T::entity_type(),
          id = entity.cache_key(),
          "Dropping duplicate entity from full fetch"
        );
        continue;
      }
      unique.push(entity);
    }

    self.entities = unique;
    self.promotions.clear();
    self.generation += 1;
    self.revision += 1;
  }

  /// Prepend an entity. An existing entity with the same id is removed first.
  pub fn insert_at_front(&mut self, entity: T) {
    if let Some(pos) = self.position(entity.cache_key()) {
      self.entities.remove(pos);
    }
    self.entities.insert(0, entity);
    self.revision += 1;
  }

  /// Substitute the entity with id `id` by `entity`, keeping its position.
  ///
  /// When `entity` carries a different id that already exists elsewhere,
  /// that other copy is dropped. Returns whether anything changed.
  pub fn replace_by_id(&mut self, id: &str, entity: T) -> bool {
    let Some(pos) = self.position(id) else {
      return false;
    };

    if self.entities[pos] == entity {
      return false;
    }

    let new_key = entity.cache_key().to_string();
    self.entities[pos] = entity;
    if new_key != id {
      let mut index = 0;
      self.entities.retain(|e| {
        let keep = index == pos || e.cache_key() != new_key;
        index += 1;
        keep
      });
    }
    self.revision += 1;
    true
  }

  /// Shallow-merge `patch` into the entity with id `id`.
  /// Returns whether anything changed.
  pub fn patch_by_id(&mut self, id: &str, patch: &T::Patch) -> bool {
    let Some(pos) = self.position(id) else {
      return false;
    };

    let mut patched = self.entities[pos].clone();
    patched.apply_patch(patch);
    if patched == self.entities[pos] {
      return false;
    }

    self.entities[pos] = patched;
    self.revision += 1;
    true
  }

  /// Replace the provisional entity `provisional_id` by its confirmed
  /// counterpart and remember the swap for later restores.
  pub fn promote(&mut self, provisional_id: &str, entity: T) -> bool {
    let replaced = self.replace_by_id(provisional_id, entity.clone());
    self.promotions.push((provisional_id.to_string(), entity));
    replaced
  }

  /// Delete the entity with id `id`. Returns whether it was present.
  pub fn remove_by_id(&mut self, id: &str) -> bool {
    let Some(pos) = self.position(id) else {
      return false;
    };

    self.entities.remove(pos);
    self.promotions.retain(|(_, e)| e.cache_key() != id);
    self.revision += 1;
    true
  }

  pub fn snapshot(&self) -> Snapshot<T> {
    Snapshot {
      entities: Arc::from(self.entities.as_slice()),
      generation: self.generation,
    }
  }

  /// Replace the sequence with a previously captured snapshot, then re-apply
  /// every promotion the snapshot predates.
  pub fn restore(&mut self, snapshot: &Snapshot<T>) {
    if self.entities.as_slice() != snapshot.entities() {
      self.entities = snapshot.entities().to_vec();
      self.revision += 1;
    }
    self.reapply_promotions();
  }

  fn reapply_promotions(&mut self) {
    let promotions = std::mem::take(&mut self.promotions);
    for (provisional_id, entity) in &promotions {
      if self.position(provisional_id).is_some() {
        self.replace_by_id(provisional_id, entity.clone());
      } else if self.position(entity.cache_key()).is_none() {
        // Snapshot was taken before the provisional entity existed
        self.insert_at_front(entity.clone());
      } else {
        continue;
      }
      tracing::debug!(
        entity_type = T::entity_type(),
        id = entity.cache_key(),
        "Re-applied promotion after restore"
      );
    }
    self.promotions = promotions;
  }

  /// Drop all contents and start a new generation, so results still in
  /// flight are discarded when they settle.
  pub fn teardown(&mut self) {
    self.entities.clear();
    self.promotions.clear();
    self.generation += 1;
    self.revision += 1;
  }
}
