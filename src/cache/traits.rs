//! Core traits for entities held by the cache store.

/// Trait for entities that can be held in a [`CacheStore`](super::CacheStore).
///
/// Implementors provide a unique identity and describe how a partial update
/// is merged into an existing value.
pub trait Cacheable: Clone + PartialEq + Send + 'static {
  /// Shallow set of optional fields applied by `patch_by_id`.
  type Patch;

  /// Unique identifier for this entity (e.g., task id)
  fn cache_key(&self) -> &str;

  /// Merge every field present in `patch` into `self`.
  fn apply_patch(&mut self, patch: &Self::Patch);

  /// Entity type name used in log output (e.g., "todo")
  fn entity_type() -> &'static str;
}
