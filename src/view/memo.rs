use std::sync::Arc;

use super::filters::Filters;
use super::selectors::{self, Counts};
use crate::cache::StoreHandle;
use crate::todo::Todo;

struct Memo {
  revision: u64,
  filters: Filters,
  todos: Arc<[Todo]>,
}

/// Filtered task list that recomputes only when the store revision or the
/// filters change.
pub struct TodoView {
  store: StoreHandle<Todo>,
  filters: Filters,
  memo: Option<Memo>,
  computations: usize,
}

impl TodoView {
  pub fn new(store: StoreHandle<Todo>) -> Self {
    Self {
      store,
      filters: Filters::default(),
      memo: None,
      computations: 0,
    }
  }

  pub fn filters(&self) -> &Filters {
    &self.filters
  }

  pub fn filters_mut(&mut self) -> &mut Filters {
    &mut self.filters
  }

  /// Tasks passing the current filters, in store order.
  pub fn todos(&mut self) -> Arc<[Todo]> {
    let revision = self.store.revision();
    if let Some(memo) = &self.memo {
      if memo.revision == revision && memo.filters == self.filters {
        return memo.todos.clone();
      }
    }

    let (revision, todos): (u64, Arc<[Todo]>) = self.store.read(|store| {
      let todos = selectors::filtered(store.entities(), &self.filters)
        .into_iter()
        .cloned()
        .collect();
      (store.revision(), todos)
    });
    self.computations += 1;
    tracing::trace!(revision, count = todos.len(), "Recomputed filtered view");

    self.memo = Some(Memo {
      revision,
      filters: self.filters.clone(),
      todos: todos.clone(),
    });
    todos
  }

  /// Counts over the whole collection, ignoring filters.
  pub fn counts(&self) -> Counts {
    self.store.read(|store| selectors::counts(store.entities()))
  }

  /// Number of times the filtered list was actually recomputed
  pub fn computations(&self) -> usize {
    self.computations
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::view::filters::FilterMode;

  fn todo(id: &str, completed: bool) -> Todo {
    Todo {
      id: id.into(),
      text: format!("task {}", id),
      completed,
      created_at: "2024-05-01T10:00:00.000Z".into(),
      completed_at: None,
      priority: None,
      tags: Vec::new(),
      starred: false,
    }
  }

  fn view() -> TodoView {
    let store = StoreHandle::new();
    store.write(|s| s.replace_all(vec![todo("1", false), todo("2", true)]));
    TodoView::new(store)
  }

  #[test]
  fn test_unchanged_inputs_reuse_result() {
    let mut view = view();
    let first = view.todos();
    let second = view.todos();

    assert_eq!(view.computations(), 1);
    assert!(Arc::ptr_eq(&first, &second));
  }

  #[test]
  fn test_filter_change_recomputes() {
    let mut view = view();
    view.todos();

    view.filters_mut().set_mode(FilterMode::Active);
    let active = view.todos();
    assert_eq!(active.len(), 1);
    assert_eq!(view.computations(), 2);

    // Setting the same value again is not a change
    view.filters_mut().set_mode(FilterMode::Active);
    view.todos();
    assert_eq!(view.computations(), 2);
  }

  #[test]
  fn test_store_change_recomputes() {
    let mut view = view();
    view.todos();

    view.store.write(|s| s.remove_by_id("1"));
    assert_eq!(view.todos().len(), 1);
    assert_eq!(view.computations(), 2);

    // Removing a missing id does not bump the revision
    view.store.write(|s| s.remove_by_id("1"));
    view.todos();
    assert_eq!(view.computations(), 2);
  }

  #[test]
  fn test_counts_cover_whole_collection() {
    let mut view = view();
    view.filters_mut().set_mode(FilterMode::Completed);
    assert_eq!(view.todos().len(), 1);

    let counts = view.counts();
    assert_eq!(counts.active, 1);
    assert_eq!(counts.completed, 1);
    assert_eq!(counts.total(), 2);
  }
}
