use crate::todo::{Priority, Todo};

/// Which completion states a list shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FilterMode {
  #[default]
  All,
  Active,
  Completed,
}

impl FilterMode {
  pub fn label(&self) -> &'static str {
    match self {
      FilterMode::All => "All",
      FilterMode::Active => "Active",
      FilterMode::Completed => "Completed",
    }
  }

  fn admits(&self, todo: &Todo) -> bool {
    match self {
      FilterMode::All => true,
      FilterMode::Active => !todo.completed,
      FilterMode::Completed => todo.completed,
    }
  }
}

/// Filter configuration applied to the task list.
///
/// Every criterion must match. An empty search, no priority and no tags
/// each admit everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
  pub mode: FilterMode,
  pub search: String,
  pub priority: Option<Priority>,
  /// A task matches if it carries any of these
  pub tags: Vec<String>,
}

impl Filters {
  pub fn set_mode(&mut self, mode: FilterMode) {
    self.mode = mode;
  }

  pub fn set_search(&mut self, search: impl Into<String>) {
    self.search = search.into();
  }

  pub fn set_priority(&mut self, priority: Option<Priority>) {
    self.priority = priority;
  }

  pub fn set_tags(&mut self, tags: Vec<String>) {
    self.tags = tags;
  }

  /// Back to showing everything
  pub fn clear(&mut self) {
    *self = Filters::default();
  }

  pub fn is_active(&self) -> bool {
    *self != Filters::default()
  }

  pub fn matches(&self, todo: &Todo) -> bool {
    if !self.mode.admits(todo) {
      return false;
    }
    if !self.search.is_empty()
      && !todo
        .text
        .to_lowercase()
        .contains(&self.search.to_lowercase())
    {
      return false;
    }
    if self.priority.is_some() && todo.priority != self.priority {
      return false;
    }
    self.tags.is_empty() || self.tags.iter().any(|tag| todo.tags.contains(tag))
  }
}
