//! Pure projections over the task sequence.

use std::collections::BTreeSet;

use chrono::{DateTime, Local, NaiveDate};

use super::filters::Filters;
use crate::todo::{Priority, Todo};

pub fn filtered<'a>(todos: &'a [Todo], filters: &Filters) -> Vec<&'a Todo> {
  todos.iter().filter(|todo| filters.matches(todo)).collect()
}

pub fn active_count(todos: &[Todo]) -> usize {
  todos.iter().filter(|todo| !todo.completed).count()
}

pub fn completed_count(todos: &[Todo]) -> usize {
  todos.iter().filter(|todo| todo.completed).count()
}

/// Active and completed counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
  pub active: usize,
  pub completed: usize,
}

impl Counts {
  pub fn total(&self) -> usize {
    self.active + self.completed
  }
}

pub fn counts(todos: &[Todo]) -> Counts {
  let completed = completed_count(todos);
  Counts {
    active: todos.len() - completed,
    completed,
  }
}

pub fn starred(todos: &[Todo]) -> Vec<&Todo> {
  todos.iter().filter(|todo| todo.starred).collect()
}

pub fn by_priority(todos: &[Todo], priority: Priority) -> Vec<&Todo> {
  todos
    .iter()
    .filter(|todo| todo.priority == Some(priority))
    .collect()
}

pub fn with_tag<'a>(todos: &'a [Todo], tag: &str) -> Vec<&'a Todo> {
  todos
    .iter()
    .filter(|todo| todo.tags.iter().any(|t| t == tag))
    .collect()
}

pub fn by_id<'a>(todos: &'a [Todo], id: &str) -> Option<&'a Todo> {
  todos.iter().find(|todo| todo.id == id)
}

/// Every tag in use, sorted and deduplicated
pub fn all_tags(todos: &[Todo]) -> Vec<String> {
  let tags: BTreeSet<&str> = todos
    .iter()
    .flat_map(|todo| todo.tags.iter().map(String::as_str))
    .collect();
  tags.into_iter().map(String::from).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriorityCounts {
  pub high: usize,
  pub medium: usize,
  pub low: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TodoStats {
  pub total: usize,
  pub active: usize,
  pub completed: usize,
  pub starred: usize,
  pub by_priority: PriorityCounts,
  /// Whole percent, 0 for an empty list
  pub completion_rate: u32,
  /// Tasks created on the current local date
  pub today_count: usize,
  pub today_completed: usize,
}

pub fn stats(todos: &[Todo]) -> TodoStats {
  stats_on(todos, Local::now().date_naive())
}

/// [`stats`] with an explicit local date for "today".
pub fn stats_on(todos: &[Todo], today: NaiveDate) -> TodoStats {
  let Counts { active, completed } = counts(todos);
  let total = todos.len();
  let priority_count = |p| todos.iter().filter(|t| t.priority == Some(p)).count();

  let created_today: Vec<&Todo> = todos
    .iter()
    .filter(|todo| local_date(&todo.created_at) == Some(today))
    .collect();

  TodoStats {
    total,
    active,
    completed,
    starred: starred(todos).len(),
    by_priority: PriorityCounts {
      high: priority_count(Priority::High),
      medium: priority_count(Priority::Medium),
      low: priority_count(Priority::Low),
    },
    completion_rate: completion_rate(completed, total),
    today_count: created_today.len(),
    today_completed: created_today.iter().filter(|t| t.completed).count(),
  }
}

fn completion_rate(completed: usize, total: usize) -> u32 {
  if total == 0 {
    return 0;
  }
  (completed as f64 / total as f64 * 100.0).round() as u32
}

/// Calendar date of an ISO timestamp in the local timezone.
pub fn local_date(timestamp: &str) -> Option<NaiveDate> {
  DateTime::parse_from_rfc3339(timestamp)
    .ok()
    .map(|time| time.with_timezone(&Local).date_naive())
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

  fn sample() -> Vec<Todo> {
    let mut a = todo("1", false);
    a.priority = Some(Priority::High);
    a.tags = vec!["work".into(), "urgent".into()];
    a.starred = true;

    let mut b = todo("2", true);
    b.priority = Some(Priority::Low);
    b.tags = vec!["home".into(), "work".into()];

    let mut c = todo("3", true);
    c.created_at = "2024-04-01T10:00:00.000Z".into();

    vec![a, b, c]
  }

  #[test]
  fn test_counts_add_up() {
    let todos = sample();
    let counts = counts(&todos);
    assert_eq!(counts.active, 1);
    assert_eq!(counts.completed, 2);
    assert_eq!(counts.total(), todos.len());
    assert_eq!(active_count(&todos) + completed_count(&todos), todos.len());
  }

  #[test]
  fn test_filtered_keeps_order() {
    let todos = sample();
    let filters = Filters {
      mode: FilterMode::Completed,
      ..Default::default()
    };
    let ids: Vec<&str> = filtered(&todos, &filters)
      .into_iter()
      .map(|t| t.id.as_str())
      .collect();
    assert_eq!(ids, vec!["2", "3"]);
  }

  #[test]
  fn test_list_selectors() {
    let todos = sample();
    assert_eq!(starred(&todos).len(), 1);
    assert_eq!(by_priority(&todos, Priority::Low)[0].id, "2");
    assert!(by_priority(&todos, Priority::Medium).is_empty());
    assert_eq!(with_tag(&todos, "work").len(), 2);
    assert_eq!(by_id(&todos, "3").map(|t| t.completed), Some(true));
    assert!(by_id(&todos, "9").is_none());
  }

  #[test]
  fn test_all_tags_sorted_unique() {
    assert_eq!(all_tags(&sample()), vec!["home", "urgent", "work"]);
    assert!(all_tags(&[]).is_empty());
  }

  #[test]
  fn test_stats() {
    let todos = sample();
    let today = local_date("2024-05-01T10:00:00.000Z").unwrap();
    let stats = stats_on(&todos, today);

    assert_eq!(stats.total, 3);
    assert_eq!(stats.active, 1);
    assert_eq!(stats.completed, 2);
    assert_eq!(stats.starred, 1);
    assert_eq!(
      stats.by_priority,
      PriorityCounts {
        high: 1,
        medium: 0,
        low: 1
      }
    );
    assert_eq!(stats.completion_rate, 67);
    assert_eq!(stats.today_count, 2);
    assert_eq!(stats.today_completed, 1);
  }

  #[test]
  fn test_stats_empty() {
    let stats = stats(&[]);
    assert_eq!(stats, TodoStats::default());
  }

  #[test]
  fn test_unparseable_created_at_is_not_today() {
    let mut t = todo("1", false);
    t.created_at = "yesterday".into();
    let today = Local::now().date_naive();
    assert_eq!(stats_on(&[t], today).today_count, 0);
  }
}
