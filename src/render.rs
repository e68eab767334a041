//! Plain-text rendering for the command-line driver.

use crate::event::SyncEvent;
use crate::todo::Todo;
use crate::view::selectors::{Counts, TodoStats};
use crate::view::Filters;

const MAX_TEXT_WIDTH: usize = 60;

/// Truncate to `max_chars` characters, adding "..." if truncated
pub fn truncate(s: &str, max_chars: usize) -> String {
  if s.chars().count() <= max_chars {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// `[x] * Buy milk  (42)  !high #home`
pub fn todo_line(todo: &Todo) -> String {
  let mut line = format!(
    "[{}] {} {}  ({})",
    if todo.completed { "x" } else { " " },
    if todo.starred { "*" } else { " " },
    truncate(&todo.text, MAX_TEXT_WIDTH),
    todo.id
  );
  if let Some(priority) = todo.priority {
    line.push_str(&format!("  !{}", priority));
  }
  for tag in &todo.tags {
    line.push_str(&format!(" #{}", tag));
  }
  line
}

pub fn list(todos: &[Todo], filters: &Filters) -> String {
  let mut out = String::new();
  if filters.is_active() {
    out.push_str(&format!("{} tasks\n", filters.mode.label()));
  }
  if todos.is_empty() {
    out.push_str("No tasks\n");
  }
  for todo in todos {
    out.push_str(&todo_line(todo));
    out.push('\n');
  }
  out
}

pub fn counts(counts: Counts) -> String {
  format!("{} active, {} completed", counts.active, counts.completed)
}

pub fn stats(stats: &TodoStats) -> String {
  [
    format!("Total:      {}", stats.total),
    format!("Active:     {}", stats.active),
    format!("Completed:  {} ({}%)", stats.completed, stats.completion_rate),
    format!("Starred:    {}", stats.starred),
    format!(
      "Priority:   {} high, {} medium, {} low",
      stats.by_priority.high, stats.by_priority.medium, stats.by_priority.low
    ),
    format!(
      "Today:      {} created, {} completed",
      stats.today_count, stats.today_completed
    ),
  ]
  .join("\n")
}

pub fn tags(tags: &[String]) -> String {
  if tags.is_empty() {
    return "No tags".to_string();
  }
  tags
    .iter()
    .map(|t| format!("#{}", t))
    .collect::<Vec<_>>()
    .join(" ")
}

pub fn event(event: &SyncEvent) -> String {
  match event {
    SyncEvent::Confirmed { kind } => format!("ok: {}", kind),
    SyncEvent::RolledBack { kind, message } => {
      format!("error: {} failed and was undone: {}", kind, message)
    }
    SyncEvent::Failed { kind, message } => format!("error: {} failed: {}", kind, message),
  }
}
