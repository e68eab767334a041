use clap::{Parser, Subcommand};
use color_eyre::{eyre::WrapErr, Result};
use std::path::PathBuf;
use std::sync::Arc;

use todo_sync::cache::StoreHandle;
use todo_sync::event::EventHandler;
use todo_sync::sync::{MutationCoordinator, SyncResult};
use todo_sync::todo::{BackendVariant, CreateTodo, HttpTaskApi, Priority, UpdateTodo};
use todo_sync::view::{selectors, FilterMode, TodoView};
use todo_sync::{config, logging, render};

#[derive(Parser, Debug)]
#[command(name = "todo-sync")]
#[command(about = "Task list client with optimistic updates against a remote tasks API")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/todo-sync/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Base URL of the tasks API
  #[arg(long, global = true)]
  url: Option<String>,

  /// How completion changes are sent to the server
  #[arg(long, value_enum, global = true)]
  backend: Option<BackendVariant>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Show tasks
  List {
    #[arg(long, value_enum, default_value = "all")]
    filter: FilterMode,
    /// Only tasks whose text contains this (case-insensitive)
    #[arg(long)]
    search: Option<String>,
    #[arg(long, value_enum)]
    priority: Option<Priority>,
    /// Only tasks carrying any of these tags
    #[arg(long = "tag")]
    tags: Vec<String>,
  },
  /// Create a task
  Add {
    text: String,
    #[arg(long, value_enum)]
    priority: Option<Priority>,
    #[arg(long = "tag")]
    tags: Vec<String>,
  },
  /// Change fields of a task
  Edit {
    id: String,
    #[arg(long)]
    text: Option<String>,
    #[arg(long, value_enum)]
    priority: Option<Priority>,
    /// Replace the task's tags
    #[arg(long = "tag")]
    tags: Vec<String>,
    /// Remove all tags
    #[arg(long, conflicts_with = "tags")]
    clear_tags: bool,
  },
  /// Mark a task completed
  Done { id: String },
  /// Mark a task not completed
  Undo { id: String },
  Star { id: String },
  Unstar { id: String },
  /// Delete a task
  Rm { id: String },
  /// Mark every task completed or not completed
  ToggleAll {
    #[arg(long, conflicts_with = "undone", required_unless_present = "undone")]
    done: bool,
    #[arg(long)]
    undone: bool,
  },
  /// Delete every completed task
  ClearCompleted,
  /// Summary counts
  Stats,
  /// Every tag in use
  Tags,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(url) = args.url {
    config.api.url = url;
  }
  if let Some(backend) = args.backend {
    config.api.backend = backend;
  }

  let _log_guard = logging::init(&config.log)?;
  tracing::debug!(url = %config.api.url, backend = ?config.api.backend, "Starting");

  let api = HttpTaskApi::new(&config.api.url, config.api.timeout())
    .wrap_err("Failed to set up the API client")?;
  let store = StoreHandle::new();
  let mut events = EventHandler::new();
  let coordinator = MutationCoordinator::new(Arc::new(api), store.clone(), config.api.backend)
    .with_events(events.sender());

  coordinator
    .load()
    .await
    .wrap_err_with(|| format!("Failed to load tasks from {}", config.api.url))?;

  let mut view = TodoView::new(store);
  let outcome = run(&coordinator, &mut view, args.command).await;

  for event in events.drain() {
    eprintln!("{}", render::event(&event));
  }
  print!("{}", render::list(&view.todos(), view.filters()));
  println!("{}", render::counts(view.counts()));

  outcome?;
  Ok(())
}

/// Run one command against the loaded cache.
async fn run(
  coordinator: &MutationCoordinator<HttpTaskApi>,
  view: &mut TodoView,
  command: Command,
) -> SyncResult<()> {
  match command {
    Command::List {
      filter,
      search,
      priority,
      tags,
    } => {
      let filters = view.filters_mut();
      filters.set_mode(filter);
      filters.set_search(search.unwrap_or_default());
      filters.set_priority(priority);
      filters.set_tags(tags);
    }
    Command::Add {
      text,
      priority,
      tags,
    } => {
      let todo = coordinator
        .create(CreateTodo {
          text,
          priority,
          tags,
        })
        .await?;
      println!("Created {}", todo.id);
    }
    Command::Edit {
      id,
      text,
      priority,
      tags,
      clear_tags,
    } => {
      let tags = if clear_tags {
        Some(Vec::new())
      } else {
        (!tags.is_empty()).then_some(tags)
      };
      coordinator
        .update(
          &id,
          UpdateTodo {
            text,
            priority,
            tags,
            ..Default::default()
          },
        )
        .await?;
    }
    Command::Done { id } => {
      coordinator.set_completed(&id, true).await?;
    }
    Command::Undo { id } => {
      coordinator.set_completed(&id, false).await?;
    }
    Command::Star { id } => {
      coordinator.set_starred(&id, true).await?;
    }
    Command::Unstar { id } => {
      coordinator.set_starred(&id, false).await?;
    }
    Command::Rm { id } => {
      let confirmation = coordinator.delete(&id).await?;
      println!("{}", confirmation.message);
    }
    Command::ToggleAll { done, undone } => {
      let outcome = coordinator.toggle_all(done && !undone).await?;
      println!("Updated {} tasks", outcome.requested);
    }
    Command::ClearCompleted => {
      let outcome = coordinator.clear_completed().await?;
      println!("Deleted {} tasks", outcome.requested);
    }
    Command::Stats => {
      let stats = coordinator
        .store()
        .read(|store| selectors::stats(store.entities()));
      println!("{}\n", render::stats(&stats));
    }
    Command::Tags => {
      let tags = coordinator
        .store()
        .read(|store| selectors::all_tags(store.entities()));
      println!("{}\n", render::tags(&tags));
    }
  }
  Ok(())
}
