use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use std::path::PathBuf;
use taskmaster::{
    AnthropicGenerator, Config, EventSink, StoreEvent, SuggestionSession, Task, TaskStore, open_backend,
};
use tokio::sync::mpsc;
use tracing::Level;

#[derive(Parser)]
#[command(name = "taskmaster")]
#[command(about = "Taskmaster - organize your life, one task at a time")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the store directory (overrides config)
    #[arg(short, long)]
    store_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Show active and completed tasks
    List,

    /// Mark a task completed, or active again
    Toggle {
        /// Task id, or a unique prefix/suffix of it
        id: String,
    },

    /// Delete a task
    Delete {
        /// Task id, or a unique prefix/suffix of it
        id: String,
    },

    /// Move an active task to just before another active task
    Move { dragged: String, target: String },

    /// Remove all completed tasks
    Clear,

    /// Ask the AI for task suggestions about a topic
    Suggest {
        #[arg(required = true)]
        topic: Vec<String>,

        /// Add suggestion number N (repeatable)
        #[arg(short, long = "add", value_name = "N")]
        add: Vec<usize>,

        /// Add every suggestion
        #[arg(long, conflicts_with = "add")]
        all: bool,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(path) = cli.store_path {
        config.storage.path = Some(path);
    }

    let command = match cli.command {
        Commands::Config => {
            print!("{}", serde_yaml::to_string(&config)?);
            return Ok(());
        }
        command => command,
    };

    let backend = open_backend(config.storage.backend, &config.storage.store_path())?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut store = TaskStore::open(backend, config.storage.key.clone()).with_events(tx.clone());

    let outcome = run(command, &config, &mut store, tx).await;

    while let Ok(event) = rx.try_recv() {
        notify(&event);
    }

    outcome
}

async fn run(command: Commands, config: &Config, store: &mut TaskStore, events: EventSink) -> Result<()> {
    match command {
        Commands::Add { text } => {
            store.add(&text.join(" "))?;
        }
        Commands::List => print_tasks(store),
        Commands::Toggle { id } => {
            let id = resolve_id(store, &id)?;
            store.toggle_complete(&id)?;
        }
        Commands::Delete { id } => {
            let id = resolve_id(store, &id)?;
            store.delete(&id)?;
        }
        Commands::Move { dragged, target } => {
            let dragged = resolve_id(store, &dragged)?;
            let target = resolve_id(store, &target)?;
            store.reorder(&dragged, &target)?;
        }
        Commands::Clear => {
            store.clear_completed();
        }
        Commands::Suggest { topic, add, all } => {
            let generator = AnthropicGenerator::from_config(&config.suggest)?;
            let mut session = SuggestionSession::new(generator).with_events(events);
            let suggestions = session.request_suggestions(&topic.join(" ")).await?;

            if all {
                while !session.suggestions().is_empty() {
                    session.accept_at(0, store)?;
                }
            } else if !add.is_empty() {
                // Resolve numbers against the list as shown, before it shrinks
                let picks = add
                    .iter()
                    .map(|n| {
                        n.checked_sub(1)
                            .and_then(|i| suggestions.get(i))
                            .cloned()
                            .ok_or_else(|| eyre!("No suggestion #{}", n))
                    })
                    .collect::<Result<Vec<_>>>()?;
                for text in picks {
                    session.accept_suggestion(&text, store)?;
                }
            } else {
                for (i, suggestion) in suggestions.iter().enumerate() {
                    println!("  {:>2}. {}", i + 1, suggestion);
                }
                if !suggestions.is_empty() {
                    println!("{}", "Add with --add N or --all".dimmed());
                }
            }
        }
        // Printed by main before any store is opened
        Commands::Config => {}
    }

    Ok(())
}

/// Find the one task whose id equals, starts with, or ends with `query`
fn resolve_id(store: &TaskStore, query: &str) -> Result<String> {
    let query = query.trim();
    if query.is_empty() {
        return Err(eyre!("Task id cannot be empty"));
    }

    let matches: Vec<&Task> = store
        .tasks()
        .iter()
        .filter(|t| t.id == query || t.id.starts_with(query) || t.id.ends_with(query))
        .collect();

    match matches.as_slice() {
        [task] => Ok(task.id.clone()),
        [] => Err(eyre!("No task matches '{}'", query)),
        many => Err(eyre!("'{}' is ambiguous ({} tasks match)", query, many.len())),
    }
}

/// Last 8 characters of an id
fn short_id(id: &str) -> &str {
    // UUID v7 leads with the timestamp, so the tail is what tells tasks apart.
    // Stored ids are not guaranteed ASCII, so cut on a char boundary.
    id.char_indices().rev().nth(7).map_or(id, |(i, _)| &id[i..])
}

fn created_label(task: &Task) -> String {
    chrono::DateTime::from_timestamp_millis(task.created_at)
        .map(|dt| dt.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn print_tasks(store: &TaskStore) {
    let active = store.active_partition();
    let completed = store.completed_partition();

    println!("{}", "Active Tasks".bold());
    if active.is_empty() {
        println!("  {}", "All caught up! Add a new task or ask for suggestions.".dimmed());
    }
    for task in active {
        println!(
            "  [ ] {} {}  {}",
            short_id(&task.id).cyan(),
            task.text,
            created_label(task).dimmed()
        );
    }

    if !completed.is_empty() {
        println!();
        println!("{}", "Completed Tasks".bold());
        for task in completed {
            println!(
                "  [{}] {} {}  {}",
                "x".green(),
                short_id(&task.id).cyan(),
                task.text.strikethrough(),
                created_label(task).dimmed()
            );
        }
    }
}

fn notify(event: &StoreEvent) {
    match event {
        StoreEvent::TaskAdded(task) => println!("{} \"{}\" has been added", "Task added:".green(), task.text),
        StoreEvent::TaskToggled(task) if task.completed => {
            println!("{} \"{}\"", "Task completed:".green(), task.text)
        }
        StoreEvent::TaskToggled(task) => println!("{} \"{}\"", "Task marked active:".green(), task.text),
        StoreEvent::TaskDeleted(task) => println!("{} \"{}\" removed", "Task deleted:".red(), task.text),
        StoreEvent::TasksReordered { .. } => println!("{}", "Tasks reordered".green()),
        StoreEvent::CompletedCleared { count: 0 } => {
            println!("{}", "No completed tasks to clear".yellow())
        }
        StoreEvent::CompletedCleared { count } => {
            println!("{} {} task(s) removed", "Completed tasks cleared:".green(), count)
        }
        StoreEvent::SuggestionsLoaded { topic, count: 0 } => {
            println!("{} for \"{}\"", "No suggestions".yellow(), topic)
        }
        StoreEvent::SuggestionsLoaded { count, .. } => {
            println!("{} found {} task(s) for you", "Suggestions loaded:".green(), count)
        }
        StoreEvent::SuggestionsFailed { message, .. } => {
            eprintln!("{} {}", "Failed to get suggestions:".red(), message)
        }
        StoreEvent::StorageFailed { message } => {
            eprintln!("{} changes kept in memory only: {}", "Warning:".yellow(), message)
        }
    }
}
