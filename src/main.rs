//! Binary entrypoint for the taskquest CLI.
//!
//! Commands:
//! - `init` - write a starter `taskquest.toml` and an empty data directory
//! - `add`, `subtask`, `complete`, `complete-subtask`, `delete`, `clear-completed` - edit tasks
//! - `list [--all]`, `profile`, `ranks`, `messages [--mark-read]` - inspect state
//! - `theme <name>` - pick a profile theme
//! - `check` - run one overdue scan
//! - `watch` - scan for overdue tasks and deliver reminders until Ctrl-C
//!
//! Task ids may be abbreviated to any unique prefix.
use anyhow::{anyhow, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use log::{info, warn};

use taskquest::config::Config;
use taskquest::tasks::{
    calculate_progress_to_next_level, calculate_progress_to_next_rank, calculate_xp_for_next_level,
    default_roster, load_npcs_from_json, parse_deep_link, rank_info, rank_table, AppTheme,
    CategoryRankLevel, JsonStorage, NewTask, ReminderQueue, StoreEvent, StoreSettings, Task,
    TaskCategory, TaskDifficulty, TaskStore,
};

#[derive(Parser)]
#[command(name = "taskquest")]
#[command(about = "A to-do list where finishing things earns XP and the Zone talks back")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "taskquest.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and prepare the data directory
    Init,
    /// Add a task
    Add {
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        /// easy, medium, hard or nightmare
        #[arg(short = 'x', long, default_value = "medium")]
        difficulty: TaskDifficulty,
        /// work, study, health, personal, shopping or other
        #[arg(short = 'g', long, default_value = "other")]
        category: TaskCategory,
        /// Due date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        due: Option<NaiveDate>,
        /// Due time (HH:MM); needs --due
        #[arg(long, value_parser = parse_time, requires = "due")]
        at: Option<NaiveTime>,
        /// Fire a reminder at the due time
        #[arg(short, long, requires = "due")]
        remind: bool,
    },
    /// Add a subtask under an existing task
    Subtask {
        parent: String,
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short = 'x', long, default_value = "easy")]
        difficulty: TaskDifficulty,
    },
    /// Complete a task
    Complete { task: String },
    /// Tick off a subtask
    CompleteSubtask { subtask: String },
    /// Delete a task and its subtasks
    Delete { task: String },
    /// Remove every completed task
    ClearCompleted,
    /// List tasks
    List {
        /// Include completed tasks
        #[arg(short, long)]
        all: bool,
    },
    /// Show level, XP and category ranks
    Profile,
    /// Show the rank ladder for a category
    Ranks { category: TaskCategory },
    /// Show NPC messages
    Messages {
        /// Mark everything as read after printing
        #[arg(short, long)]
        mark_read: bool,
    },
    /// Choose a theme: zone-explorer, radiation or pripyat
    Theme { theme: AppTheme },
    /// Scan once for overdue tasks
    Check,
    /// Keep running: overdue scans and reminders until Ctrl-C
    Watch,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|e| format!("expected HH:MM: {}", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        return run_init(&cli.config).await;
    }

    let config = Config::load(&cli.config).await?;
    init_logging(&Some(config.clone()), cli.verbose);

    let reminders = ReminderQueue::new();
    let mut store = open_store(&config, reminders.clone())?;

    match cli.command {
        Commands::Init => unreachable!("handled above"),
        Commands::Add {
            title,
            description,
            difficulty,
            category,
            due,
            at,
            remind,
        } => {
            let mut new = NewTask::new(title, difficulty, category)
                .description(description)
                .reminder(remind);
            if let Some(date) = due {
                new = new.due(date, at);
            }
            match store.add_task(new) {
                Some(id) => {
                    println!("Added {}", short_id(&id));
                    if remind && !store.can_schedule_reminders() {
                        println!("Note: reminders are disabled, none will fire.");
                    }
                }
                None => return Err(anyhow!("Task not added: title must not be blank")),
            }
        }
        Commands::Subtask {
            parent,
            title,
            description,
            difficulty,
        } => {
            let parent_id = resolve_task_id(&store, &parent)?;
            let id = store
                .add_subtask(&parent_id, &title, &description, difficulty)
                .ok_or_else(|| anyhow!("Subtask not added: title must not be blank"))?;
            println!("Added subtask {}", short_id(&id));
        }
        Commands::Complete { task } => {
            let id = resolve_task_id(&store, &task)?;
            let mut events = store.subscribe();
            if store.complete_task(&id) {
                print_new_messages(&store, &mut events);
                print_level(&store);
            } else {
                println!("Already completed.");
            }
        }
        Commands::CompleteSubtask { subtask } => {
            let id = resolve_task_id(&store, &subtask)?;
            if store.complete_subtask(&id) {
                print_level(&store);
            } else {
                println!("Not an open subtask.");
            }
        }
        Commands::Delete { task } => {
            let id = resolve_task_id(&store, &task)?;
            let mut events = store.subscribe();
            store.delete_task(&id);
            print_new_messages(&store, &mut events);
            println!("Deleted {}", short_id(&id));
        }
        Commands::ClearCompleted => {
            let removed = store.delete_all_completed();
            println!("Cleared {} completed task(s)", removed);
        }
        Commands::List { all } => print_tasks(&store, all),
        Commands::Profile => print_profile(&store),
        Commands::Ranks { category } => print_ranks(&store, category),
        Commands::Messages { mark_read } => {
            for message in store.messages() {
                println!(
                    "{} {} [{}] {}: {}",
                    if message.is_read { " " } else { "*" },
                    message.timestamp.format("%Y-%m-%d %H:%M"),
                    message.category,
                    message.npc_name,
                    message.message
                );
            }
            println!("{} unread", store.unread_message_count());
            if mark_read {
                store.mark_all_messages_read();
            }
        }
        Commands::Theme { theme } => {
            store.update_theme(theme);
            println!("Theme: {:?} ({})", theme, theme.description());
        }
        Commands::Check => {
            let mut events = store.subscribe();
            let overdue = store.check_for_overdue_tasks();
            print_new_messages(&store, &mut events);
            println!("{} newly overdue task(s)", overdue.len());
            for task in store.due_soon_tasks() {
                print_task_line(&store, task, "due soon: ");
            }
        }
        Commands::Watch => run_watch(&config, &mut store, &reminders).await?,
    }

    Ok(())
}

async fn run_init(path: &str) -> Result<()> {
    info!("Initializing taskquest configuration");
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        warn!("Configuration file {} already exists; leaving it untouched", path);
    } else {
        Config::create_default(path).await?;
        info!("Configuration file created at {}", path);
    }
    let config = Config::load(path).await?;
    let store = open_store(&config, ReminderQueue::new())?;
    println!(
        "Ready: {} task(s), {} unread message(s) in {}",
        store.tasks().len(),
        store.unread_message_count(),
        config.storage.data_dir
    );
    Ok(())
}

fn open_store(config: &Config, reminders: ReminderQueue) -> Result<TaskStore> {
    let settings = StoreSettings::try_from(config)?;
    let storage = JsonStorage::open(&config.storage.data_dir)
        .map_err(|e| anyhow!("Failed to open data directory {}: {}", config.storage.data_dir, e))?
        .with_max_file_bytes(config.storage.max_file_bytes);
    let roster = match &config.store.npc_seed_file {
        Some(path) => load_npcs_from_json(path)
            .map_err(|e| anyhow!("Failed to load NPC roster {}: {}", path, e))?,
        None => default_roster(),
    };
    Ok(TaskStore::builder()
        .persistence(storage)
        .reminders(reminders)
        .roster(roster)
        .settings(settings)
        .open())
}

/// Periodic overdue scan plus reminder delivery. Each tick first reloads the
/// data directory so tasks and messages written by other runs are seen and
/// not overwritten.
async fn run_watch(config: &Config, store: &mut TaskStore, reminders: &ReminderQueue) -> Result<()> {
    use tokio::time::{interval, Duration};

    let period = Duration::from_secs(config.store.overdue_check_interval_secs);
    let mut ticker = interval(period);
    let mut events = store.subscribe();
    if !store.can_schedule_reminders() {
        warn!("Reminders are disabled; only overdue scans will run");
    }
    info!(
        "Watching {} task(s); scanning every {}s, Ctrl-C to stop",
        store.active_tasks().len(),
        period.as_secs()
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                store.reload();
                for notification in reminders.due(store.now()) {
                    let link = notification.deep_link();
                    println!("Reminder: {} [{}] {}", notification.title, notification.category, link);
                    if let Some(task_id) = parse_deep_link(&link) {
                        store.highlight_task(&task_id);
                    }
                }
                let overdue = store.check_for_overdue_tasks();
                if !overdue.is_empty() {
                    info!("{} task(s) went overdue", overdue.len());
                }
                print_new_messages(store, &mut events);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping watch loop");
                break;
            }
        }
    }
    Ok(())
}

fn resolve_task_id(store: &TaskStore, needle: &str) -> Result<String> {
    let needle = needle.trim();
    if needle.is_empty() {
        return Err(anyhow!("Task id must not be empty"));
    }
    let matches: Vec<&Task> = store
        .tasks()
        .iter()
        .filter(|t| t.id.starts_with(needle))
        .collect();
    match matches.as_slice() {
        [task] => Ok(task.id.clone()),
        [] => Err(anyhow!("No task matches '{}'", needle)),
        _ => Err(anyhow!("'{}' matches {} tasks; use more characters", needle, matches.len())),
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn print_new_messages(
    store: &TaskStore,
    events: &mut tokio::sync::broadcast::Receiver<StoreEvent>,
) {
    while let Ok(event) = events.try_recv() {
        if let StoreEvent::MessageReceived { message_id, .. } = event {
            if let Some(message) = store.messages().iter().find(|m| m.id == message_id) {
                println!("{}: \"{}\"", message.npc_name, message.message);
            }
        }
    }
}

fn print_level(store: &TaskStore) {
    let profile = store.profile();
    println!(
        "Level {} - {} / {} XP",
        profile.level,
        profile.total_xp,
        calculate_xp_for_next_level(profile.total_xp)
    );
}

fn print_task_line(store: &TaskStore, task: &Task, indent: &str) {
    let now = store.local_now();
    let mark = if task.is_completed { "x" } else { " " };
    let mut line = format!(
        "{}[{}] {} {} ({}, {})",
        indent,
        mark,
        short_id(&task.id),
        task.title,
        task.category,
        task.difficulty
    );
    if let Some(date) = task.due_date {
        line.push_str(&format!(" due {}", date));
        if let Some(time) = task.due_time {
            line.push_str(&format!(" {}", time.format("%H:%M")));
        }
    }
    if task.is_overdue(now) {
        line.push_str(" OVERDUE");
    } else if task.is_due_soon(now) {
        line.push_str(" soon");
    }
    if task.has_reminder {
        line.push_str(" (reminder)");
    }
    println!("{}", line);
}

fn print_tasks(store: &TaskStore, all: bool) {
    let mut top: Vec<&Task> = store.active_tasks();
    if all {
        top.extend(store.completed_tasks());
    }
    if top.is_empty() {
        println!("No tasks.");
        return;
    }
    for task in top {
        print_task_line(store, task, "");
        for sub in store.subtasks_of(&task.id) {
            if all || !sub.is_completed {
                print_task_line(store, sub, "    ");
            }
        }
    }
}

fn print_profile(store: &TaskStore) {
    let profile = store.profile();
    println!("Theme: {:?}", profile.selected_theme);
    print_level(store);
    println!(
        "Progress: {:.0}%",
        calculate_progress_to_next_level(profile.total_xp) * 100.0
    );
    for category in TaskCategory::ALL {
        let done = profile.tasks_completed(category) as i64;
        let rank = rank_info(category, done);
        let stats = store.category_stats().get(&category).copied().unwrap_or_default();
        println!(
            "  {:<9} lvl {:>2}  {:>6} XP  {:>4} done  {} ({:.0}% to next)  {}/{} tasks",
            category.as_str(),
            profile.category_level(category),
            profile.category_xp(category),
            done,
            rank.display_name,
            calculate_progress_to_next_rank(done) * 100.0,
            stats.completed_tasks,
            stats.total_tasks
        );
    }
}

fn print_ranks(store: &TaskStore, category: TaskCategory) {
    let done = store.profile().tasks_completed(category) as i64;
    if let Some(npc) = store.primary_npc(category) {
        println!("{} keeps the ledger for {}.", npc.name, category);
    }
    for (rank, info) in CategoryRankLevel::ALL.iter().zip(rank_table(category).iter()) {
        let held = done >= rank.required_tasks();
        println!(
            "{} {:<8} {:>6} tasks  {} - {}",
            if held { "*" } else { " " },
            rank.to_string(),
            rank.required_tasks(),
            info.display_name,
            info.description
        );
    }
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity wins over the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse::<log::LevelFilter>().ok())
            .unwrap_or(log::LevelFilter::Warn),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.clone())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    match log_file {
        Some(f) => {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            // Mirror to the console only for interactive use, or when asked for
            let echo = verbosity > 0 && atty::is(atty::Stream::Stderr);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if echo {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                writeln!(
                    fmt,
                    "{} [{}] {}",
                    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                    record.level(),
                    record.args()
                )
            });
        }
    }
    let _ = builder.try_init();
}
