//! The task store: single owner of the task list, the user profile and the
//! NPC inbox.
//!
//! All operations are synchronous and infallible from the caller's point of
//! view. Persistence and reminder failures are logged and never roll back the
//! in-memory change. The store holds no timers: the host drives
//! [`TaskStore::check_for_overdue_tasks`] on an interval and may call
//! [`TaskStore::end_celebration`] / [`TaskStore::clear_highlight`] when its
//! own delay fires. Both signals also lapse on their own deadline.
//!
//! Mutations are announced on a broadcast channel, see [`TaskStore::subscribe`].

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use log::{debug, error, info, warn};
use tokio::sync::broadcast;

use crate::logutil::escape_log;
use crate::tasks::clock::{Clock, SystemClock};
use crate::tasks::npc::{default_roster, MessageGenerator, Outcome, DEFAULT_MAX_MESSAGES};
use crate::tasks::progression::XpRewardTable;
use crate::tasks::reminder::{ReminderQueue, ReminderRequest, ReminderService};
use crate::tasks::signal::{SignalToken, TransientSignal};
use crate::tasks::storage::{MemoryStorage, Persistence};
use crate::tasks::types::{
    AppTheme, CategoryStats, Npc, NpcMessage, Task, TaskCategory, TaskDifficulty, UserProfile,
};
use crate::validation::{sanitize_description, sanitize_title};

pub const DEFAULT_MAX_TITLE_CHARS: usize = 120;
pub const DEFAULT_MAX_DESCRIPTION_CHARS: usize = 2000;
pub const DEFAULT_CELEBRATION_SECS: i64 = 3;
pub const DEFAULT_HIGHLIGHT_SECS: i64 = 5;
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// 09:00, used when a task has a due date but no time.
pub fn default_due_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Tunables the store needs from the host configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    pub reward_table: XpRewardTable,
    pub reminders_enabled: bool,
    pub default_due_time: NaiveTime,
    pub celebration: Duration,
    pub highlight: Duration,
    pub max_messages: usize,
    pub max_title_chars: usize,
    pub max_description_chars: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            reward_table: XpRewardTable::default(),
            reminders_enabled: true,
            default_due_time: default_due_time(),
            celebration: Duration::seconds(DEFAULT_CELEBRATION_SECS),
            highlight: Duration::seconds(DEFAULT_HIGHLIGHT_SECS),
            max_messages: DEFAULT_MAX_MESSAGES,
            max_title_chars: DEFAULT_MAX_TITLE_CHARS,
            max_description_chars: DEFAULT_MAX_DESCRIPTION_CHARS,
        }
    }
}

/// User request to create a top-level task.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub difficulty: TaskDifficulty,
    pub category: TaskCategory,
    pub due_date: Option<NaiveDate>,
    pub due_time: Option<NaiveTime>,
    pub has_reminder: bool,
}

impl NewTask {
    pub fn new(title: impl Into<String>, difficulty: TaskDifficulty, category: TaskCategory) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            difficulty,
            category,
            due_date: None,
            due_time: None,
            has_reminder: false,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn due(mut self, date: NaiveDate, time: Option<NaiveTime>) -> Self {
        self.due_date = Some(date);
        self.due_time = time;
        self
    }

    pub fn reminder(mut self, has_reminder: bool) -> Self {
        self.has_reminder = has_reminder;
        self
    }
}

/// Change notifications published after each mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    TaskAdded { task_id: String },
    TaskCompleted { task_id: String, xp_awarded: i64 },
    TaskDeleted { task_id: String, removed: usize },
    CompletedCleared { removed: usize },
    TaskOverdue { task_id: String },
    MessageReceived { message_id: String, is_failure: bool },
    ProfileChanged,
    CelebrationStarted { token: SignalToken },
    TaskHighlighted { task_id: String, token: SignalToken },
}

/// Assembles a [`TaskStore`] from its collaborators. Anything not supplied
/// falls back to in-memory storage, an in-process reminder queue, the system
/// clock and the built-in NPC roster.
pub struct TaskStoreBuilder {
    persistence: Box<dyn Persistence>,
    reminders: Box<dyn ReminderService>,
    clock: Box<dyn Clock>,
    npcs: Vec<Npc>,
    rng_seed: Option<u64>,
    settings: StoreSettings,
}

impl Default for TaskStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStoreBuilder {
    pub fn new() -> Self {
        Self {
            persistence: Box::new(MemoryStorage::new()),
            reminders: Box::new(ReminderQueue::new()),
            clock: Box::new(SystemClock),
            npcs: default_roster(),
            rng_seed: None,
            settings: StoreSettings::default(),
        }
    }

    pub fn persistence(mut self, persistence: impl Persistence + 'static) -> Self {
        self.persistence = Box::new(persistence);
        self
    }

    pub fn reminders(mut self, reminders: impl ReminderService + 'static) -> Self {
        self.reminders = Box::new(reminders);
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn roster(mut self, npcs: Vec<Npc>) -> Self {
        self.npcs = npcs;
        self
    }

    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn settings(mut self, settings: StoreSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Build an empty store without touching persistence.
    pub fn build(self) -> TaskStore {
        let mut generator =
            MessageGenerator::new(self.npcs).with_max_messages(self.settings.max_messages);
        if let Some(seed) = self.rng_seed {
            generator = generator.with_seed(seed);
        }
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        TaskStore {
            tasks: Vec::new(),
            profile: UserProfile::default(),
            category_stats: BTreeMap::new(),
            generator,
            overdue_notified: HashSet::new(),
            celebration: TransientSignal::new(self.settings.celebration),
            highlight: TransientSignal::new(self.settings.highlight),
            persistence: self.persistence,
            reminders: self.reminders,
            clock: self.clock,
            settings: self.settings,
            events,
        }
    }

    /// Build and load persisted state, see [`TaskStore::initialize`].
    pub fn open(self) -> TaskStore {
        let mut store = self.build();
        store.initialize();
        store
    }
}

pub struct TaskStore {
    tasks: Vec<Task>,
    profile: UserProfile,
    category_stats: BTreeMap<TaskCategory, CategoryStats>,
    generator: MessageGenerator,
    overdue_notified: HashSet<String>,
    celebration: TransientSignal<()>,
    highlight: TransientSignal<String>,
    persistence: Box<dyn Persistence>,
    reminders: Box<dyn ReminderService>,
    clock: Box<dyn Clock>,
    settings: StoreSettings,
    events: broadcast::Sender<StoreEvent>,
}

impl TaskStore {
    pub fn builder() -> TaskStoreBuilder {
        TaskStoreBuilder::new()
    }

    /// Load tasks, profile and inbox, re-arm future reminders, greet a fresh
    /// inbox with one message per category and run the overdue scan once.
    pub fn initialize(&mut self) {
        let armed = self.reload();

        if self.generator.messages().is_empty() {
            self.seed_welcome_messages();
        }

        info!(
            "Task store ready: {} tasks, level {} ({} XP), {} reminders armed",
            self.tasks.len(),
            self.profile.level,
            self.profile.total_xp,
            armed
        );

        self.check_for_overdue_tasks();
    }

    /// Re-read tasks, profile, inbox and the overdue-notified set from
    /// persistence, replacing the in-memory copies. Hosts that share a data
    /// directory with other writers call this before mutating.
    ///
    /// Reminders are armed for active tasks that are new or whose due time
    /// changed since the last load, and cancelled for tasks that were
    /// completed or removed elsewhere. Returns how many reminders were armed.
    pub fn reload(&mut self) -> usize {
        let previous: HashMap<String, Task> = std::mem::take(&mut self.tasks)
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();
        self.tasks = self.persistence.load_tasks();

        let mut profile = self.persistence.load_profile().unwrap_or_default();
        profile.normalize();
        self.profile = profile;

        self.generator.restore_messages(self.persistence.load_messages());
        self.overdue_notified = self
            .persistence
            .load_overdue_notified()
            .into_iter()
            .collect();
        self.update_category_stats();

        for old in previous.values().filter(|t| t.has_reminder && !t.is_completed) {
            let still_pending = self
                .tasks
                .iter()
                .any(|t| t.id == old.id && t.has_reminder && !t.is_completed);
            if !still_pending {
                self.cancel_reminder(old);
            }
        }

        let armed = self
            .tasks
            .iter()
            .filter(|t| t.has_reminder && !t.is_completed)
            .filter(|t| match previous.get(&t.id) {
                Some(old) => {
                    old.is_completed
                        || !old.has_reminder
                        || old.due_date != t.due_date
                        || old.due_time != t.due_time
                }
                None => true,
            })
            .filter(|t| self.schedule_reminder(t))
            .count();
        debug!("Reloaded {} tasks, {} reminders armed", self.tasks.len(), armed);
        armed
    }

    fn seed_welcome_messages(&mut self) {
        let now = self.clock.now();
        for category in TaskCategory::ALL {
            if let Some(message) = self.generator.generate(category, Outcome::Success, now) {
                self.emit_message(&message);
            }
        }
        debug!("Seeded {} welcome messages", self.generator.messages().len());
        self.persist_messages();
    }

    // ---- mutations ----

    /// Create a top-level task. Returns `None` when the title is blank or
    /// too long, leaving the store unchanged.
    pub fn add_task(&mut self, new: NewTask) -> Option<String> {
        let title = match sanitize_title(&new.title, self.settings.max_title_chars) {
            Ok(title) => title,
            Err(e) => {
                warn!("Rejected task '{}': {}", escape_log(&new.title), e);
                return None;
            }
        };
        let description =
            sanitize_description(&new.description, self.settings.max_description_chars);
        let task = Task::new(
            &title,
            &description,
            new.difficulty,
            new.category,
            self.clock.now(),
        )
        .with_due(new.due_date, new.due_time)
        .with_reminder(new.has_reminder);
        let task_id = task.id.clone();

        info!(
            "Added task {} [{} / {}]: {}",
            task_id,
            task.category,
            task.difficulty,
            escape_log(&task.title)
        );
        if task.has_reminder {
            self.schedule_reminder(&task);
        }

        self.tasks.push(task);
        self.update_category_stats();
        self.persist_tasks();
        self.emit(StoreEvent::TaskAdded {
            task_id: task_id.clone(),
        });
        Some(task_id)
    }

    /// Attach a subtask to an existing task. The subtask inherits the parent's
    /// category. Unknown parents and blank titles are ignored.
    pub fn add_subtask(
        &mut self,
        parent_id: &str,
        title: &str,
        description: &str,
        difficulty: TaskDifficulty,
    ) -> Option<String> {
        let Some(parent_index) = self.index_of(parent_id) else {
            warn!("Cannot add subtask: parent {} not found", escape_log(parent_id));
            return None;
        };
        let title = match sanitize_title(title, self.settings.max_title_chars) {
            Ok(title) => title,
            Err(e) => {
                warn!("Rejected subtask '{}': {}", escape_log(title), e);
                return None;
            }
        };
        let description = sanitize_description(description, self.settings.max_description_chars);
        let category = self.tasks[parent_index].category;
        let subtask = Task::new(&title, &description, difficulty, category, self.clock.now())
            .with_parent(parent_id);
        let subtask_id = subtask.id.clone();

        self.tasks[parent_index].subtasks.push(subtask_id.clone());
        self.tasks.push(subtask);
        info!("Added subtask {} under {}", subtask_id, parent_id);

        self.update_category_stats();
        self.persist_tasks();
        self.emit(StoreEvent::TaskAdded {
            task_id: subtask_id.clone(),
        });
        Some(subtask_id)
    }

    /// Complete a task. Top-level tasks earn XP and an NPC message; any task
    /// raises the celebration. Returns `false` for unknown or already
    /// completed tasks.
    pub fn complete_task(&mut self, task_id: &str) -> bool {
        let Some(index) = self.index_of(task_id) else {
            warn!("Cannot complete task {}: not found", escape_log(task_id));
            return false;
        };
        if self.tasks[index].is_completed {
            debug!("Task {} already completed", task_id);
            return false;
        }

        let now = self.clock.now();
        let task = self.tasks[index].completed(now);
        self.tasks[index] = task.clone();
        self.cancel_reminder(&task);

        let mut xp_awarded = 0;
        if !task.is_subtask() {
            if let Some(message) = self.generator.generate(task.category, Outcome::Success, now) {
                self.emit_message(&message);
            }
            xp_awarded = task.xp_reward(self.settings.reward_table);
            self.award_xp(task.category, xp_awarded, now);
        }

        self.update_category_stats();
        let token = self.celebration.raise((), now);
        info!(
            "Completed task {} (+{} XP): {}",
            task.id,
            xp_awarded,
            escape_log(&task.title)
        );

        self.persist_tasks();
        self.persist_messages();
        self.emit(StoreEvent::TaskCompleted {
            task_id: task.id,
            xp_awarded,
        });
        self.emit(StoreEvent::CelebrationStarted { token });
        true
    }

    /// Complete a subtask through the checklist path, which does award XP.
    pub fn complete_subtask(&mut self, subtask_id: &str) -> bool {
        let Some(index) = self.index_of(subtask_id) else {
            warn!("Cannot complete subtask {}: not found", escape_log(subtask_id));
            return false;
        };
        let current = &self.tasks[index];
        if current.is_completed || !current.is_subtask() {
            debug!("Subtask {} ignored (completed or top-level)", subtask_id);
            return false;
        }

        let now = self.clock.now();
        let subtask = current.completed(now);
        self.tasks[index] = subtask.clone();
        self.persist_tasks();
        self.update_category_stats();

        let xp_awarded = subtask.xp_reward(self.settings.reward_table);
        self.award_xp(subtask.category, xp_awarded, now);
        info!(
            "Completed subtask {} (+{} XP): {}",
            subtask.id,
            xp_awarded,
            escape_log(&subtask.title)
        );
        self.emit(StoreEvent::TaskCompleted {
            task_id: subtask.id,
            xp_awarded,
        });
        true
    }

    /// Remove a task and everything beneath it.
    pub fn delete_task(&mut self, task_id: &str) -> bool {
        let Some(task) = self.task(task_id).cloned() else {
            warn!("Cannot delete task {}: not found", escape_log(task_id));
            return false;
        };

        if task.is_completed && !task.is_subtask() {
            let xp = task.xp_reward(self.settings.reward_table);
            self.profile.revoke(task.category, xp);
            info!("Reversed {} XP for deleted task {}", xp, task.id);
            self.persist_profile();
            self.emit(StoreEvent::ProfileChanged);
        }

        if !task.is_completed && !task.is_subtask() && !task.is_overdue(self.clock.local_now()) {
            let now = self.clock.now();
            if let Some(message) = self.generator.generate(task.category, Outcome::Failure, now) {
                self.emit_message(&message);
                self.persist_messages();
            }
        }

        let doomed = self.with_descendants(&task.id);
        let removed: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| doomed.contains(&t.id))
            .cloned()
            .collect();
        self.tasks.retain(|t| !doomed.contains(&t.id));
        if let Some(parent_id) = &task.parent_task_id {
            if let Some(parent) = self.tasks.iter_mut().find(|t| &t.id == parent_id) {
                parent.subtasks.retain(|id| id != &task.id);
            }
        }
        for t in &removed {
            self.cancel_reminder(t);
        }
        info!(
            "Deleted task {} ({} removed): {}",
            task.id,
            removed.len(),
            escape_log(&task.title)
        );

        self.persist_tasks();
        if self.prune_overdue_notified() {
            self.persist_overdue_notified();
        }
        self.update_category_stats();
        self.emit(StoreEvent::TaskDeleted {
            task_id: task.id,
            removed: removed.len(),
        });
        true
    }

    /// Drop every completed task without touching earned XP. Open subtasks
    /// of a removed parent stay and become top-level tasks. Returns how many
    /// tasks were removed.
    pub fn delete_all_completed(&mut self) -> usize {
        let doomed: HashSet<String> = self
            .tasks
            .iter()
            .filter(|t| t.is_completed)
            .map(|t| t.id.clone())
            .collect();
        if doomed.is_empty() {
            debug!("No completed tasks to clear");
            return 0;
        }

        self.tasks.retain(|t| !doomed.contains(&t.id));
        let mut promoted = 0;
        for task in self.tasks.iter_mut() {
            task.subtasks.retain(|id| !doomed.contains(id));
            if task
                .parent_task_id
                .as_ref()
                .is_some_and(|parent| doomed.contains(parent))
            {
                task.parent_task_id = None;
                promoted += 1;
            }
        }
        info!(
            "Cleared {} completed tasks, {} open subtasks promoted",
            doomed.len(),
            promoted
        );

        self.persist_tasks();
        if self.prune_overdue_notified() {
            self.persist_overdue_notified();
        }
        self.update_category_stats();
        self.emit(StoreEvent::CompletedCleared {
            removed: doomed.len(),
        });
        doomed.len()
    }

    /// Send one failure message for each top-level task that became overdue
    /// since it was last seen. Returns the ids reported by this call.
    pub fn check_for_overdue_tasks(&mut self) -> Vec<String> {
        let local_now = self.clock.local_now();
        let now = self.clock.now();

        let newly_overdue: Vec<(String, TaskCategory)> = self
            .tasks
            .iter()
            .filter(|t| !t.is_completed && !t.is_subtask() && t.due_date.is_some())
            .filter(|t| t.is_overdue(local_now) && !self.overdue_notified.contains(&t.id))
            .map(|t| (t.id.clone(), t.category))
            .collect();

        for (task_id, category) in &newly_overdue {
            info!("Task {} is overdue", task_id);
            if let Some(message) = self.generator.generate(*category, Outcome::Failure, now) {
                self.emit_message(&message);
            }
            self.overdue_notified.insert(task_id.clone());
            self.emit(StoreEvent::TaskOverdue {
                task_id: task_id.clone(),
            });
        }

        let pruned = self.prune_overdue_notified();
        if !newly_overdue.is_empty() {
            self.persist_messages();
        }
        if !newly_overdue.is_empty() || pruned {
            self.persist_overdue_notified();
        }
        newly_overdue.into_iter().map(|(id, _)| id).collect()
    }

    pub fn update_theme(&mut self, theme: AppTheme) {
        if self.profile.selected_theme == theme {
            return;
        }
        self.profile.selected_theme = theme;
        info!("Theme changed to {:?}", theme);
        self.persist_profile();
        self.emit(StoreEvent::ProfileChanged);
    }

    /// Spotlight a task, e.g. after the user follows a reminder link.
    pub fn highlight_task(&mut self, task_id: &str) -> Option<SignalToken> {
        if self.index_of(task_id).is_none() {
            warn!("Cannot highlight task {}: not found", escape_log(task_id));
            return None;
        }
        let token = self.highlight.raise(task_id.to_string(), self.clock.now());
        self.emit(StoreEvent::TaskHighlighted {
            task_id: task_id.to_string(),
            token,
        });
        Some(token)
    }

    /// Clear the highlight if `token` belongs to the latest request.
    pub fn clear_highlight(&mut self, token: SignalToken) -> bool {
        self.highlight.expire(token)
    }

    pub fn end_celebration(&mut self, token: SignalToken) -> bool {
        self.celebration.expire(token)
    }

    pub fn generate_debug_failure_message(&mut self) -> Option<NpcMessage> {
        let message = self
            .generator
            .generate(TaskCategory::Work, Outcome::Failure, self.clock.now())?;
        self.emit_message(&message);
        self.persist_messages();
        Some(message)
    }

    pub fn mark_message_read(&mut self, message_id: &str) -> bool {
        let changed = self.generator.mark_read(message_id);
        if changed {
            self.persist_messages();
        }
        changed
    }

    pub fn mark_all_messages_read(&mut self) {
        if self.generator.unread_count() == 0 {
            return;
        }
        self.generator.mark_all_read();
        self.persist_messages();
    }

    // ---- queries ----

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Uncompleted top-level tasks.
    pub fn active_tasks(&self) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| !t.is_completed && !t.is_subtask())
            .collect()
    }

    pub fn completed_tasks(&self) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.is_completed && !t.is_subtask())
            .collect()
    }

    pub fn subtasks_of(&self, parent_id: &str) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.parent_task_id.as_deref() == Some(parent_id))
            .collect()
    }

    /// Active top-level tasks that are due within the next day.
    pub fn due_soon_tasks(&self) -> Vec<&Task> {
        let now = self.clock.local_now();
        self.active_tasks()
            .into_iter()
            .filter(|t| t.is_due_soon(now))
            .collect()
    }

    pub fn overdue_tasks(&self) -> Vec<&Task> {
        let now = self.clock.local_now();
        self.active_tasks()
            .into_iter()
            .filter(|t| t.is_overdue(now))
            .collect()
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn category_stats(&self) -> &BTreeMap<TaskCategory, CategoryStats> {
        &self.category_stats
    }

    pub fn messages(&self) -> &[NpcMessage] {
        self.generator.messages()
    }

    pub fn unread_message_count(&self) -> usize {
        self.generator.unread_count()
    }

    pub fn npcs(&self) -> &[Npc] {
        self.generator.npcs()
    }

    pub fn primary_npc(&self, category: TaskCategory) -> Option<&Npc> {
        self.generator.primary_npc(category)
    }

    pub fn is_celebrating(&self) -> bool {
        self.celebration.is_active(self.clock.now())
    }

    pub fn highlighted_task(&self) -> Option<&str> {
        self.highlight
            .current(self.clock.now())
            .map(String::as_str)
    }

    pub fn can_schedule_reminders(&self) -> bool {
        self.settings.reminders_enabled && self.reminders.can_schedule_exact_alarms()
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Wall-clock time that due dates are compared against.
    pub fn local_now(&self) -> NaiveDateTime {
        self.clock.local_now()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    // ---- internals ----

    fn index_of(&self, task_id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == task_id)
    }

    /// `root` plus every task that descends from it.
    fn with_descendants(&self, root: &str) -> HashSet<String> {
        let mut ids: HashSet<String> = HashSet::from([root.to_string()]);
        let mut frontier = vec![root.to_string()];
        while let Some(parent) = frontier.pop() {
            for child in self
                .tasks
                .iter()
                .filter(|t| t.parent_task_id.as_deref() == Some(parent.as_str()))
            {
                if ids.insert(child.id.clone()) {
                    frontier.push(child.id.clone());
                }
            }
        }
        ids
    }

    fn award_xp(&mut self, category: TaskCategory, xp: i64, at: DateTime<Utc>) {
        let level_before = self.profile.level;
        self.profile.award(category, xp, at);
        if self.profile.level > level_before {
            info!("Level up: {} -> {}", level_before, self.profile.level);
        }
        self.persist_profile();
        self.emit(StoreEvent::ProfileChanged);
    }

    fn update_category_stats(&mut self) {
        self.category_stats = TaskCategory::ALL
            .iter()
            .map(|c| {
                let stats = CategoryStats::from_tasks(self.tasks.iter().filter(|t| t.category == *c));
                (*c, stats)
            })
            .collect();
    }

    /// Drop notified ids whose task is gone or completed. Returns whether any were dropped.
    fn prune_overdue_notified(&mut self) -> bool {
        let before = self.overdue_notified.len();
        let tasks = &self.tasks;
        self.overdue_notified
            .retain(|id| tasks.iter().any(|t| &t.id == id && !t.is_completed));
        self.overdue_notified.len() != before
    }

    /// Ask the reminder service to fire at the task's due instant. Returns
    /// whether a reminder is now pending.
    fn schedule_reminder(&self, task: &Task) -> bool {
        if !self.settings.reminders_enabled {
            debug!("Reminders disabled; not scheduling {}", task.id);
            return false;
        }
        let Some(due_local) = task.due_datetime(self.settings.default_due_time) else {
            debug!("Task {} has no due date; no reminder", task.id);
            return false;
        };
        let Some(fire_at) = self.clock.local_to_utc(due_local) else {
            warn!("Cannot resolve local due time {} for task {}", due_local, task.id);
            return false;
        };
        if fire_at <= self.clock.now() {
            warn!(
                "Cannot schedule reminder for task {}: due time {} is in the past",
                task.id, due_local
            );
            return false;
        }
        match self.reminders.schedule(&ReminderRequest::for_task(task, fire_at)) {
            Ok(()) => {
                info!("Reminder scheduled for task {} at {}", task.id, fire_at);
                true
            }
            Err(e) => {
                warn!("Reminder for task {} not scheduled: {}", task.id, e);
                false
            }
        }
    }

    fn cancel_reminder(&self, task: &Task) {
        if !task.has_reminder {
            return;
        }
        if let Err(e) = self.reminders.cancel(&task.id) {
            warn!("Failed to cancel reminder for task {}: {}", task.id, e);
        }
    }

    fn emit(&self, event: StoreEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    fn emit_message(&self, message: &NpcMessage) {
        self.emit(StoreEvent::MessageReceived {
            message_id: message.id.clone(),
            is_failure: message.is_failure,
        });
    }

    fn persist_tasks(&self) {
        if let Err(e) = self.persistence.save_tasks(&self.tasks) {
            error!("Error saving tasks: {}", e);
        }
    }

    fn persist_profile(&self) {
        if let Err(e) = self.persistence.save_profile(&self.profile) {
            error!("Error saving profile: {}", e);
        }
    }

    fn persist_messages(&self) {
        if let Err(e) = self.persistence.save_messages(self.generator.messages()) {
            error!("Error saving messages: {}", e);
        }
    }

    fn persist_overdue_notified(&self) {
        let mut ids: Vec<String> = self.overdue_notified.iter().cloned().collect();
        ids.sort();
        if let Err(e) = self.persistence.save_overdue_notified(&ids) {
            warn!("Error saving overdue state: {}", e);
        }
    }
}
