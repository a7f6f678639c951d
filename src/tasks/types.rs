use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tasks::progression::{calculate_level, XpRewardTable};

pub const PROFILE_SCHEMA_VERSION: u8 = 1;

/// Fixed task classification; each category has independent progression.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskCategory {
    Work,
    Study,
    Health,
    Personal,
    Shopping,
    Other,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 6] = [
        TaskCategory::Work,
        TaskCategory::Study,
        TaskCategory::Health,
        TaskCategory::Personal,
        TaskCategory::Shopping,
        TaskCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Work => "WORK",
            TaskCategory::Study => "STUDY",
            TaskCategory::Health => "HEALTH",
            TaskCategory::Personal => "PERSONAL",
            TaskCategory::Shopping => "SHOPPING",
            TaskCategory::Other => "OTHER",
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "work" => Ok(TaskCategory::Work),
            "study" => Ok(TaskCategory::Study),
            "health" => Ok(TaskCategory::Health),
            "personal" => Ok(TaskCategory::Personal),
            "shopping" => Ok(TaskCategory::Shopping),
            "other" => Ok(TaskCategory::Other),
            other => Err(format!("unknown category '{}'", other)),
        }
    }
}

/// Ordinal difficulty; mapped to XP through an [`XpRewardTable`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskDifficulty {
    Easy,
    Medium,
    Hard,
    Nightmare,
}

impl fmt::Display for TaskDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskDifficulty::Easy => "EASY",
            TaskDifficulty::Medium => "MEDIUM",
            TaskDifficulty::Hard => "HARD",
            TaskDifficulty::Nightmare => "NIGHTMARE",
        };
        f.write_str(label)
    }
}

impl FromStr for TaskDifficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" | "e" => Ok(TaskDifficulty::Easy),
            "medium" | "m" => Ok(TaskDifficulty::Medium),
            "hard" | "h" => Ok(TaskDifficulty::Hard),
            "nightmare" | "n" => Ok(TaskDifficulty::Nightmare),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

/// Visual theme selected on the profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppTheme {
    #[default]
    ZoneExplorer,
    Radiation,
    Pripyat,
}

impl AppTheme {
    pub fn description(&self) -> &'static str {
        match self {
            AppTheme::ZoneExplorer => "A green theme inspired by the Zone's vegetation",
            AppTheme::Radiation => "A toxic yellow theme with radiation warnings",
            AppTheme::Pripyat => "A cold blue theme of the abandoned city",
        }
    }
}

impl FromStr for AppTheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "zone_explorer" | "zone" => Ok(AppTheme::ZoneExplorer),
            "radiation" => Ok(AppTheme::Radiation),
            "pripyat" => Ok(AppTheme::Pripyat),
            other => Err(format!("unknown theme '{}'", other)),
        }
    }
}

/// One to-do item. A task with a parent id is a subtask.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub difficulty: TaskDifficulty,
    pub category: TaskCategory,
    #[serde(default)]
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_time: Option<NaiveTime>,
    #[serde(default)]
    pub parent_task_id: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<String>,
    #[serde(default)]
    pub has_reminder: bool,
}

impl Task {
    pub fn new(
        title: &str,
        description: &str,
        difficulty: TaskDifficulty,
        category: TaskCategory,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: description.to_string(),
            difficulty,
            category,
            is_completed: false,
            created_at,
            completed_at: None,
            due_date: None,
            due_time: None,
            parent_task_id: None,
            subtasks: Vec::new(),
            has_reminder: false,
        }
    }

    pub fn with_due(mut self, date: Option<NaiveDate>, time: Option<NaiveTime>) -> Self {
        self.due_date = date;
        // a time without a date carries no meaning
        self.due_time = date.and(time);
        self
    }

    pub fn with_reminder(mut self, has_reminder: bool) -> Self {
        self.has_reminder = has_reminder;
        self
    }

    pub fn with_parent(mut self, parent_id: &str) -> Self {
        self.parent_task_id = Some(parent_id.to_string());
        self
    }

    /// Copy of this task marked completed at `at`.
    pub fn completed(&self, at: DateTime<Utc>) -> Self {
        Self {
            is_completed: true,
            completed_at: Some(at),
            ..self.clone()
        }
    }

    pub fn is_subtask(&self) -> bool {
        self.parent_task_id.is_some()
    }

    pub fn has_subtasks(&self) -> bool {
        !self.subtasks.is_empty()
    }

    pub fn xp_reward(&self, table: XpRewardTable) -> i64 {
        table.reward(self.difficulty)
    }

    /// Local due instant, substituting `default_time` when only a date is set.
    pub fn due_datetime(&self, default_time: NaiveTime) -> Option<NaiveDateTime> {
        self.due_date
            .map(|date| date.and_time(self.due_time.unwrap_or(default_time)))
    }

    /// Date-only tasks stay on time for the whole due day.
    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        if self.is_completed {
            return false;
        }
        match (self.due_date, self.due_time) {
            (Some(date), Some(time)) => now > date.and_time(time),
            (Some(date), None) => now.date() > date,
            _ => false,
        }
    }

    pub fn is_due_soon(&self, now: NaiveDateTime) -> bool {
        if self.is_completed {
            return false;
        }
        let Some(date) = self.due_date else {
            return false;
        };
        match self.due_time {
            Some(time) => {
                let due = date.and_time(time);
                now < due && due < now + Duration::days(1)
            }
            None => {
                let today = now.date();
                date == today || Some(date) == today.succ_opt()
            }
        }
    }
}

/// Accumulated progression. `level` and `category_levels` are derived caches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub total_xp: i64,
    pub level: u32,
    #[serde(default)]
    pub category_xp: BTreeMap<TaskCategory, i64>,
    #[serde(default)]
    pub category_levels: BTreeMap<TaskCategory, u32>,
    #[serde(default)]
    pub category_tasks_completed: BTreeMap<TaskCategory, u32>,
    #[serde(default)]
    pub selected_theme: AppTheme,
    /// Carried for display; no logic advances it yet.
    #[serde(default)]
    pub task_streak: u32,
    #[serde(default)]
    pub last_completed_task_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub schema_version: u8,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            total_xp: 0,
            level: 1,
            category_xp: TaskCategory::ALL.iter().map(|c| (*c, 0)).collect(),
            category_levels: TaskCategory::ALL.iter().map(|c| (*c, 1)).collect(),
            category_tasks_completed: TaskCategory::ALL.iter().map(|c| (*c, 0)).collect(),
            selected_theme: AppTheme::default(),
            task_streak: 0,
            last_completed_task_at: None,
            schema_version: PROFILE_SCHEMA_VERSION,
        }
    }
}

impl UserProfile {
    /// Restore the one-entry-per-category shape and recompute derived levels.
    /// Used after loading a profile written by an older or hand-edited file.
    pub fn normalize(&mut self) {
        self.total_xp = self.total_xp.max(0);
        for category in TaskCategory::ALL {
            let xp = self.category_xp.entry(category).or_insert(0);
            *xp = (*xp).max(0);
            self.category_tasks_completed.entry(category).or_insert(0);
        }
        self.recompute_levels();
        self.schema_version = PROFILE_SCHEMA_VERSION;
    }

    pub fn category_xp(&self, category: TaskCategory) -> i64 {
        self.category_xp.get(&category).copied().unwrap_or(0)
    }

    pub fn category_level(&self, category: TaskCategory) -> u32 {
        self.category_levels.get(&category).copied().unwrap_or(1)
    }

    pub fn tasks_completed(&self, category: TaskCategory) -> u32 {
        self.category_tasks_completed
            .get(&category)
            .copied()
            .unwrap_or(0)
    }

    /// Credit `xp` and one completed task to `category`.
    pub fn award(&mut self, category: TaskCategory, xp: i64, at: DateTime<Utc>) {
        self.total_xp += xp;
        *self.category_xp.entry(category).or_insert(0) += xp;
        *self.category_tasks_completed.entry(category).or_insert(0) += 1;
        self.last_completed_task_at = Some(at);
        self.recompute_levels();
    }

    /// Exact inverse of [`award`](Self::award); no counter goes below zero.
    pub fn revoke(&mut self, category: TaskCategory, xp: i64) {
        self.total_xp = (self.total_xp - xp).max(0);
        let category_xp = self.category_xp.entry(category).or_insert(0);
        *category_xp = (*category_xp - xp).max(0);
        let completed = self.category_tasks_completed.entry(category).or_insert(0);
        *completed = completed.saturating_sub(1);
        self.recompute_levels();
    }

    fn recompute_levels(&mut self) {
        self.level = calculate_level(self.total_xp);
        self.category_levels = TaskCategory::ALL
            .iter()
            .map(|c| (*c, calculate_level(self.category_xp(*c))))
            .collect();
    }
}

/// Flavor message delivered by an NPC after a task outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NpcMessage {
    pub id: String,
    pub npc_id: String,
    pub npc_name: String,
    pub npc_avatar: String,
    pub message: String,
    pub category: TaskCategory,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub is_failure: bool,
}

impl NpcMessage {
    pub fn new(
        npc: &Npc,
        message: &str,
        category: TaskCategory,
        is_failure: bool,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            npc_id: npc.id.clone(),
            npc_name: npc.name.clone(),
            npc_avatar: npc.avatar.clone(),
            message: message.to_string(),
            category,
            timestamp,
            is_read: false,
            is_failure,
        }
    }

    /// Read state only moves forward.
    pub fn mark_read(&mut self) {
        self.is_read = true;
    }
}

/// Static NPC reference data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Npc {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub category: TaskCategory,
    #[serde(default)]
    pub personality: String,
    pub completion_messages: Vec<String>,
    pub failure_messages: Vec<String>,
    #[serde(default)]
    pub is_primary: bool,
}

impl Npc {
    pub fn new(id: &str, name: &str, avatar: &str, category: TaskCategory) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            avatar: avatar.to_string(),
            category,
            personality: String::new(),
            completion_messages: Vec::new(),
            failure_messages: Vec::new(),
            is_primary: false,
        }
    }

    pub fn with_personality(mut self, personality: &str) -> Self {
        self.personality = personality.to_string();
        self
    }

    pub fn with_completion(mut self, lines: &[&str]) -> Self {
        self.completion_messages
            .extend(lines.iter().map(|l| l.to_string()));
        self
    }

    pub fn with_failure(mut self, lines: &[&str]) -> Self {
        self.failure_messages.extend(lines.iter().map(|l| l.to_string()));
        self
    }

    pub fn as_primary(mut self) -> Self {
        self.is_primary = true;
        self
    }
}

/// Per-category snapshot of the task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CategoryStats {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub completion_rate: f32,
}

impl CategoryStats {
    pub fn from_tasks<'a>(tasks: impl Iterator<Item = &'a Task>) -> Self {
        let mut stats = CategoryStats::default();
        for task in tasks {
            stats.total_tasks += 1;
            if task.is_completed {
                stats.completed_tasks += 1;
            }
        }
        if stats.total_tasks > 0 {
            stats.completion_rate = stats.completed_tasks as f32 / stats.total_tasks as f32;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_time(NaiveTime::parse_from_str(time, "%H:%M").unwrap())
    }

    fn task() -> Task {
        Task::new("Fix pump", "", TaskDifficulty::Easy, TaskCategory::Work, Utc::now())
    }

    #[test]
    fn date_only_task_is_due_all_day() {
        let t = task().with_due(NaiveDate::from_ymd_opt(2024, 3, 10), None);
        assert!(!t.is_overdue(at("2024-03-10", "23:59")));
        assert!(t.is_overdue(at("2024-03-11", "00:00")));
    }

    #[test]
    fn timed_task_goes_overdue_after_due_instant() {
        let t = task().with_due(
            NaiveDate::from_ymd_opt(2024, 3, 10),
            NaiveTime::from_hms_opt(14, 30, 0),
        );
        assert!(!t.is_overdue(at("2024-03-10", "14:30")));
        assert!(t.is_overdue(at("2024-03-10", "14:31")));
        assert!(!t.completed(Utc::now()).is_overdue(at("2024-03-11", "00:00")));
    }

    #[test]
    fn due_time_without_date_is_dropped() {
        let t = task().with_due(None, NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(t.due_time, None);
        assert_eq!(t.due_datetime(NaiveTime::MIN), None);
    }

    #[test]
    fn due_datetime_defaults_time() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let t = task().with_due(NaiveDate::from_ymd_opt(2024, 3, 10), None);
        assert_eq!(t.due_datetime(nine), Some(at("2024-03-10", "09:00")));
    }

    #[test]
    fn due_soon_windows() {
        let timed = task().with_due(
            NaiveDate::from_ymd_opt(2024, 3, 11),
            NaiveTime::from_hms_opt(8, 0, 0),
        );
        assert!(timed.is_due_soon(at("2024-03-10", "09:00")));
        assert!(!timed.is_due_soon(at("2024-03-09", "09:00")));

        let dated = task().with_due(NaiveDate::from_ymd_opt(2024, 3, 11), None);
        assert!(dated.is_due_soon(at("2024-03-10", "12:00")));
        assert!(!dated.is_due_soon(at("2024-03-08", "12:00")));
    }

    #[test]
    fn profile_award_and_revoke_are_inverse() {
        let mut profile = UserProfile::default();
        profile.award(TaskCategory::Health, 250, Utc::now());
        assert_eq!(profile.total_xp, 250);
        assert_eq!(profile.level, 3);
        assert_eq!(profile.category_level(TaskCategory::Health), 3);
        assert_eq!(profile.tasks_completed(TaskCategory::Health), 1);

        profile.revoke(TaskCategory::Health, 250);
        assert_eq!(profile.total_xp, 0);
        assert_eq!(profile.level, 1);
        assert_eq!(profile.tasks_completed(TaskCategory::Health), 0);

        // clamped, never negative
        profile.revoke(TaskCategory::Health, 10);
        assert_eq!(profile.total_xp, 0);
        assert_eq!(profile.category_xp(TaskCategory::Health), 0);
    }

    #[test]
    fn normalize_fills_missing_categories() {
        let mut profile = UserProfile {
            category_xp: BTreeMap::new(),
            category_levels: BTreeMap::new(),
            category_tasks_completed: BTreeMap::new(),
            total_xp: 120,
            level: 99,
            ..UserProfile::default()
        };
        profile.normalize();
        assert_eq!(profile.category_xp.len(), TaskCategory::ALL.len());
        assert_eq!(profile.category_tasks_completed.len(), TaskCategory::ALL.len());
        assert_eq!(profile.level, 2);
    }

    #[test]
    fn parses_user_input() {
        assert_eq!("Work".parse::<TaskCategory>(), Ok(TaskCategory::Work));
        assert_eq!("n".parse::<TaskDifficulty>(), Ok(TaskDifficulty::Nightmare));
        assert_eq!("zone-explorer".parse::<AppTheme>(), Ok(AppTheme::ZoneExplorer));
        assert!("garden".parse::<TaskCategory>().is_err());
    }

    #[test]
    fn category_stats_rate() {
        let a = task();
        let b = task().completed(Utc::now());
        let stats = CategoryStats::from_tasks([&a, &b].into_iter());
        assert_eq!(stats.total_tasks, 2);
        assert_eq!(stats.completed_tasks, 1);
        assert!((stats.completion_rate - 0.5).abs() < f32::EPSILON);
    }
}
