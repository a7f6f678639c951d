//! Due-date reminders.
//!
//! The store asks a [`ReminderService`] to fire at a task's due instant and
//! to forget it again when the task goes away. When a reminder fires, the
//! host receives a [`ReminderNotification`] carrying just enough to show a
//! notification and deep-link back to the task.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::tasks::errors::ReminderError;
use crate::tasks::types::{Task, TaskCategory};
use crate::validation::validate_task_id;

pub const DEEP_LINK_PREFIX: &str = "taskquest://task/";

/// A resolved request to fire at `fire_at` for one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderRequest {
    pub task_id: String,
    pub title: String,
    pub description: String,
    pub category: TaskCategory,
    pub fire_at: DateTime<Utc>,
}

impl ReminderRequest {
    pub fn for_task(task: &Task, fire_at: DateTime<Utc>) -> Self {
        Self {
            task_id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            category: task.category,
            fire_at,
        }
    }
}

/// Minimal task record delivered when a reminder fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderNotification {
    pub task_id: String,
    pub title: String,
    pub description: String,
    pub category: TaskCategory,
}

impl ReminderNotification {
    pub fn deep_link(&self) -> String {
        format!("{}{}", DEEP_LINK_PREFIX, self.task_id)
    }
}

impl From<ReminderRequest> for ReminderNotification {
    fn from(request: ReminderRequest) -> Self {
        Self {
            task_id: request.task_id,
            title: request.title,
            description: request.description,
            category: request.category,
        }
    }
}

/// Extract the task id from a `taskquest://task/<id>` link.
pub fn parse_deep_link(link: &str) -> Option<String> {
    let id = link.trim().strip_prefix(DEEP_LINK_PREFIX)?;
    validate_task_id(id).ok()
}

/// Host facility that fires timed reminders. Scheduling is idempotent per
/// task id: a second request for the same task replaces the first.
pub trait ReminderService: Send + Sync {
    fn schedule(&self, request: &ReminderRequest) -> Result<(), ReminderError>;
    fn cancel(&self, task_id: &str) -> Result<(), ReminderError>;
    fn can_schedule_exact_alarms(&self) -> bool;
}

impl<R: ReminderService + ?Sized> ReminderService for Arc<R> {
    fn schedule(&self, request: &ReminderRequest) -> Result<(), ReminderError> {
        (**self).schedule(request)
    }

    fn cancel(&self, task_id: &str) -> Result<(), ReminderError> {
        (**self).cancel(task_id)
    }

    fn can_schedule_exact_alarms(&self) -> bool {
        (**self).can_schedule_exact_alarms()
    }
}

/// In-process reminder service. Clones share one schedule, so a host can
/// hand one clone to the store and poll [`due`](Self::due) on another.
#[derive(Debug, Clone)]
pub struct ReminderQueue {
    pending: Arc<Mutex<HashMap<String, ReminderRequest>>>,
    exact_alarms: bool,
}

impl Default for ReminderQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ReminderQueue {
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            exact_alarms: true,
        }
    }

    /// Simulate a host where the exact-alarm permission was not granted.
    pub fn with_exact_alarms(mut self, allowed: bool) -> Self {
        self.exact_alarms = allowed;
        self
    }

    /// Drain every reminder whose instant is at or before `now`, earliest first.
    pub fn due(&self, now: DateTime<Utc>) -> Vec<ReminderNotification> {
        let Ok(mut pending) = self.pending.lock() else {
            warn!("Reminder queue lock poisoned; dropping due check");
            return Vec::new();
        };
        let due_ids: Vec<String> = pending
            .values()
            .filter(|r| r.fire_at <= now)
            .map(|r| r.task_id.clone())
            .collect();
        let mut fired: Vec<ReminderRequest> = due_ids
            .iter()
            .filter_map(|id| pending.remove(id))
            .collect();
        fired.sort_by_key(|r| r.fire_at);
        fired.into_iter().map(ReminderNotification::from).collect()
    }

    /// Scheduled reminders, earliest first.
    pub fn pending(&self) -> Vec<ReminderRequest> {
        let mut requests: Vec<ReminderRequest> = self
            .pending
            .lock()
            .map(|p| p.values().cloned().collect())
            .unwrap_or_default();
        requests.sort_by_key(|r| r.fire_at);
        requests
    }

    pub fn is_scheduled(&self, task_id: &str) -> bool {
        self.pending
            .lock()
            .map(|p| p.contains_key(task_id))
            .unwrap_or(false)
    }
}

impl ReminderService for ReminderQueue {
    fn schedule(&self, request: &ReminderRequest) -> Result<(), ReminderError> {
        if !self.exact_alarms {
            return Err(ReminderError::PermissionDenied);
        }
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| ReminderError::Backend("reminder queue lock poisoned".into()))?;
        pending.insert(request.task_id.clone(), request.clone());
        debug!("Reminder for {} set at {}", request.task_id, request.fire_at);
        Ok(())
    }

    fn cancel(&self, task_id: &str) -> Result<(), ReminderError> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| ReminderError::Backend("reminder queue lock poisoned".into()))?;
        if pending.remove(task_id).is_some() {
            debug!("Reminder for {} cancelled", task_id);
        }
        Ok(())
    }

    fn can_schedule_exact_alarms(&self) -> bool {
        self.exact_alarms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::types::TaskDifficulty;
    use chrono::Duration;

    fn request(title: &str, fire_at: DateTime<Utc>) -> ReminderRequest {
        let task = Task::new(title, "desc", TaskDifficulty::Medium, TaskCategory::Health, Utc::now());
        ReminderRequest::for_task(&task, fire_at)
    }

    #[test]
    fn rescheduling_replaces() {
        let queue = ReminderQueue::new();
        let now = Utc::now();
        let mut req = request("Take pills", now + Duration::hours(1));
        queue.schedule(&req).unwrap();
        req.fire_at = now + Duration::hours(2);
        queue.schedule(&req).unwrap();

        let pending = queue.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].fire_at, now + Duration::hours(2));
    }

    #[test]
    fn due_drains_in_order() {
        let queue = ReminderQueue::new();
        let now = Utc::now();
        let late = request("late", now - Duration::minutes(1));
        let early = request("early", now - Duration::minutes(10));
        let future = request("future", now + Duration::minutes(10));
        for r in [&late, &early, &future] {
            queue.schedule(r).unwrap();
        }

        let fired = queue.due(now);
        let titles: Vec<&str> = fired.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["early", "late"]);
        assert!(queue.due(now).is_empty());
        assert!(queue.is_scheduled(&future.task_id));
    }

    #[test]
    fn shared_clones_see_cancellation() {
        let queue = ReminderQueue::new();
        let handle = queue.clone();
        let req = request("shared", Utc::now() + Duration::minutes(5));
        queue.schedule(&req).unwrap();
        handle.cancel(&req.task_id).unwrap();
        assert!(!queue.is_scheduled(&req.task_id));
    }

    #[test]
    fn missing_permission_refuses() {
        let queue = ReminderQueue::new().with_exact_alarms(false);
        assert!(!queue.can_schedule_exact_alarms());
        let req = request("nope", Utc::now() + Duration::minutes(5));
        assert_eq!(queue.schedule(&req), Err(ReminderError::PermissionDenied));
    }

    #[test]
    fn deep_links_round_trip() {
        let req = request("link", Utc::now());
        let notification = ReminderNotification::from(req.clone());
        assert_eq!(parse_deep_link(&notification.deep_link()), Some(req.task_id));
        assert_eq!(parse_deep_link("taskquest://task/../../etc"), None);
        assert_eq!(parse_deep_link("https://example.com"), None);
    }
}
