//! Persistence collaborators for the task store.
//!
//! The store treats persistence as advisory: saves are best effort and loads
//! fall back to empty state. [`JsonStorage`] keeps one JSON document per
//! record kind in a data directory:
//!
//! ```text
//! data/
//! ├── .lock           ← exclusive writer lock
//! ├── tasks.json      ← task list (ISO-8601 dates and times)
//! ├── profile.json    ← XP, levels and per-category counters
//! ├── messages.json   ← NPC inbox
//! └── overdue.json    ← ids already reported as overdue
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use fs2::FileExt;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::tasks::errors::TaskQuestError;
use crate::tasks::types::{NpcMessage, Task, UserProfile};
use crate::validation::{secure_json_parse, validate_file_size, SecurityError};

const TASKS_FILE: &str = "tasks.json";
const PROFILE_FILE: &str = "profile.json";
const MESSAGES_FILE: &str = "messages.json";
const OVERDUE_FILE: &str = "overdue.json";
const LOCK_FILE: &str = ".lock";

pub const DEFAULT_MAX_FILE_BYTES: u64 = 8 * 1024 * 1024;

/// Durable home for the store's state. Loads never fail: missing or
/// undecodable data reads as empty.
pub trait Persistence: Send + Sync {
    fn save_tasks(&self, tasks: &[Task]) -> Result<(), TaskQuestError>;
    fn load_tasks(&self) -> Vec<Task>;
    fn save_profile(&self, profile: &UserProfile) -> Result<(), TaskQuestError>;
    fn load_profile(&self) -> Option<UserProfile>;
    fn save_messages(&self, messages: &[NpcMessage]) -> Result<(), TaskQuestError>;
    fn load_messages(&self) -> Vec<NpcMessage>;

    /// Ids of tasks whose overdue failure message was already delivered, so a
    /// restarted process does not repeat it. Backends may skip this.
    fn save_overdue_notified(&self, _task_ids: &[String]) -> Result<(), TaskQuestError> {
        Ok(())
    }

    fn load_overdue_notified(&self) -> Vec<String> {
        Vec::new()
    }
}

impl<P: Persistence + ?Sized> Persistence for Arc<P> {
    fn save_tasks(&self, tasks: &[Task]) -> Result<(), TaskQuestError> {
        (**self).save_tasks(tasks)
    }

    fn load_tasks(&self) -> Vec<Task> {
        (**self).load_tasks()
    }

    fn save_profile(&self, profile: &UserProfile) -> Result<(), TaskQuestError> {
        (**self).save_profile(profile)
    }

    fn load_profile(&self) -> Option<UserProfile> {
        (**self).load_profile()
    }

    fn save_messages(&self, messages: &[NpcMessage]) -> Result<(), TaskQuestError> {
        (**self).save_messages(messages)
    }

    fn load_messages(&self) -> Vec<NpcMessage> {
        (**self).load_messages()
    }

    fn save_overdue_notified(&self, task_ids: &[String]) -> Result<(), TaskQuestError> {
        (**self).save_overdue_notified(task_ids)
    }

    fn load_overdue_notified(&self) -> Vec<String> {
        (**self).load_overdue_notified()
    }
}

/// File-backed persistence using one JSON document per record kind.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    data_dir: PathBuf,
    max_file_bytes: u64,
}

impl JsonStorage {
    /// Open (or create) the storage directory at `data_dir`.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, TaskQuestError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)?;
        Ok(Self {
            data_dir,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        })
    }

    pub fn with_max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Remove the stored task list.
    pub fn clear_tasks(&self) -> Result<(), TaskQuestError> {
        let _lock = self.lock()?;
        match fs::remove_file(self.data_dir.join(TASKS_FILE)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn lock(&self) -> Result<LockGuard, TaskQuestError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.data_dir.join(LOCK_FILE))?;
        file.lock_exclusive()?;
        Ok(LockGuard(file))
    }

    /// Write via temp file + rename so readers never see a half-written document.
    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<(), TaskQuestError> {
        let json = serde_json::to_vec_pretty(value)?;
        let _lock = self.lock()?;
        let target = self.data_dir.join(name);
        let tmp = self.data_dir.join(format!("{}.tmp", name));
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &target)?;
        debug!("Wrote {} ({} bytes)", target.display(), json.len());
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, TaskQuestError> {
        let path = self.data_dir.join(name);
        let metadata = match fs::metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if validate_file_size(metadata.len(), self.max_file_bytes).is_err() {
            return Err(TaskQuestError::FileTooLarge {
                size: metadata.len(),
                limit: self.max_file_bytes,
            });
        }
        let content = fs::read_to_string(&path)?;
        match secure_json_parse::<T>(&content, self.max_file_bytes as usize) {
            Ok(value) => Ok(Some(value)),
            Err(SecurityError::FileSizeExceeded { .. }) => Err(TaskQuestError::FileTooLarge {
                size: content.len() as u64,
                limit: self.max_file_bytes,
            }),
            Err(_) => Err(TaskQuestError::Corrupt(path.display().to_string())),
        }
    }

    fn read_or_default<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        match self.read_json(name) {
            Ok(value) => value,
            Err(e) => {
                warn!("Error loading {}: {}", name, e);
                None
            }
        }
    }
}

struct LockGuard(File);

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.0);
    }
}

impl Persistence for JsonStorage {
    fn save_tasks(&self, tasks: &[Task]) -> Result<(), TaskQuestError> {
        self.write_json(TASKS_FILE, tasks)?;
        debug!("Saved {} tasks to storage", tasks.len());
        Ok(())
    }

    fn load_tasks(&self) -> Vec<Task> {
        let tasks: Vec<Task> = self.read_or_default(TASKS_FILE).unwrap_or_default();
        debug!("Loaded {} tasks from storage", tasks.len());
        tasks
    }

    fn save_profile(&self, profile: &UserProfile) -> Result<(), TaskQuestError> {
        self.write_json(PROFILE_FILE, profile)
    }

    fn load_profile(&self) -> Option<UserProfile> {
        self.read_or_default(PROFILE_FILE)
    }

    fn save_messages(&self, messages: &[NpcMessage]) -> Result<(), TaskQuestError> {
        self.write_json(MESSAGES_FILE, messages)
    }

    fn load_messages(&self) -> Vec<NpcMessage> {
        self.read_or_default(MESSAGES_FILE).unwrap_or_default()
    }

    fn save_overdue_notified(&self, task_ids: &[String]) -> Result<(), TaskQuestError> {
        self.write_json(OVERDUE_FILE, task_ids)
    }

    fn load_overdue_notified(&self) -> Vec<String> {
        self.read_or_default(OVERDUE_FILE).unwrap_or_default()
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    tasks: Vec<Task>,
    profile: Option<UserProfile>,
    messages: Vec<NpcMessage>,
    overdue_notified: Vec<String>,
}

/// In-process persistence for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<MemoryState>,
    fail_writes: AtomicBool,
    task_saves: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent save fail, to exercise best-effort callers.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful task list saves.
    pub fn task_saves(&self) -> usize {
        self.task_saves.load(Ordering::SeqCst)
    }

    pub fn stored_tasks(&self) -> Vec<Task> {
        self.load_tasks()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MemoryState) -> R) -> Result<R, TaskQuestError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TaskQuestError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "simulated write failure",
            )));
        }
        let mut state = self
            .state
            .lock()
            .map_err(|_| TaskQuestError::Internal("memory storage lock poisoned".into()))?;
        Ok(f(&mut state))
    }

    fn read<R>(&self, f: impl FnOnce(&MemoryState) -> R) -> Option<R> {
        self.state.lock().ok().map(|state| f(&state))
    }
}

impl Persistence for MemoryStorage {
    fn save_tasks(&self, tasks: &[Task]) -> Result<(), TaskQuestError> {
        self.with_state(|s| s.tasks = tasks.to_vec())?;
        self.task_saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load_tasks(&self) -> Vec<Task> {
        self.read(|s| s.tasks.clone()).unwrap_or_default()
    }

    fn save_profile(&self, profile: &UserProfile) -> Result<(), TaskQuestError> {
        self.with_state(|s| s.profile = Some(profile.clone()))
    }

    fn load_profile(&self) -> Option<UserProfile> {
        self.read(|s| s.profile.clone()).flatten()
    }

    fn save_messages(&self, messages: &[NpcMessage]) -> Result<(), TaskQuestError> {
        self.with_state(|s| s.messages = messages.to_vec())
    }

    fn load_messages(&self) -> Vec<NpcMessage> {
        self.read(|s| s.messages.clone()).unwrap_or_default()
    }

    fn save_overdue_notified(&self, task_ids: &[String]) -> Result<(), TaskQuestError> {
        self.with_state(|s| s.overdue_notified = task_ids.to_vec())
    }

    fn load_overdue_notified(&self) -> Vec<String> {
        self.read(|s| s.overdue_notified.clone()).unwrap_or_default()
    }
}
