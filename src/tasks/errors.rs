use thiserror::Error;

/// Errors that can arise while interacting with the task persistence and seed layers.
#[derive(Debug, Error)]
pub enum TaskQuestError {
    /// Wrapper around IO errors (directory creation, file writes, locking).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper around serde_json serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored file exists but does not decode.
    #[error("corrupt data in {0}")]
    Corrupt(String),

    /// Seed data that cannot drive the message generator (missing categories, empty lists).
    #[error("invalid seed data: {0}")]
    InvalidSeed(String),

    /// Stored file exceeds the configured size limit.
    #[error("file too large: {size} bytes (limit {limit})")]
    FileTooLarge { size: u64, limit: u64 },

    /// Internal error (poisoned locks, unexpected conditions)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors reported by a [`ReminderService`](crate::tasks::reminder::ReminderService).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReminderError {
    /// The host refused exact alarm scheduling (missing permission).
    #[error("exact alarm permission not granted")]
    PermissionDenied,

    /// Backend specific failure.
    #[error("reminder backend error: {0}")]
    Backend(String),
}
