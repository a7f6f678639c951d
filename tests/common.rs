//! Test utilities & fixtures.
//! Builds stores over a temp directory with a hand-driven clock so overdue
//! and reminder behavior is deterministic.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use taskquest::tasks::{JsonStorage, ManualClock, ReminderQueue, TaskStore};

pub const SEED: u64 = 42;

pub fn at(date: &str, time: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(&format!("{} {}", date, time), "%Y-%m-%d %H:%M").unwrap()
}

#[allow(dead_code)]
pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// A store plus handles on everything it was built from.
pub struct Fixture {
    pub dir: tempfile::TempDir,
    pub clock: Arc<ManualClock>,
    pub reminders: ReminderQueue,
}

impl Fixture {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
            clock: Arc::new(ManualClock::new(start)),
            reminders: ReminderQueue::new(),
        }
    }

    pub fn storage(&self) -> JsonStorage {
        JsonStorage::open(self.dir.path()).expect("storage")
    }

    /// Open a store over the fixture's directory, as a fresh process would.
    pub fn open(&self) -> TaskStore {
        TaskStore::builder()
            .persistence(self.storage())
            .reminders(self.reminders.clone())
            .clock(self.clock.clone())
            .rng_seed(SEED)
            .open()
    }
}
