//! # taskquest - a gamified to-do engine
//!
//! Tasks earn XP when completed, XP drives a global level and per-category
//! levels, completed-task counts drive named category ranks, and a cast of
//! NPCs comments on every success and failure. Tasks can carry due dates and
//! ask for a reminder at the due instant.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use taskquest::tasks::{JsonStorage, NewTask, TaskCategory, TaskDifficulty, TaskStore};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut store = TaskStore::builder()
//!         .persistence(JsonStorage::open("./data")?)
//!         .open();
//!
//!     if let Some(id) = store.add_task(NewTask::new("Fix the pump", TaskDifficulty::Hard, TaskCategory::Work)) {
//!         store.complete_task(&id);
//!     }
//!     println!("Level {} with {} XP", store.profile().level, store.profile().total_xp);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`tasks`] - data model, progression, NPC messages, the store and its collaborators
//! - [`config`] - TOML configuration and validation
//! - [`validation`] - input sanitization and safe JSON parsing
//! - [`logutil`] - single-line rendering of user text in logs
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   Task Store    │ ← owns tasks, profile, inbox; publishes StoreEvents
//! └─────────────────┘
//!     │        │
//! ┌────────┐ ┌──────────┐
//! │Persist-│ │ Reminder │ ← collaborators behind traits
//! │ ence   │ │ Service  │
//! └────────┘ └──────────┘
//! ```

pub mod config;
pub mod logutil;
pub mod tasks;
pub mod validation;
