//! Task engine: the data model, progression curves, NPC feedback, and the
//! store that ties them to persistence and reminders.

pub mod clock;
pub mod errors;
pub mod npc;
pub mod progression;
pub mod ranks;
pub mod reminder;
pub mod seed_loader;
pub mod signal;
pub mod storage;
pub mod store;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::{ReminderError, TaskQuestError};
pub use npc::{default_roster, validate_roster, MessageGenerator, Outcome, DEFAULT_MAX_MESSAGES};
pub use progression::{
    calculate_category_rank, calculate_level, calculate_progress_to_next_level,
    calculate_progress_to_next_rank, calculate_xp_for_next_level, level_threshold, rank_info,
    xp_requirements_for_levels, CategoryRankLevel, XpRewardTable, BASE_LEVEL_XP,
};
pub use ranks::{rank_table, RankInfo};
pub use reminder::{
    parse_deep_link, ReminderNotification, ReminderQueue, ReminderRequest, ReminderService,
    DEEP_LINK_PREFIX,
};
pub use seed_loader::{load_npcs_from_json, write_npcs_json};
pub use signal::{SignalToken, TransientSignal};
pub use storage::{JsonStorage, MemoryStorage, Persistence, DEFAULT_MAX_FILE_BYTES};
pub use store::{default_due_time, NewTask, StoreEvent, StoreSettings, TaskStore, TaskStoreBuilder};
pub use types::*;
