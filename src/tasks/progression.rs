//! Progression curves: XP levels, category ranks and difficulty rewards.
//!
//! Everything here is a pure function of its integer inputs. Levels grow
//! geometrically: the first level-up costs [`BASE_LEVEL_XP`] and every later
//! step costs 20% more than the previous one (truncated), with thresholds
//! accumulated. Ranks follow a fixed table of completed-task counts.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tasks::ranks::{rank_table, RankInfo};
use crate::tasks::types::{TaskCategory, TaskDifficulty};

/// XP needed to go from level 1 to level 2.
pub const BASE_LEVEL_XP: i64 = 100;

/// Difficulty to XP mapping used for every award and reversal of a store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum XpRewardTable {
    /// 10 / 25 / 50 / 100
    #[default]
    Standard,
    /// 10 / 20 / 30 / 50
    Reduced,
}

impl XpRewardTable {
    pub fn reward(&self, difficulty: TaskDifficulty) -> i64 {
        match (self, difficulty) {
            (_, TaskDifficulty::Easy) => 10,
            (XpRewardTable::Standard, TaskDifficulty::Medium) => 25,
            (XpRewardTable::Standard, TaskDifficulty::Hard) => 50,
            (XpRewardTable::Standard, TaskDifficulty::Nightmare) => 100,
            (XpRewardTable::Reduced, TaskDifficulty::Medium) => 20,
            (XpRewardTable::Reduced, TaskDifficulty::Hard) => 30,
            (XpRewardTable::Reduced, TaskDifficulty::Nightmare) => 50,
        }
    }
}

/// x1.2 with truncation, in integer arithmetic so thresholds never drift.
fn next_step(step: i64) -> i64 {
    step.saturating_mul(6) / 5
}

/// Cumulative XP at which `level` is reached. Level 1 (and 0) start at 0 XP.
pub fn level_threshold(level: u32) -> i64 {
    let mut total: i64 = 0;
    let mut step = BASE_LEVEL_XP;
    for _ in 1..level {
        total = total.saturating_add(step);
        step = next_step(step);
    }
    total
}

/// Highest level whose cumulative threshold does not exceed `xp`.
pub fn calculate_level(xp: i64) -> u32 {
    if xp <= 0 {
        return 1;
    }
    let mut level = 1;
    let mut total: i64 = 0;
    let mut step = BASE_LEVEL_XP;
    while let Some(next_total) = total.checked_add(step) {
        if xp < next_total {
            break;
        }
        total = next_total;
        level += 1;
        step = next_step(step);
    }
    level
}

/// Cumulative XP needed for the level after `calculate_level(xp)`.
pub fn calculate_xp_for_next_level(xp: i64) -> i64 {
    level_threshold(calculate_level(xp) + 1)
}

/// Fraction of the way from the current level threshold to the next, in [0, 1].
pub fn calculate_progress_to_next_level(xp: i64) -> f32 {
    let level = calculate_level(xp);
    let current = level_threshold(level);
    let next = level_threshold(level + 1);
    let span = next - current;
    if span <= 0 {
        return 1.0;
    }
    ((xp - current) as f64 / span as f64).clamp(0.0, 1.0) as f32
}

/// Level -> cumulative threshold for levels `1..=max_level`.
pub fn xp_requirements_for_levels(max_level: u32) -> BTreeMap<u32, i64> {
    (1..=max_level).map(|l| (l, level_threshold(l))).collect()
}

/// Category prestige tier derived from completed task count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryRankLevel {
    #[serde(rename = "LEVEL_1")]
    Level1,
    #[serde(rename = "LEVEL_2")]
    Level2,
    #[serde(rename = "LEVEL_3")]
    Level3,
    #[serde(rename = "LEVEL_4")]
    Level4,
    #[serde(rename = "LEVEL_5")]
    Level5,
    #[serde(rename = "LEVEL_6")]
    Level6,
    #[serde(rename = "LEVEL_7")]
    Level7,
    #[serde(rename = "LEVEL_8")]
    Level8,
    #[serde(rename = "LEVEL_9")]
    Level9,
    #[serde(rename = "LEVEL_10")]
    Level10,
}

impl CategoryRankLevel {
    pub const ALL: [CategoryRankLevel; 10] = [
        CategoryRankLevel::Level1,
        CategoryRankLevel::Level2,
        CategoryRankLevel::Level3,
        CategoryRankLevel::Level4,
        CategoryRankLevel::Level5,
        CategoryRankLevel::Level6,
        CategoryRankLevel::Level7,
        CategoryRankLevel::Level8,
        CategoryRankLevel::Level9,
        CategoryRankLevel::Level10,
    ];

    /// Completed tasks needed to hold this tier; the gap doubles each tier.
    pub fn required_tasks(&self) -> i64 {
        match self {
            CategoryRankLevel::Level1 => 0,
            CategoryRankLevel::Level2 => 25,
            CategoryRankLevel::Level3 => 75,
            CategoryRankLevel::Level4 => 175,
            CategoryRankLevel::Level5 => 375,
            CategoryRankLevel::Level6 => 775,
            CategoryRankLevel::Level7 => 1575,
            CategoryRankLevel::Level8 => 3175,
            CategoryRankLevel::Level9 => 6375,
            CategoryRankLevel::Level10 => 12775,
        }
    }

    /// Zero-based position in [`ALL`](Self::ALL).
    pub fn ordinal(&self) -> usize {
        *self as usize
    }

    pub fn next(&self) -> Option<CategoryRankLevel> {
        Self::ALL.get(self.ordinal() + 1).copied()
    }
}

impl fmt::Display for CategoryRankLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rank {}", self.ordinal() + 1)
    }
}

pub fn calculate_category_rank(tasks_completed: i64) -> CategoryRankLevel {
    CategoryRankLevel::ALL
        .iter()
        .rev()
        .find(|rank| tasks_completed >= rank.required_tasks())
        .copied()
        .unwrap_or(CategoryRankLevel::Level1)
}

/// Fraction between the current and next rank thresholds; 1.0 at the top tier.
pub fn calculate_progress_to_next_rank(tasks_completed: i64) -> f32 {
    let current = calculate_category_rank(tasks_completed);
    let Some(next) = current.next() else {
        return 1.0;
    };
    let needed = next.required_tasks() - current.required_tasks();
    if needed <= 0 {
        return 1.0;
    }
    let progress = tasks_completed - current.required_tasks();
    (progress as f32 / needed as f32).clamp(0.0, 1.0)
}

/// Display name and blurb for the rank held in `category`.
pub fn rank_info(category: TaskCategory, tasks_completed: i64) -> RankInfo {
    let rank = calculate_category_rank(tasks_completed);
    rank_table(category)[rank.ordinal()]
}
