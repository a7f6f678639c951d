mod common;

use common::{at, date, Fixture};
use taskquest::tasks::{
    calculate_category_rank, calculate_level, calculate_xp_for_next_level, CategoryRankLevel,
    MemoryStorage, NewTask, StoreSettings, TaskCategory, TaskDifficulty, TaskStore, XpRewardTable,
};

#[test]
fn easy_work_task_scenario() {
    let fx = Fixture::new(at("2024-03-01", "09:00"));
    let mut store = fx.open();
    let greetings = store.messages().len();

    let a = store
        .add_task(NewTask::new("File timesheet", TaskDifficulty::Easy, TaskCategory::Work))
        .unwrap();
    assert!(store.complete_task(&a));

    assert_eq!(store.profile().total_xp, 10);
    assert_eq!(store.profile().tasks_completed(TaskCategory::Work), 1);
    let new_messages = &store.messages()[greetings..];
    assert_eq!(new_messages.len(), 1);
    assert_eq!(new_messages[0].category, TaskCategory::Work);
    assert!(!new_messages[0].is_failure);
}

#[test]
fn reward_matches_difficulty_for_every_level() {
    for (difficulty, xp) in [
        (TaskDifficulty::Easy, 10),
        (TaskDifficulty::Medium, 25),
        (TaskDifficulty::Hard, 50),
        (TaskDifficulty::Nightmare, 100),
    ] {
        let mut store = TaskStore::builder().rng_seed(1).open();
        let id = store
            .add_task(NewTask::new("t", difficulty, TaskCategory::Health))
            .unwrap();
        store.complete_task(&id);
        assert_eq!(store.profile().total_xp, xp, "{:?}", difficulty);
        assert_eq!(store.profile().category_xp(TaskCategory::Health), xp);

        store.delete_task(&id);
        assert_eq!(store.profile().total_xp, 0);
        assert_eq!(store.profile().tasks_completed(TaskCategory::Health), 0);
    }
}

#[test]
fn reduced_table_applies_to_award_and_reversal() {
    let settings = StoreSettings {
        reward_table: XpRewardTable::Reduced,
        ..StoreSettings::default()
    };
    let mut store = TaskStore::builder()
        .persistence(MemoryStorage::new())
        .settings(settings)
        .open();
    let id = store
        .add_task(NewTask::new("Exam", TaskDifficulty::Nightmare, TaskCategory::Study))
        .unwrap();
    store.complete_task(&id);
    assert_eq!(store.profile().total_xp, 50);
    store.delete_task(&id);
    assert_eq!(store.profile().total_xp, 0);
}

#[test]
fn levels_follow_accumulated_xp() {
    let mut store = TaskStore::builder().rng_seed(3).open();
    for _ in 0..3 {
        let id = store
            .add_task(NewTask::new("Deadlift", TaskDifficulty::Nightmare, TaskCategory::Health))
            .unwrap();
        store.complete_task(&id);
    }
    let profile = store.profile();
    assert_eq!(profile.total_xp, 300);
    assert_eq!(profile.level, calculate_level(300));
    assert_eq!(profile.level, 3);
    assert_eq!(profile.category_level(TaskCategory::Health), 3);
    assert_eq!(profile.category_level(TaskCategory::Work), 1);
    assert_eq!(calculate_xp_for_next_level(profile.total_xp), 364);
}

#[test]
fn rank_boundaries() {
    assert_eq!(calculate_category_rank(0), CategoryRankLevel::Level1);
    assert_eq!(calculate_category_rank(24), CategoryRankLevel::Level1);
    assert_eq!(calculate_category_rank(25), CategoryRankLevel::Level2);
}

#[test]
fn overdue_scan_is_idempotent_across_restarts() {
    let fx = Fixture::new(at("2024-03-01", "09:00"));
    {
        let mut store = fx.open();
        store.add_task(
            NewTask::new("Submit report", TaskDifficulty::Medium, TaskCategory::Work)
                .due(date("2024-03-01"), None),
        );
        assert!(store.check_for_overdue_tasks().is_empty());
    }

    fx.clock.set(at("2024-03-02", "08:00"));
    let mut store = fx.open();
    let failures = |s: &TaskStore| s.messages().iter().filter(|m| m.is_failure).count();
    assert_eq!(failures(&store), 1);
    store.check_for_overdue_tasks();
    store.check_for_overdue_tasks();
    assert_eq!(failures(&store), 1);

    let store = fx.open();
    assert_eq!(failures(&store), 1);
    assert_eq!(store.overdue_tasks().len(), 1);
}
