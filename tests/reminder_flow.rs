mod common;

use chrono::{Duration, NaiveTime};
use common::{at, date, Fixture};
use taskquest::tasks::{parse_deep_link, NewTask, TaskCategory, TaskDifficulty};

#[test]
fn past_due_task_is_added_without_reminder() {
    let fx = Fixture::new(at("2024-07-10", "12:00"));
    let mut store = fx.open();
    let id = store
        .add_task(
            NewTask::new("Return library book", TaskDifficulty::Easy, TaskCategory::Study)
                .due(date("2024-07-01"), None)
                .reminder(true),
        )
        .unwrap();
    assert!(store.task(&id).is_some());
    assert!(fx.reminders.pending().is_empty());
}

#[test]
fn reminder_fires_and_links_back() {
    let fx = Fixture::new(at("2024-07-10", "12:00"));
    let mut store = fx.open();
    let id = store
        .add_task(
            NewTask::new("Water plants", TaskDifficulty::Easy, TaskCategory::Other)
                .due(date("2024-07-10"), NaiveTime::from_hms_opt(18, 30, 0))
                .reminder(true),
        )
        .unwrap();

    assert!(fx.reminders.due(store.now()).is_empty());
    fx.clock.set(at("2024-07-10", "18:30"));
    let fired = fx.reminders.due(store.now());
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].title, "Water plants");
    assert_eq!(fired[0].category, TaskCategory::Other);

    let target = parse_deep_link(&fired[0].deep_link()).unwrap();
    assert_eq!(target, id);
    let token = store.highlight_task(&target).unwrap();
    assert_eq!(store.highlighted_task(), Some(id.as_str()));

    fx.clock.advance(Duration::seconds(5));
    assert_eq!(store.highlighted_task(), None);
    assert!(store.clear_highlight(token));
}

#[test]
fn reopening_rearms_future_reminders_only() {
    let fx = Fixture::new(at("2024-07-10", "12:00"));
    let (soon, later) = {
        let mut store = fx.open();
        let soon = store
            .add_task(
                NewTask::new("Soon", TaskDifficulty::Easy, TaskCategory::Work)
                    .due(date("2024-07-10"), NaiveTime::from_hms_opt(13, 0, 0))
                    .reminder(true),
            )
            .unwrap();
        let later = store
            .add_task(
                NewTask::new("Later", TaskDifficulty::Easy, TaskCategory::Work)
                    .due(date("2024-07-12"), None)
                    .reminder(true),
            )
            .unwrap();
        (soon, later)
    };

    // a new process starts with an empty in-process queue
    let fx = Fixture {
        reminders: taskquest::tasks::ReminderQueue::new(),
        ..fx
    };
    fx.clock.set(at("2024-07-10", "14:00"));
    let _store = fx.open();
    assert!(!fx.reminders.is_scheduled(&soon));
    assert!(fx.reminders.is_scheduled(&later));
}

#[test]
fn completing_cancels_reminder_and_clearing_keeps_open_ones() {
    let fx = Fixture::new(at("2024-07-10", "12:00"));
    let mut store = fx.open();
    let add = |store: &mut taskquest::tasks::TaskStore, title: &str| {
        store
            .add_task(
                NewTask::new(title, TaskDifficulty::Easy, TaskCategory::Health)
                    .due(date("2024-07-11"), None)
                    .reminder(true),
            )
            .unwrap()
    };
    let done = add(&mut store, "Vitamins");
    let kept = add(&mut store, "Stretch");
    assert_eq!(fx.reminders.pending().len(), 2);

    store.complete_task(&done);
    assert!(!fx.reminders.is_scheduled(&done));
    store.delete_all_completed();
    assert!(fx.reminders.is_scheduled(&kept));
}
