//! A long-running watcher and short CLI runs working on one data directory.

mod common;

use chrono::NaiveTime;
use common::{at, date, Fixture, SEED};
use taskquest::tasks::{
    NewTask, Persistence, ReminderQueue, TaskCategory, TaskDifficulty, TaskStore,
};

fn open_watcher(fx: &Fixture, reminders: &ReminderQueue) -> TaskStore {
    TaskStore::builder()
        .persistence(fx.storage())
        .reminders(reminders.clone())
        .clock(fx.clock.clone())
        .rng_seed(SEED)
        .open()
}

#[test]
fn watcher_reload_keeps_messages_from_other_runs() {
    let fx = Fixture::new(at("2024-07-10", "12:00"));
    {
        let mut cli = fx.open();
        cli.add_task(
            NewTask::new("Send invoice", TaskDifficulty::Medium, TaskCategory::Work)
                .due(date("2024-07-10"), NaiveTime::from_hms_opt(13, 0, 0)),
        )
        .unwrap();
    }

    let watcher_queue = ReminderQueue::new();
    let mut watcher = open_watcher(&fx, &watcher_queue);
    let greetings = TaskCategory::ALL.len();
    assert_eq!(watcher.messages().len(), greetings);

    {
        let mut cli = fx.open();
        let dishes = cli
            .add_task(NewTask::new("Dishes", TaskDifficulty::Easy, TaskCategory::Other))
            .unwrap();
        assert!(cli.delete_task(&dishes));
    }
    assert_eq!(fx.storage().load_messages().len(), greetings + 1);

    fx.clock.set(at("2024-07-10", "14:00"));
    watcher.reload();
    let overdue = watcher.check_for_overdue_tasks();
    assert_eq!(overdue.len(), 1);

    let on_disk = fx.storage().load_messages();
    assert_eq!(on_disk.len(), greetings + 2);
    assert_eq!(on_disk.iter().filter(|m| m.is_failure).count(), 2);
    assert_eq!(watcher.messages().len(), on_disk.len());
}

#[test]
fn watcher_reload_picks_up_new_tasks_and_reminders() {
    let fx = Fixture::new(at("2024-07-10", "12:00"));
    let watcher_queue = ReminderQueue::new();
    let mut watcher = open_watcher(&fx, &watcher_queue);

    let (call, stale) = {
        let mut cli = fx.open();
        let call = cli
            .add_task(
                NewTask::new("Call the bank", TaskDifficulty::Easy, TaskCategory::Personal)
                    .due(date("2024-07-10"), NaiveTime::from_hms_opt(16, 0, 0))
                    .reminder(true),
            )
            .unwrap();
        let stale = cli
            .add_task(
                NewTask::new("Renew permit", TaskDifficulty::Hard, TaskCategory::Other)
                    .due(date("2024-07-09"), None),
            )
            .unwrap();
        (call, stale)
    };
    assert!(watcher.task(&call).is_none());

    assert_eq!(watcher.reload(), 1);
    assert!(watcher_queue.is_scheduled(&call));
    assert_eq!(watcher.check_for_overdue_tasks(), vec![stale.clone()]);

    // nothing changed on disk, so nothing is armed twice
    assert_eq!(watcher.reload(), 0);
    assert!(watcher_queue.is_scheduled(&call));

    {
        let mut cli = fx.open();
        assert!(cli.complete_task(&call));
    }
    watcher.reload();
    assert!(!watcher_queue.is_scheduled(&call));
    assert!(watcher.task(&call).unwrap().is_completed);
    assert!(watcher.check_for_overdue_tasks().is_empty());
}
