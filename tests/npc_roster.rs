use chrono::Utc;
use taskquest::tasks::{
    default_roster, load_npcs_from_json, write_npcs_json, MemoryStorage, NewTask, Npc,
    TaskCategory, TaskDifficulty, TaskQuestError, TaskStore,
};

fn single_voice_roster() -> Vec<Npc> {
    TaskCategory::ALL
        .iter()
        .map(|c| {
            Npc::new(&format!("echo_{}", c.as_str().to_lowercase()), "Echo", "npc_echo", *c)
                .with_completion(&["Done."])
                .with_failure(&["Missed."])
                .as_primary()
        })
        .collect()
}

#[test]
fn default_roster_covers_every_category() {
    let roster = default_roster();
    for category in TaskCategory::ALL {
        let cast: Vec<&Npc> = roster.iter().filter(|n| n.category == category).collect();
        assert!(!cast.is_empty(), "{}", category);
        assert_eq!(cast.iter().filter(|n| n.is_primary).count(), 1, "{}", category);
    }
}

#[test]
fn custom_roster_file_drives_messages() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seeds").join("npcs.json");
    write_npcs_json(&path, &single_voice_roster()).unwrap();
    let roster = load_npcs_from_json(&path).unwrap();

    let mut store = TaskStore::builder()
        .persistence(MemoryStorage::new())
        .roster(roster)
        .open();
    assert!(store.messages().iter().all(|m| m.message == "Done."));

    let id = store
        .add_task(NewTask::new("Call plumber", TaskDifficulty::Easy, TaskCategory::Personal))
        .unwrap();
    store.delete_task(&id);
    let last = store.messages().last().unwrap();
    assert_eq!(last.message, "Missed.");
    assert_eq!(last.npc_id, "echo_personal");
    assert!(last.timestamp <= Utc::now());
}

#[test]
fn roster_missing_a_category_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("npcs.json");
    let mut roster = single_voice_roster();
    roster.retain(|n| n.category != TaskCategory::Shopping);
    write_npcs_json(&path, &roster).unwrap();

    match load_npcs_from_json(&path) {
        Err(TaskQuestError::InvalidSeed(msg)) => assert!(msg.contains("SHOPPING")),
        other => panic!("expected InvalidSeed, got {:?}", other.map(|r| r.len())),
    }
}

#[test]
fn malformed_roster_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("npcs.json");
    std::fs::write(&path, "[{\"id\": 3}]").unwrap();
    assert!(matches!(
        load_npcs_from_json(&path),
        Err(TaskQuestError::InvalidSeed(_))
    ));
}
