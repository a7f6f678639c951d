//! Seed data loaders for data-driven NPC rosters.
//!
//! A roster file lets the cast and their lines be customized without
//! recompiling. The file is a JSON array of [`Npc`] records.

use std::fs;
use std::path::Path;

use crate::tasks::errors::TaskQuestError;
use crate::tasks::npc::validate_roster;
use crate::tasks::types::Npc;

/// Load and validate an NPC roster from `path`.
pub fn load_npcs_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<Npc>, TaskQuestError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let npcs: Vec<Npc> = serde_json::from_str(&contents).map_err(|e| {
        TaskQuestError::InvalidSeed(format!("failed to parse {}: {}", path.display(), e))
    })?;

    validate_roster(&npcs)?;
    Ok(npcs)
}

/// Write `npcs` as a pretty-printed roster file, creating parent directories.
pub fn write_npcs_json<P: AsRef<Path>>(path: P, npcs: &[Npc]) -> Result<(), TaskQuestError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(npcs)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::npc::default_roster;
    use tempfile::tempdir;

    #[test]
    fn roster_file_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seeds/npcs.json");
        write_npcs_json(&path, &default_roster()).unwrap();

        let loaded = load_npcs_from_json(&path).unwrap();
        assert_eq!(loaded, default_roster());
    }

    #[test]
    fn incomplete_roster_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("npcs.json");
        let partial: Vec<Npc> = default_roster().into_iter().take(4).collect();
        write_npcs_json(&path, &partial).unwrap();

        assert!(matches!(
            load_npcs_from_json(&path),
            Err(TaskQuestError::InvalidSeed(_))
        ));
    }

    #[test]
    fn malformed_file_is_invalid_seed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("npcs.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_npcs_from_json(&path),
            Err(TaskQuestError::InvalidSeed(_))
        ));
    }
}
