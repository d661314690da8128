//! Edit session flow: lease marker, pre-edit backup, and the index patch
//! applied when a session finishes.

use std::fs;
use std::path::Path;

use chrono::{Local, TimeZone};
use tempfile::TempDir;

use zettelkasten::config::{BackupConfig, TrashConfig};
use zettelkasten::lock;
use zettelkasten::note::create_note;
use zettelkasten::note::edit::begin_edit;
use zettelkasten::{load_index, Config, Error, FixedClock, FrontMatterCodec, NoteType};

fn test_config(root: &Path) -> Config {
    Config {
        note_dir: root.join("notes").to_string_lossy().to_string(),
        editor: String::new(),
        zettel_json: root.join("zettel.json").to_string_lossy().to_string(),
        archive_dir: root.join("archive").to_string_lossy().to_string(),
        backup: BackupConfig {
            backup_dir: root.join("backups").to_string_lossy().to_string(),
            ..Default::default()
        },
        trash: TrashConfig {
            trash_dir: root.join("trash").to_string_lossy().to_string(),
            ..Default::default()
        },
    }
}

fn noon_clock() -> FixedClock {
    FixedClock(Local.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
}

#[test]
fn test_edit_session_full_cycle() {
    let root = TempDir::new().unwrap();
    let config = test_config(root.path());
    let clock = noon_clock();

    let created = create_note(&config, &clock, "Draft", NoteType::Fleeting, Vec::new()).unwrap();
    assert_eq!(created.note_id, "20240601120000");

    let session = begin_edit(&config, &clock, "1").unwrap();
    let lock_file = lock::lock_path(&config.notes_path(), "20240601120000");
    assert!(lock_file.exists());
    assert!(session.backup_path().exists());

    // Simulate the editor changing title and timestamps.
    let content = fs::read_to_string(session.note_path()).unwrap();
    let (mut front_matter, body) = FrontMatterCodec::parse(&content).unwrap();
    front_matter.title = "Renamed".to_string();
    front_matter.updated_at = "2024-06-01 13:00:00".to_string();
    let rewritten = FrontMatterCodec::serialize(&front_matter, &body).unwrap();
    fs::write(session.note_path(), rewritten).unwrap();

    session.finish().unwrap();
    assert!(!lock_file.exists());

    let zettels = load_index(&config.index_path()).unwrap();
    assert_eq!(zettels[0].title, "Renamed");
    assert_eq!(zettels[0].updated_at, "2024-06-01 13:00:00");
}

#[test]
fn test_second_editor_is_rejected_while_session_open() {
    let root = TempDir::new().unwrap();
    let config = test_config(root.path());
    let clock = noon_clock();

    create_note(&config, &clock, "Contested", NoteType::Fleeting, Vec::new()).unwrap();

    let session = begin_edit(&config, &clock, "20240601120000").unwrap();

    let err = begin_edit(&config, &clock, "20240601120000").unwrap_err();
    match err {
        Error::LockConflict { note_key, holder } => {
            assert_eq!(note_key, "20240601120000");
            assert!(holder.contains(&std::process::id().to_string()), "got {}", holder);
        }
        other => panic!("expected a lock conflict, got {:?}", other),
    }

    let record = lock::current_holder(&config.notes_path(), "20240601120000").unwrap();
    assert_eq!(record.pid, std::process::id());

    // Once the first session is gone the note can be edited again.
    drop(session);
    let reopened = begin_edit(&config, &clock, "20240601120000").unwrap();
    reopened.finish().unwrap();
}

#[test]
fn test_abandoned_session_releases_lock_without_index_patch() {
    let root = TempDir::new().unwrap();
    let config = test_config(root.path());
    let clock = noon_clock();

    create_note(&config, &clock, "Abandoned", NoteType::Fleeting, Vec::new()).unwrap();

    {
        let session = begin_edit(&config, &clock, "1").unwrap();
        let content = fs::read_to_string(session.note_path()).unwrap();
        let (mut front_matter, body) = FrontMatterCodec::parse(&content).unwrap();
        front_matter.title = "Half done".to_string();
        let rewritten = FrontMatterCodec::serialize(&front_matter, &body).unwrap();
        fs::write(session.note_path(), rewritten).unwrap();
        // Dropped without finish.
    }

    assert!(!lock::lock_path(&config.notes_path(), "20240601120000").exists());

    // The file keeps the edit, the index keeps its pre-edit record.
    let zettels = load_index(&config.index_path()).unwrap();
    assert_eq!(zettels[0].title, "Abandoned");
}

#[test]
fn test_backup_snapshots_state_before_the_edit() {
    let root = TempDir::new().unwrap();
    let config = test_config(root.path());
    let clock = noon_clock();

    create_note(&config, &clock, "Original", NoteType::Permanent, Vec::new()).unwrap();

    let session = begin_edit(&config, &clock, "1").unwrap();
    let backup_path = session.backup_path().to_path_buf();
    assert_eq!(
        backup_path.file_name().unwrap().to_string_lossy(),
        "20240601120000_20240601T120000.md"
    );

    fs::write(session.note_path(), "overwritten entirely\n").unwrap();

    let backup = fs::read_to_string(&backup_path).unwrap();
    assert!(backup.contains("title: Original"));
    assert!(backup.contains("## Original"));
}
