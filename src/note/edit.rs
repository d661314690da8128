//! Guarded edit sessions. Opening a note for editing takes its lock
//! marker, snapshots the file into the backup directory, and on finish
//! replays whatever the editor changed into the index before the lock
//! comes off.

use std::fs;
use std::path::{Path, PathBuf};

use crate::clock::Clock;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::frontmatter::FrontMatterCodec;
use crate::index::{load_index, resolve, save_index};
use crate::lock::{self, EditLease};

/// Timestamp suffix on backup copies, e.g. `20240101T120000`.
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Copy a note into the backup directory before it gets edited. Returns
/// the backup's path.
pub fn backup_note(note_path: &Path, backup_dir: &Path, clock: &dyn Clock) -> Result<PathBuf> {
    fs::create_dir_all(backup_dir).map_err(|e| {
        Error::io(format!("failed to create backup directory {}", backup_dir.display()), e)
    })?;

    let stem = note_path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::MalformedData(format!("note path {} has no stem", note_path.display())))?;
    let stamp = clock.now().format(BACKUP_TIMESTAMP_FORMAT);
    let backup_path = backup_dir.join(format!("{}_{}.md", stem, stamp));

    fs::copy(note_path, &backup_path).map_err(|e| {
        Error::io(
            format!("failed to back up {} to {}", note_path.display(), backup_path.display()),
            e,
        )
    })?;
    Ok(backup_path)
}

/// An in-progress edit of a single note.
///
/// Holds the note's edit lease for its whole lifetime. Dropping the
/// session without calling [`EditSession::finish`] abandons the edit: the
/// lock marker is removed but the index keeps its pre-edit record.
#[derive(Debug)]
pub struct EditSession<'a> {
    config: &'a Config,
    lease: Option<EditLease>,
    note_key: String,
    note_path: PathBuf,
    backup_path: PathBuf,
}

/// Start editing a note: resolve it, take its lock, snapshot a backup.
pub fn begin_edit<'a>(config: &'a Config, clock: &dyn Clock, key: &str) -> Result<EditSession<'a>> {
    // Expired backups are swept opportunistically; a failed sweep never
    // blocks the edit.
    if let Err(err) = crate::retention::sweep_backups(config, clock) {
        log::warn!("Backup cleanup failed: {}", err);
    }

    let zettels = load_index(&config.index_path())?;
    let position = resolve(&zettels, key)?;
    let note_key = zettels[position].note_id.clone();
    let note_path = PathBuf::from(&zettels[position].note_path);

    let lease = lock::acquire(&config.notes_path(), &note_key, clock)?;
    // A failed backup drops the lease, so the marker never outlives the
    // aborted session.
    let backup_path = backup_note(&note_path, &config.backup_path(), clock)?;

    log::info!("Editing note {} (backup at {})", note_key, backup_path.display());
    Ok(EditSession {
        config,
        lease: Some(lease),
        note_key,
        note_path,
        backup_path,
    })
}

impl EditSession<'_> {
    pub fn note_key(&self) -> &str {
        &self.note_key
    }

    pub fn note_path(&self) -> &Path {
        &self.note_path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Close the session: re-read the note from disk, mirror its front
    /// matter into the index, and release the lock.
    pub fn finish(mut self) -> Result<()> {
        let content = fs::read_to_string(&self.note_path).map_err(|e| {
            Error::io(format!("failed to read note {}", self.note_path.display()), e)
        })?;
        let (front_matter, _body) = FrontMatterCodec::parse(&content)?;

        let index_path = self.config.index_path();
        let mut zettels = load_index(&index_path)?;
        let position = resolve(&zettels, &self.note_key)?;
        let zettel = &mut zettels[position];
        zettel.title = front_matter.title;
        zettel.note_type = front_matter.note_type;
        zettel.tags = front_matter.tags;
        zettel.task_status = front_matter.task_status;
        zettel.links = front_matter.links;
        zettel.updated_at = front_matter.updated_at;
        save_index(&index_path, &zettels)?;

        if let Some(lease) = self.lease.take() {
            lease.release()?;
        }
        log::info!("Finished editing note {}", self.note_key);
        Ok(())
    }
}
