//! Advisory edit locks for notes.
//!
//! Features:
//! - Marker file beside the note (`<note-key>.lock`) recording who holds it
//! - A second acquisition is refused while the marker exists
//! - RAII lease with best-effort marker removal on drop
//! - Staleness is reported, never enforced: a crashed process leaves its
//!   marker behind until someone removes it deliberately

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Local, NaiveDateTime};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::frontmatter::types::NOTE_KEY_FORMAT;

/// Timestamp layout inside lock markers.
const LOCK_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Age past which a lock marker is reported as stale (one hour).
pub const DEFAULT_STALE_AFTER_SECS: i64 = 3600;

/// Cached owning user, computed once per process.
static CURRENT_USER: Lazy<String> = Lazy::new(whoami::username);

/// Contents of a lock marker file (YAML).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Acquisition instant in note-key form
    pub id: String,
    /// User that took the lock
    pub user: String,
    /// Process id of the holder
    pub pid: u32,
    /// Acquisition instant, second resolution
    pub timestamp: String,
}

// ============================================================================
// Marker file helpers
// ============================================================================

/// Marker path for a note key.
pub fn lock_path(notes_dir: &Path, note_key: &str) -> PathBuf {
    notes_dir.join(format!("{}.lock", note_key))
}

fn read_lock_record(path: &Path) -> Result<LockRecord> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::io(format!("failed to read lock file {}", path.display()), e))?;
    Ok(serde_yaml::from_str(&content)?)
}

fn holder_description(path: &Path) -> String {
    match read_lock_record(path) {
        Ok(record) => format!("user {}, pid {}", record.user, record.pid),
        Err(_) => "unknown holder".to_string(),
    }
}

/// Current marker contents for a note, when present and readable.
pub fn current_holder(notes_dir: &Path, note_key: &str) -> Option<LockRecord> {
    let path = lock_path(notes_dir, note_key);
    if !path.exists() {
        return None;
    }
    read_lock_record(&path).ok()
}

/// Whether a marker is older than `max_age` at `now`. Inspection only; an
/// unreadable timestamp is never reported stale.
pub fn is_stale(record: &LockRecord, now: DateTime<Local>, max_age: Duration) -> bool {
    match NaiveDateTime::parse_from_str(&record.timestamp, LOCK_TIMESTAMP_FORMAT) {
        Ok(locked_at) => now.naive_local().signed_duration_since(locked_at) > max_age,
        Err(_) => false,
    }
}

// ============================================================================
// Lease acquisition and release
// ============================================================================

/// Exclusive, advisory lease over a single note.
///
/// Dropping the lease removes the marker best-effort; [`EditLease::release`]
/// does the same but surfaces the error.
#[derive(Debug)]
pub struct EditLease {
    path: PathBuf,
    note_key: String,
    record: LockRecord,
    released: bool,
}

/// Take the edit lease for a note.
///
/// The marker is created exclusively, so two processes racing for the same
/// note cannot both succeed. A present marker makes this fail with the
/// holder's description when the marker is readable.
pub fn acquire(notes_dir: &Path, note_key: &str, clock: &dyn Clock) -> Result<EditLease> {
    let path = lock_path(notes_dir, note_key);

    let now = clock.now();
    let record = LockRecord {
        id: now.format(NOTE_KEY_FORMAT).to_string(),
        user: CURRENT_USER.clone(),
        pid: std::process::id(),
        timestamp: now.format(LOCK_TIMESTAMP_FORMAT).to_string(),
    };
    let content = serde_yaml::to_string(&record)?;

    let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            let holder = holder_description(&path);
            log::warn!("Note {} is already locked ({})", note_key, holder);
            return Err(Error::LockConflict {
                note_key: note_key.to_string(),
                holder,
            });
        }
        Err(e) => {
            return Err(Error::io(
                format!("failed to create lock file {}", path.display()),
                e,
            ))
        }
    };
    file.write_all(content.as_bytes())
        .map_err(|e| Error::io(format!("failed to write lock file {}", path.display()), e))?;
    file.sync_all()
        .map_err(|e| Error::io(format!("failed to sync lock file {}", path.display()), e))?;

    log::info!("Acquired edit lock for {}", note_key);
    Ok(EditLease {
        path,
        note_key: note_key.to_string(),
        record,
        released: false,
    })
}

impl EditLease {
    pub fn note_key(&self) -> &str {
        &self.note_key
    }

    pub fn record(&self) -> &LockRecord {
        &self.record
    }

    /// Remove the marker. The lease is spent even when removal fails.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        fs::remove_file(&self.path)
            .map_err(|e| Error::io(format!("failed to remove lock file {}", self.path.display()), e))?;
        log::info!("Released edit lock for {}", self.note_key);
        Ok(())
    }
}

impl Drop for EditLease {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!("Failed to remove lock file {}: {}", self.path.display(), e);
        }
    }
}
