//! Age-based cleanup of the backup and trash directories. Files are aged
//! by modification time; a retention of zero days disables the sweep.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, Local};

use crate::clock::Clock;
use crate::config::Config;
use crate::error::{Error, Result};

/// Delete expired backup copies. Returns how many files were removed.
pub fn sweep_backups(config: &Config, clock: &dyn Clock) -> Result<usize> {
    sweep_dir(&config.backup_path(), config.backup.retention, clock)
}

/// Delete trashed notes past their retention period.
pub fn sweep_trash(config: &Config, clock: &dyn Clock) -> Result<usize> {
    sweep_dir(&config.trash_path(), config.trash.retention, clock)
}

fn sweep_dir(dir: &Path, retention_days: u32, clock: &dyn Clock) -> Result<usize> {
    if retention_days == 0 || !dir.exists() {
        return Ok(0);
    }

    let entries = fs::read_dir(dir)
        .map_err(|e| Error::io(format!("failed to read directory {}", dir.display()), e))?;
    let now = clock.now();
    let max_age = Duration::days(i64::from(retention_days));

    let mut removed = 0;
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("Skipping unreadable entry in {}: {}", dir.display(), err);
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() {
            continue;
        }

        let modified = match entry.metadata().and_then(|meta| meta.modified()) {
            Ok(modified) => DateTime::<Local>::from(modified),
            Err(err) => {
                log::warn!("Skipping {}: no modification time ({})", path.display(), err);
                continue;
            }
        };

        if now.signed_duration_since(modified) > max_age {
            match fs::remove_file(&path) {
                Ok(()) => {
                    log::info!("Removed expired file {}", path.display());
                    removed += 1;
                }
                Err(err) => log::warn!("Failed to remove {}: {}", path.display(), err),
            }
        }
    }
    Ok(removed)
}
