//! Index reconciliation against the three note directories.
//!
//! Notes get moved around by plain file managers and sync tools as much as
//! by this crate, so the index drifts. A reconciliation run walks the
//! active, archive, and trash directories and brings every known record in
//! line with where its file actually is. Records whose file is gone are
//! quarantined into the trash; files the index has never seen are adopted.
//! The rebuilt index replaces the stored one wholesale.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

use super::{load_index, max_numeric_id, save_index, Zettel};
use crate::clock::Clock;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::frontmatter::types::{format_timestamp, Lifecycle};
use crate::frontmatter::FrontMatterCodec;

/// What a reconciliation run changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Known records whose location or lifecycle was corrected
    pub relocated: usize,
    /// Records whose file was found nowhere and went to the trash
    pub orphaned: usize,
    /// Files adopted into the index
    pub discovered: usize,
    /// Files or records left alone because of errors
    pub skipped: usize,
}

// ============================================================================
// Directory scanning
// ============================================================================

/// Markdown files of one directory keyed by note key (the file stem),
/// remembering the mtime-ascending traversal order.
struct DirectoryScan {
    by_key: HashMap<String, PathBuf>,
    ordered_keys: Vec<String>,
}

/// Scan one flat directory for note files. Subdirectories, hidden files,
/// and non-markdown files are ignored; an unreadable directory yields an
/// empty scan. Equal mtimes fall back to key order so the result is
/// deterministic.
fn scan_directory(dir: &Path) -> DirectoryScan {
    let mut files: Vec<(SystemTime, String, PathBuf)> = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') || !name.ends_with(".md") {
            continue;
        }
        let stem = match entry.path().file_stem() {
            Some(stem) => stem.to_string_lossy().to_string(),
            None => continue,
        };
        let modified = entry
            .metadata()
            .ok()
            .and_then(|metadata| metadata.modified().ok())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        files.push((modified, stem, entry.path().to_path_buf()));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    let mut by_key = HashMap::with_capacity(files.len());
    let mut ordered_keys = Vec::with_capacity(files.len());
    for (_, stem, path) in files {
        if by_key.insert(stem.clone(), path).is_none() {
            ordered_keys.push(stem);
        }
    }
    DirectoryScan { by_key, ordered_keys }
}

// ============================================================================
// Reconciliation
// ============================================================================

/// Rebuild the index from the directories' actual contents.
///
/// Membership is decided in priority order active, archive, trash; the
/// first directory holding a note key wins. Active notes get their
/// updated-at refreshed to the clock's time, recording when they were last
/// observed live. Records found in no directory have their file (when it
/// still exists) moved into the trash and are flagged deleted. Unknown
/// files are parsed and appended with fresh sequential identifiers.
pub fn reconcile(config: &Config, clock: &dyn Clock) -> Result<ReconcileReport> {
    let index_path = config.index_path();
    let zettels = load_index(&index_path)?;
    let (updated, report) = reconcile_records(zettels, config, clock);
    save_index(&index_path, &updated)?;
    Ok(report)
}

fn reconcile_records(
    zettels: Vec<Zettel>,
    config: &Config,
    clock: &dyn Clock,
) -> (Vec<Zettel>, ReconcileReport) {
    let notes = scan_directory(&config.notes_path());
    let archive = scan_directory(&config.archive_path());
    let trash = scan_directory(&config.trash_path());

    log::info!(
        "Reconciling {} records against {} active, {} archived, {} trashed files",
        zettels.len(),
        notes.ordered_keys.len(),
        archive.ordered_keys.len(),
        trash.ordered_keys.len()
    );

    let now = format_timestamp(clock.now());
    let mut report = ReconcileReport::default();
    let mut updated: Vec<Zettel> = Vec::with_capacity(zettels.len());
    let mut known: HashSet<String> = HashSet::with_capacity(zettels.len());

    for mut zettel in zettels {
        known.insert(zettel.note_id.clone());

        let membership = [
            (&notes, Lifecycle::Active),
            (&archive, Lifecycle::Archived),
            (&trash, Lifecycle::Deleted),
        ]
        .into_iter()
        .find_map(|(scan, lifecycle)| scan.by_key.get(&zettel.note_id).map(|path| (path, lifecycle)));

        match membership {
            Some((path, lifecycle)) => {
                let path = path.to_string_lossy().to_string();
                if zettel.lifecycle != lifecycle || zettel.note_path != path {
                    report.relocated += 1;
                }
                zettel.note_path = path;
                zettel.lifecycle = lifecycle;
                if lifecycle == Lifecycle::Active {
                    zettel.updated_at = now.clone();
                }
                updated.push(zettel);
            }
            None => match move_orphan_to_trash(&zettel, &config.trash_path()) {
                Ok(moved) => {
                    if let Some(target) = moved {
                        zettel.note_path = target.to_string_lossy().to_string();
                    }
                    zettel.lifecycle = Lifecycle::Deleted;
                    zettel.updated_at = now.clone();
                    report.orphaned += 1;
                    updated.push(zettel);
                }
                Err(e) => {
                    // The record keeps claiming its old location until the
                    // move actually happens.
                    log::warn!("Could not move orphaned note {} to trash: {}", zettel.note_id, e);
                    report.skipped += 1;
                    updated.push(zettel);
                }
            },
        }
    }

    let discovery_groups = [
        (&notes, Lifecycle::Active),
        (&archive, Lifecycle::Archived),
        (&trash, Lifecycle::Deleted),
    ];
    let mut next_id = max_numeric_id(&updated) + 1;

    for (scan, lifecycle) in discovery_groups {
        for key in &scan.ordered_keys {
            if known.contains(key) {
                continue;
            }
            let path = &scan.by_key[key];
            match discover_note(key, path, lifecycle) {
                Ok(mut zettel) => {
                    zettel.id = next_id.to_string();
                    next_id += 1;
                    known.insert(key.clone());
                    report.discovered += 1;
                    updated.push(zettel);
                }
                Err(e) => {
                    log::warn!("Skipping undiscoverable file {}: {}", path.display(), e);
                    report.skipped += 1;
                }
            }
        }
    }

    log::info!(
        "Reconciliation finished: {} records ({} relocated, {} orphaned, {} discovered, {} skipped)",
        updated.len(),
        report.relocated,
        report.orphaned,
        report.discovered,
        report.skipped
    );

    (updated, report)
}

/// Move an orphaned record's file into the trash as `<note-key>.md` when it
/// still exists at the recorded path. `Ok(None)` means there was nothing
/// left to move and the record can be flagged directly.
fn move_orphan_to_trash(zettel: &Zettel, trash_dir: &Path) -> Result<Option<PathBuf>> {
    let source = PathBuf::from(&zettel.note_path);
    if !source.exists() {
        return Ok(None);
    }

    fs::create_dir_all(trash_dir).map_err(|e| {
        Error::io(format!("failed to create trash directory {}", trash_dir.display()), e)
    })?;
    let target = trash_dir.join(format!("{}.md", zettel.note_id));
    fs::rename(&source, &target)
        .map_err(|e| Error::io(format!("failed to move {} to trash", source.display()), e))?;

    log::info!("Moved orphaned note {} to {}", zettel.note_id, target.display());
    Ok(Some(target))
}

/// Build a fresh record for a file the index has never seen. The file stem
/// is the note key; a disagreeing front matter id loses.
fn discover_note(key: &str, path: &Path, lifecycle: Lifecycle) -> Result<Zettel> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::io(format!("failed to read {}", path.display()), e))?;
    let (front_matter, _body) = FrontMatterCodec::parse(&content)?;

    if !front_matter.id.is_empty() && front_matter.id != key {
        log::warn!(
            "Front matter id {} disagrees with file name {}; the file name wins",
            front_matter.id,
            key
        );
    }

    Ok(Zettel {
        id: String::new(),
        note_id: key.to_string(),
        title: front_matter.title,
        note_type: front_matter.note_type,
        tags: front_matter.tags,
        task_status: front_matter.task_status,
        links: front_matter.links,
        created_at: front_matter.created_at,
        updated_at: front_matter.updated_at,
        note_path: path.to_string_lossy().to_string(),
        lifecycle,
    })
}
