//! Note workflows: creation, lifecycle moves between the three
//! directories, and front matter mutations that keep the index in step.

pub mod edit;

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::atomic_write_file;
use crate::clock::Clock;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::frontmatter::types::{format_note_key, format_timestamp, FrontMatter, Lifecycle, NoteType};
use crate::frontmatter::FrontMatterCodec;
use crate::index::{insert_zettel, load_index, resolve, save_index, Zettel};

/// Status a task starts its life in.
pub const DEFAULT_TASK_STATUS: &str = "Not started";

/// `project:` tag for a project name; spaces become underscores.
pub fn project_tag(name: &str) -> String {
    format!("project:{}", name.trim().replace(' ', "_"))
}

/// Create a note: a fresh key from the clock, a seeded body, and an index
/// record to match.
pub fn create_note(
    config: &Config,
    clock: &dyn Clock,
    title: &str,
    note_type: NoteType,
    tags: Vec<String>,
) -> Result<Zettel> {
    create_with(config, clock, title, note_type, tags, "")
}

/// Create a task note tagged into its project, starting as "Not started".
pub fn create_task(config: &Config, clock: &dyn Clock, title: &str, project: &str) -> Result<Zettel> {
    create_with(
        config,
        clock,
        title,
        NoteType::Task,
        vec![project_tag(project)],
        DEFAULT_TASK_STATUS,
    )
}

/// Create a project note; its own name doubles as the project tag.
pub fn create_project(config: &Config, clock: &dyn Clock, name: &str) -> Result<Zettel> {
    create_with(
        config,
        clock,
        name,
        NoteType::Project,
        vec![project_tag(name)],
        "",
    )
}

fn create_with(
    config: &Config,
    clock: &dyn Clock,
    title: &str,
    note_type: NoteType,
    tags: Vec<String>,
    task_status: &str,
) -> Result<Zettel> {
    let now = clock.now();
    let note_key = format_note_key(now);
    let created_at = format_timestamp(now);

    let front_matter = FrontMatter {
        id: note_key.clone(),
        title: title.to_string(),
        note_type,
        tags: tags.clone(),
        links: Vec::new(),
        task_status: task_status.to_string(),
        created_at: created_at.clone(),
        updated_at: created_at.clone(),
        lifecycle: Lifecycle::Active,
    };
    let content = FrontMatterCodec::serialize(&front_matter, &format!("## {}", title))?;

    let notes_dir = config.notes_path();
    fs::create_dir_all(&notes_dir).map_err(|e| {
        Error::io(format!("failed to create notes directory {}", notes_dir.display()), e)
    })?;

    // Keys have second resolution; exclusive create turns a key collision
    // into an error instead of an overwrite.
    let note_path = notes_dir.join(format!("{}.md", note_key));
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&note_path)
        .map_err(|e| Error::io(format!("failed to create note {}", note_path.display()), e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| Error::io(format!("failed to write note {}", note_path.display()), e))?;

    let zettel = Zettel {
        id: String::new(),
        note_id: note_key,
        title: title.to_string(),
        note_type,
        tags,
        task_status: task_status.to_string(),
        links: Vec::new(),
        created_at: created_at.clone(),
        updated_at: created_at,
        note_path: note_path.to_string_lossy().to_string(),
        lifecycle: Lifecycle::Active,
    };
    let inserted = insert_zettel(&config.index_path(), zettel)?;

    log::info!("Created {} note {} at {}", note_type, inserted.note_id, inserted.note_path);
    Ok(inserted)
}

/// Archive a note: flag it in front matter, move the file under the
/// archive directory, then update the index.
pub fn archive_note(config: &Config, key: &str) -> Result<()> {
    move_note(config, key, Lifecycle::Archived)
}

/// Move a note to the trash. The file stays recoverable until trash
/// retention disposes of it.
pub fn trash_note(config: &Config, key: &str) -> Result<()> {
    move_note(config, key, Lifecycle::Deleted)
}

/// Bring an archived or trashed note back into the active directory.
pub fn restore_note(config: &Config, key: &str) -> Result<()> {
    move_note(config, key, Lifecycle::Active)
}

fn move_note(config: &Config, key: &str, target: Lifecycle) -> Result<()> {
    let index_path = config.index_path();
    let mut zettels = load_index(&index_path)?;
    let position = resolve(&zettels, key)?;

    let source = PathBuf::from(&zettels[position].note_path);
    let content = fs::read_to_string(&source)
        .map_err(|e| Error::io(format!("failed to read note {}", source.display()), e))?;
    let (mut front_matter, body) = FrontMatterCodec::parse(&content)?;
    front_matter.lifecycle = target;
    let rewritten = FrontMatterCodec::serialize(&front_matter, &body)?;
    atomic_write_file(&source, rewritten.as_bytes())?;

    let target_dir = match target {
        Lifecycle::Active => config.notes_path(),
        Lifecycle::Archived => config.archive_path(),
        Lifecycle::Deleted => config.trash_path(),
    };
    fs::create_dir_all(&target_dir).map_err(|e| {
        Error::io(format!("failed to create directory {}", target_dir.display()), e)
    })?;
    let destination = target_dir.join(format!("{}.md", zettels[position].note_id));
    if destination != source {
        fs::rename(&source, &destination).map_err(|e| {
            Error::io(
                format!("failed to move {} to {}", source.display(), destination.display()),
                e,
            )
        })?;
    }

    // The index records the move only once the file actually moved.
    let zettel = &mut zettels[position];
    zettel.note_path = destination.to_string_lossy().to_string();
    zettel.lifecycle = target;
    save_index(&index_path, &zettels)?;

    let zettel = &zettels[position];
    log::info!("Moved note {} to {}", zettel.note_id, zettel.note_path);
    Ok(())
}

/// Set a task's status in its front matter and the index.
pub fn set_task_status(config: &Config, key: &str, status: &str) -> Result<()> {
    let status = status.to_string();
    update_front_matter(config, key, move |front_matter| {
        front_matter.task_status = status;
    })
}

/// Tag a note into a project; a note already carrying the tag is left
/// unchanged.
pub fn add_to_project(config: &Config, key: &str, project: &str) -> Result<()> {
    let tag = project_tag(project);
    update_front_matter(config, key, move |front_matter| {
        if !front_matter.tags.contains(&tag) {
            front_matter.tags.push(tag);
        }
    })
}

// Rewrites a note's front matter in place and mirrors every shared field
// back into its index record.
fn update_front_matter<F>(config: &Config, key: &str, mutate: F) -> Result<()>
where
    F: FnOnce(&mut FrontMatter),
{
    let index_path = config.index_path();
    let mut zettels = load_index(&index_path)?;
    let position = resolve(&zettels, key)?;

    let note_path = PathBuf::from(&zettels[position].note_path);
    let content = fs::read_to_string(&note_path)
        .map_err(|e| Error::io(format!("failed to read note {}", note_path.display()), e))?;
    let (mut front_matter, body) = FrontMatterCodec::parse(&content)?;
    mutate(&mut front_matter);
    let rewritten = FrontMatterCodec::serialize(&front_matter, &body)?;
    atomic_write_file(&note_path, rewritten.as_bytes())?;

    let zettel = &mut zettels[position];
    zettel.title = front_matter.title;
    zettel.note_type = front_matter.note_type;
    zettel.tags = front_matter.tags;
    zettel.task_status = front_matter.task_status;
    zettel.links = front_matter.links;
    zettel.updated_at = front_matter.updated_at;
    save_index(&index_path, &zettels)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_tag_folds_spaces() {
        assert_eq!(project_tag("Rust Rewrite"), "project:Rust_Rewrite");
        assert_eq!(project_tag("  padded  name "), "project:padded__name");
        assert_eq!(project_tag("plain"), "project:plain");
    }
}
