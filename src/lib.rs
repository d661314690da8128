//! Plain-text zettelkasten engine: notes are Markdown files with YAML
//! front matter spread across active, archive, and trash directories,
//! mirrored into a single JSON index. The crate covers the front matter
//! codec, the index and its reconciliation against the directories,
//! term-weight similarity and auto-linking, search plumbing, and
//! advisory edit locks.

pub mod clock;
pub mod config;
pub mod error;
pub mod frontmatter;
pub mod graph;
pub mod index;
pub mod links;
pub mod lock;
pub mod note;
pub mod retention;
pub mod search;
pub mod similarity;

use std::fs;
use std::path::Path;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use frontmatter::types::{FrontMatter, Lifecycle, NoteType};
pub use frontmatter::FrontMatterCodec;
pub use index::{load_index, save_index, Zettel};

/// Atomic file write: write to a temp file in the same directory, then
/// rename. A sync client or file watcher scanning the directory never
/// sees a half-written note or index.
pub(crate) fn atomic_write_file(path: &Path, content: &[u8]) -> Result<()> {
    use std::io::Write;

    let file_name = path.file_name().unwrap_or_default().to_string_lossy();
    let temp_path = path.with_file_name(format!("{}.zk-tmp", file_name));

    let mut file = fs::File::create(&temp_path)
        .map_err(|e| Error::io(format!("failed to create temp file {}", temp_path.display()), e))?;
    file.write_all(content)
        .map_err(|e| Error::io(format!("failed to write temp file {}", temp_path.display()), e))?;
    file.sync_all()
        .map_err(|e| Error::io(format!("failed to sync temp file {}", temp_path.display()), e))?;
    drop(file);

    fs::rename(&temp_path, path).map_err(|e| {
        Error::io(
            format!("failed to rename {} to {}", temp_path.display(), path.display()),
            e,
        )
    })?;

    Ok(())
}
