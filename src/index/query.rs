//! Filtering over index records: lifecycle band, note type, tags, task
//! status, and project membership. All criteria are optional and ANDed.

use super::Zettel;
use crate::frontmatter::types::{Lifecycle, NoteType};

/// Which lifecycle band a query inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleFilter {
    /// Anything not in the trash (the default listing).
    #[default]
    NotTrashed,
    ActiveOnly,
    ArchivedOnly,
    TrashedOnly,
    All,
}

/// Declarative filter over index records.
#[derive(Debug, Clone, Default)]
pub struct ZettelQuery {
    pub lifecycle: LifecycleFilter,
    /// Exact note type; parsed case-insensitively upstream.
    pub note_type: Option<NoteType>,
    /// Case-insensitive substring match against any tag.
    pub tag: Option<String>,
    /// Case-insensitive equality against the task status.
    pub task_status: Option<String>,
    /// Project name; matches `project:` tags with spaces folded to
    /// underscores, case-insensitively.
    pub project: Option<String>,
}

impl ZettelQuery {
    pub fn matches(&self, zettel: &Zettel) -> bool {
        let lifecycle_ok = match self.lifecycle {
            LifecycleFilter::NotTrashed => zettel.lifecycle != Lifecycle::Deleted,
            LifecycleFilter::ActiveOnly => zettel.lifecycle == Lifecycle::Active,
            LifecycleFilter::ArchivedOnly => zettel.lifecycle == Lifecycle::Archived,
            LifecycleFilter::TrashedOnly => zettel.lifecycle == Lifecycle::Deleted,
            LifecycleFilter::All => true,
        };
        if !lifecycle_ok {
            return false;
        }

        if let Some(note_type) = self.note_type {
            if zettel.note_type != note_type {
                return false;
            }
        }

        if let Some(ref tag) = self.tag {
            let needle = tag.trim().to_lowercase();
            let found = zettel
                .tags
                .iter()
                .any(|candidate| candidate.trim().to_lowercase().contains(&needle));
            if !found {
                return false;
            }
        }

        if let Some(ref status) = self.task_status {
            if zettel.task_status.trim().to_lowercase() != status.trim().to_lowercase() {
                return false;
            }
        }

        if let Some(ref project) = self.project {
            let wanted = normalize_project(project);
            let found = zettel.tags.iter().any(|candidate| {
                candidate
                    .trim()
                    .to_lowercase()
                    .strip_prefix("project:")
                    .map(|name| normalize_project(name) == wanted)
                    .unwrap_or(false)
            });
            if !found {
                return false;
            }
        }

        true
    }

    /// Records matching every set criterion, in index order.
    pub fn apply<'a>(&self, zettels: &'a [Zettel]) -> Vec<&'a Zettel> {
        zettels.iter().filter(|zettel| self.matches(zettel)).collect()
    }
}

/// Project names compare trimmed, lowercased, with spaces folded to
/// underscores.
pub fn normalize_project(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zettel(note_id: &str, lifecycle: Lifecycle) -> Zettel {
        Zettel {
            id: "1".to_string(),
            note_id: note_id.to_string(),
            title: String::new(),
            note_type: NoteType::Fleeting,
            tags: Vec::new(),
            task_status: String::new(),
            links: Vec::new(),
            created_at: String::new(),
            updated_at: String::new(),
            note_path: String::new(),
            lifecycle,
        }
    }

    fn collection() -> Vec<Zettel> {
        let mut active_task = zettel("20240101120000", Lifecycle::Active);
        active_task.note_type = NoteType::Task;
        active_task.task_status = "Not started".to_string();
        active_task.tags = vec!["project:Rust_Rewrite".to_string()];

        let mut archived = zettel("20240101130000", Lifecycle::Archived);
        archived.tags = vec!["Learning".to_string()];

        let trashed = zettel("20240101140000", Lifecycle::Deleted);

        vec![active_task, archived, trashed]
    }

    #[test]
    fn test_default_query_excludes_trash_only() {
        let zettels = collection();
        let hits = ZettelQuery::default().apply(&zettels);
        let keys: Vec<&str> = hits.iter().map(|z| z.note_id.as_str()).collect();
        assert_eq!(keys, vec!["20240101120000", "20240101130000"]);
    }

    #[test]
    fn test_lifecycle_bands() {
        let zettels = collection();

        let archived = ZettelQuery {
            lifecycle: LifecycleFilter::ArchivedOnly,
            ..Default::default()
        };
        assert_eq!(archived.apply(&zettels).len(), 1);

        let trashed = ZettelQuery {
            lifecycle: LifecycleFilter::TrashedOnly,
            ..Default::default()
        };
        assert_eq!(trashed.apply(&zettels)[0].note_id, "20240101140000");

        let all = ZettelQuery {
            lifecycle: LifecycleFilter::All,
            ..Default::default()
        };
        assert_eq!(all.apply(&zettels).len(), 3);
    }

    #[test]
    fn test_type_filter() {
        let zettels = collection();
        let query = ZettelQuery {
            note_type: Some(NoteType::Task),
            ..Default::default()
        };
        let hits = query.apply(&zettels);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].note_id, "20240101120000");
    }

    #[test]
    fn test_tag_filter_is_substring_and_case_insensitive() {
        let zettels = collection();
        let query = ZettelQuery {
            tag: Some("learn".to_string()),
            ..Default::default()
        };
        let hits = query.apply(&zettels);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].note_id, "20240101130000");
    }

    #[test]
    fn test_status_filter_is_case_insensitive_equality() {
        let zettels = collection();
        let query = ZettelQuery {
            task_status: Some("not STARTED".to_string()),
            ..Default::default()
        };
        assert_eq!(query.apply(&zettels).len(), 1);

        let miss = ZettelQuery {
            task_status: Some("not".to_string()),
            ..Default::default()
        };
        assert!(miss.apply(&zettels).is_empty());
    }

    #[test]
    fn test_project_filter_normalizes_names() {
        let zettels = collection();
        let query = ZettelQuery {
            project: Some("rust rewrite".to_string()),
            ..Default::default()
        };
        let hits = query.apply(&zettels);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].note_id, "20240101120000");

        let miss = ZettelQuery {
            project: Some("other".to_string()),
            ..Default::default()
        };
        assert!(miss.apply(&zettels).is_empty());
    }

    #[test]
    fn test_normalize_project() {
        assert_eq!(normalize_project("  Rust Rewrite "), "rust_rewrite");
        assert_eq!(normalize_project("plain"), "plain");
    }

    #[test]
    fn test_combined_criteria_are_anded() {
        let zettels = collection();
        let query = ZettelQuery {
            note_type: Some(NoteType::Task),
            task_status: Some("done".to_string()),
            ..Default::default()
        };
        assert!(query.apply(&zettels).is_empty());
    }
}
