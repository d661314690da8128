//! The derived note index: one JSON array mirroring every note's front
//! matter plus its location on disk. The files stay the ground truth; the
//! index is rewritten wholesale on every mutation.

pub mod query;
pub mod reconcile;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::atomic_write_file;
use crate::error::{Error, Result};
use crate::frontmatter::types::{Lifecycle, NoteType};

/// One persisted index record. Field order here is the wire order; `id` is
/// the sequential index identifier (kept as a string on the wire), while
/// `note_id` is the stable note key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zettel {
    pub id: String,
    pub note_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub note_type: NoteType,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub task_status: String,
    #[serde(rename = "Links", default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    pub note_path: String,
    #[serde(flatten)]
    pub lifecycle: Lifecycle,
}

/// Load the whole index. A missing or empty file is an empty index.
pub fn load_index(path: &Path) -> Result<Vec<Zettel>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let data = fs::read_to_string(path)
        .map_err(|e| Error::io(format!("failed to read index {}", path.display()), e))?;
    if data.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&data)?)
}

/// Persist the whole index: pretty-printed, atomically replacing the old
/// file.
pub fn save_index(path: &Path, zettels: &[Zettel]) -> Result<()> {
    let json = serde_json::to_string_pretty(zettels)?;
    atomic_write_file(path, json.as_bytes())?;
    log::info!("Saved index with {} records to {}", zettels.len(), path.display());
    Ok(())
}

/// Highest numeric identifier in use; non-numeric identifiers are ignored.
pub(crate) fn max_numeric_id(zettels: &[Zettel]) -> u64 {
    zettels
        .iter()
        .filter_map(|zettel| zettel.id.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}

/// Next sequential identifier. Identifiers only grow, so removing records
/// never causes reuse.
pub fn next_id(zettels: &[Zettel]) -> String {
    (max_numeric_id(zettels) + 1).to_string()
}

/// Append a record to the index with the next identifier assigned,
/// returning the stored record.
pub fn insert_zettel(path: &Path, mut zettel: Zettel) -> Result<Zettel> {
    let mut zettels = load_index(path)?;
    zettel.id = next_id(&zettels);
    zettels.push(zettel.clone());
    save_index(path, &zettels)?;
    Ok(zettel)
}

/// Locate a record by index identifier or note key.
pub fn resolve(zettels: &[Zettel], key: &str) -> Result<usize> {
    let needle = key.trim();
    zettels
        .iter()
        .position(|zettel| zettel.id == needle || zettel.note_id == needle)
        .ok_or_else(|| Error::NotFound(needle.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_zettel(id: &str, note_id: &str) -> Zettel {
        Zettel {
            id: id.to_string(),
            note_id: note_id.to_string(),
            title: "Sample".to_string(),
            note_type: NoteType::Permanent,
            tags: vec!["learning".to_string()],
            task_status: String::new(),
            links: Vec::new(),
            created_at: "2024-01-01 12:00:00".to_string(),
            updated_at: "2024-01-01 12:00:00".to_string(),
            note_path: format!("/notes/{}.md", note_id),
            lifecycle: Lifecycle::Active,
        }
    }

    #[test]
    fn test_load_missing_index_is_empty() {
        let dir = TempDir::new().unwrap();
        let zettels = load_index(&dir.path().join("zettel.json")).unwrap();
        assert!(zettels.is_empty());
    }

    #[test]
    fn test_load_empty_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("zettel.json");
        fs::write(&path, "").unwrap();
        assert!(load_index(&path).unwrap().is_empty());

        fs::write(&path, "  \n").unwrap();
        assert!(load_index(&path).unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("zettel.json");
        let zettels = vec![
            sample_zettel("1", "20240101120000"),
            sample_zettel("2", "20240101130000"),
        ];

        save_index(&path, &zettels).unwrap();
        let loaded = load_index(&path).unwrap();
        assert_eq!(loaded, zettels);
    }

    #[test]
    fn test_wire_format_key_order_and_names() {
        let json = serde_json::to_string_pretty(&[sample_zettel("1", "20240101120000")]).unwrap();

        // links is capitalized on the wire, id stays a JSON string
        assert!(json.contains("\"Links\": []"));
        assert!(json.contains("\"id\": \"1\""));
        assert!(json.contains("  {"));

        let key_positions: Vec<usize> = [
            "\"id\"",
            "\"note_id\"",
            "\"title\"",
            "\"note_type\"",
            "\"tags\"",
            "\"task_status\"",
            "\"Links\"",
            "\"created_at\"",
            "\"updated_at\"",
            "\"note_path\"",
            "\"archived\"",
            "\"deleted\"",
        ]
        .iter()
        .map(|key| json.find(key).unwrap_or_else(|| panic!("missing key {}", key)))
        .collect();

        for pair in key_positions.windows(2) {
            assert!(pair[0] < pair[1], "keys out of wire order in {}", json);
        }
    }

    #[test]
    fn test_wire_format_round_trip() {
        let json = r#"[
  {
    "id": "3",
    "note_id": "20240101120000",
    "title": "Loaded",
    "note_type": "task",
    "tags": ["project:alpha"],
    "task_status": "In progress",
    "Links": ["20231201080000"],
    "created_at": "2024-01-01 12:00:00",
    "updated_at": "2024-01-02 08:00:00",
    "note_path": "/notes/20240101120000.md",
    "archived": false,
    "deleted": false
  }
]"#;
        let zettels: Vec<Zettel> = serde_json::from_str(json).unwrap();
        assert_eq!(zettels.len(), 1);
        assert_eq!(zettels[0].note_type, NoteType::Task);
        assert_eq!(zettels[0].links, vec!["20231201080000"]);
        assert_eq!(zettels[0].lifecycle, Lifecycle::Active);
    }

    #[test]
    fn test_next_id_skips_gaps_without_reuse() {
        let zettels = vec![sample_zettel("1", "a"), sample_zettel("5", "b")];
        assert_eq!(next_id(&zettels), "6");
        assert_eq!(next_id(&[]), "1");
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("zettel.json");

        let first = insert_zettel(&path, sample_zettel("", "20240101120000")).unwrap();
        assert_eq!(first.id, "1");
        let second = insert_zettel(&path, sample_zettel("", "20240101130000")).unwrap();
        assert_eq!(second.id, "2");

        let loaded = load_index(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].id, "2");
    }

    #[test]
    fn test_resolve_by_id_or_note_key() {
        let zettels = vec![
            sample_zettel("1", "20240101120000"),
            sample_zettel("2", "20240101130000"),
        ];

        assert_eq!(resolve(&zettels, "2").unwrap(), 1);
        assert_eq!(resolve(&zettels, "20240101120000").unwrap(), 0);
        assert_eq!(resolve(&zettels, " 1 ").unwrap(), 0);
        assert!(matches!(resolve(&zettels, "9"), Err(Error::NotFound(_))));
    }
}
