use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Timestamp layout of a note key, e.g. `20240101120000`.
pub const NOTE_KEY_FORMAT: &str = "%Y%m%d%H%M%S";

/// Timestamp layout of `created_at` / `updated_at`, local civil time.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Note key for an instant: second resolution, local civil time.
pub fn format_note_key(at: DateTime<Local>) -> String {
    at.format(NOTE_KEY_FORMAT).to_string()
}

/// Human-readable timestamp for an instant.
pub fn format_timestamp(at: DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// The role a note plays in the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    #[default]
    Fleeting,
    Literature,
    Permanent,
    Index,
    Structure,
    Project,
    Task,
}

impl FromStr for NoteType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fleeting" => Ok(NoteType::Fleeting),
            "literature" => Ok(NoteType::Literature),
            "permanent" => Ok(NoteType::Permanent),
            "index" => Ok(NoteType::Index),
            "structure" => Ok(NoteType::Structure),
            "project" => Ok(NoteType::Project),
            "task" => Ok(NoteType::Task),
            other => Err(Error::MalformedData(format!("unknown note type: {}", other))),
        }
    }
}

impl fmt::Display for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NoteType::Fleeting => "fleeting",
            NoteType::Literature => "literature",
            NoteType::Permanent => "permanent",
            NoteType::Index => "index",
            NoteType::Structure => "structure",
            NoteType::Project => "project",
            NoteType::Task => "task",
        };
        write!(f, "{}", name)
    }
}

// Custom deserializer for NoteType: hand-edited files come in any casing
fn deserialize_note_type<'de, D>(deserializer: D) -> Result<NoteType, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    NoteType::from_str(&s).map_err(serde::de::Error::custom)
}

// Custom deserializer for the id: hand-written headers leave the numeric
// key unquoted, which YAML reads as an integer
fn deserialize_note_key<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    match value {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Null => Ok(String::new()),
        _ => Err(serde::de::Error::custom("invalid id value")),
    }
}

impl<'de> Deserialize<'de> for NoteType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_note_type(deserializer)
    }
}

/// Wire shape of the lifecycle state: two booleans, at most one set.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LifecycleFlags {
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub deleted: bool,
}

/// Where a note currently lives. The contradictory archived+deleted flag
/// combination is rejected while decoding, so in memory this is always
/// exactly one of the three states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "LifecycleFlags", into = "LifecycleFlags")]
pub enum Lifecycle {
    #[default]
    Active,
    Archived,
    Deleted,
}

impl Lifecycle {
    pub fn is_archived(self) -> bool {
        matches!(self, Lifecycle::Archived)
    }

    pub fn is_deleted(self) -> bool {
        matches!(self, Lifecycle::Deleted)
    }
}

impl TryFrom<LifecycleFlags> for Lifecycle {
    type Error = String;

    fn try_from(flags: LifecycleFlags) -> Result<Self, Self::Error> {
        match (flags.archived, flags.deleted) {
            (false, false) => Ok(Lifecycle::Active),
            (true, false) => Ok(Lifecycle::Archived),
            (false, true) => Ok(Lifecycle::Deleted),
            (true, true) => Err("a note cannot be both archived and deleted".to_string()),
        }
    }
}

impl From<Lifecycle> for LifecycleFlags {
    fn from(lifecycle: Lifecycle) -> Self {
        match lifecycle {
            Lifecycle::Active => LifecycleFlags {
                archived: false,
                deleted: false,
            },
            Lifecycle::Archived => LifecycleFlags {
                archived: true,
                deleted: false,
            },
            Lifecycle::Deleted => LifecycleFlags {
                archived: false,
                deleted: true,
            },
        }
    }
}

/// YAML front matter of a note file. Field order here is the canonical
/// key order written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontMatter {
    #[serde(default, deserialize_with = "deserialize_note_key")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub note_type: NoteType,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub task_status: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(flatten)]
    pub lifecycle: Lifecycle,
}
