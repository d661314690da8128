//! Configuration: where the note directories, index file, and backup and
//! trash locations live on disk.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "ZK_CONFIG";

const CONFIG_FILE: &str = "config.yaml";
const APP_DIR: &str = "zettelkasten";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub note_dir: String,
    #[serde(default)]
    pub editor: String,
    pub zettel_json: String,
    pub archive_dir: String,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub trash: TrashConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupConfig {
    #[serde(default)]
    pub enable: bool,
    #[serde(default)]
    pub frequency: u32,
    #[serde(default)]
    pub retention: u32,
    pub backup_dir: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrashConfig {
    #[serde(default)]
    pub frequency: u32,
    #[serde(default)]
    pub retention: u32,
    pub trash_dir: String,
}

impl Config {
    /// Load the config from its default location (or `ZK_CONFIG`).
    pub fn load() -> Result<Config> {
        let path = config_path()?;
        Self::load_from(&path)
    }

    /// Load and validate a config file, expanding `~/` in every path.
    pub fn load_from(path: &Path) -> Result<Config> {
        let data = fs::read_to_string(path)
            .map_err(|e| Error::io(format!("failed to read config file {}", path.display()), e))?;
        let mut config: Config = serde_yaml::from_str(&data)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?;
        config.expand_paths();
        Ok(config)
    }

    pub fn notes_path(&self) -> PathBuf {
        PathBuf::from(&self.note_dir)
    }

    pub fn archive_path(&self) -> PathBuf {
        PathBuf::from(&self.archive_dir)
    }

    pub fn trash_path(&self) -> PathBuf {
        PathBuf::from(&self.trash.trash_dir)
    }

    pub fn backup_path(&self) -> PathBuf {
        PathBuf::from(&self.backup.backup_dir)
    }

    pub fn index_path(&self) -> PathBuf {
        PathBuf::from(&self.zettel_json)
    }

    fn expand_paths(&mut self) {
        self.note_dir = expand_home(&self.note_dir);
        self.archive_dir = expand_home(&self.archive_dir);
        self.zettel_json = expand_home(&self.zettel_json);
        self.backup.backup_dir = expand_home(&self.backup.backup_dir);
        self.trash.trash_dir = expand_home(&self.trash.trash_dir);
    }
}

/// Resolve the config file path: `ZK_CONFIG` when set, otherwise the
/// platform config directory, otherwise a dot directory under home.
pub fn config_path() -> Result<PathBuf> {
    if let Ok(custom) = env::var(CONFIG_ENV_VAR) {
        if !custom.is_empty() {
            return Ok(PathBuf::from(custom));
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        return Ok(config_dir.join(APP_DIR).join(CONFIG_FILE));
    }
    let home = dirs::home_dir()
        .ok_or_else(|| Error::Config("could not determine home directory".to_string()))?;
    Ok(home.join(format!(".{}", APP_DIR)).join(CONFIG_FILE))
}

/// Expand a leading `~/` to the home directory. Only the leading form is
/// recognized; `~user/` stays as written.
fn expand_home(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.yaml");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_full_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"note_dir: /tmp/zk/notes
editor: vim
zettel_json: /tmp/zk/zettel.json
archive_dir: /tmp/zk/archive
backup:
  enable: true
  frequency: 10
  retention: 7
  backup_dir: /tmp/zk/backups
trash:
  frequency: 10
  retention: 30
  trash_dir: /tmp/zk/trash
"#,
        );

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.note_dir, "/tmp/zk/notes");
        assert_eq!(config.editor, "vim");
        assert_eq!(config.zettel_json, "/tmp/zk/zettel.json");
        assert_eq!(config.archive_dir, "/tmp/zk/archive");
        assert!(config.backup.enable);
        assert_eq!(config.backup.retention, 7);
        assert_eq!(config.trash.trash_dir, "/tmp/zk/trash");
        assert_eq!(config.trash_path(), PathBuf::from("/tmp/zk/trash"));
    }

    #[test]
    fn test_load_minimal_config_defaults_optional_sections() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "note_dir: /tmp/zk/notes\nzettel_json: /tmp/zk/zettel.json\narchive_dir: /tmp/zk/archive\n",
        );

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.editor, "");
        assert!(!config.backup.enable);
        assert_eq!(config.trash.retention, 0);
        assert_eq!(config.trash.trash_dir, "");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::load_from(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_load_invalid_yaml_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "note_dir: [unclosed\n");
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_expand_home_only_touches_tilde_slash_prefix() {
        assert_eq!(expand_home("/absolute/path"), "/absolute/path");
        assert_eq!(expand_home("relative/path"), "relative/path");
        assert_eq!(expand_home("~user/notes"), "~user/notes");

        if dirs::home_dir().is_some() {
            let expanded = expand_home("~/notes");
            assert!(!expanded.starts_with('~'), "got {}", expanded);
            assert!(expanded.ends_with("/notes"), "got {}", expanded);
        }
    }

    #[test]
    fn test_tilde_paths_expanded_on_load() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"note_dir: ~/zk/notes
zettel_json: ~/zk/zettel.json
archive_dir: ~/zk/archive
trash:
  trash_dir: ~/zk/trash
"#,
        );

        let config = Config::load_from(&path).unwrap();
        if dirs::home_dir().is_some() {
            assert!(!config.note_dir.starts_with('~'));
            assert!(!config.archive_dir.starts_with('~'));
            assert!(!config.trash.trash_dir.starts_with('~'));
        }
    }

    #[test]
    fn test_env_override_wins() {
        env::set_var(CONFIG_ENV_VAR, "/custom/spot/config.yaml");
        let path = config_path().unwrap();
        env::remove_var(CONFIG_ENV_VAR);
        assert_eq!(path, PathBuf::from("/custom/spot/config.yaml"));
    }
}
