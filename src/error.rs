//! Error types for the zettelkasten core.

use thiserror::Error;

/// Result type alias using the zettelkasten Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for note and index operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Front matter or index content that cannot be understood
    #[error("Malformed note data: {0}")]
    MalformedData(String),

    /// Note or index record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// File operation failed; the context names the file and the action
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Another process holds the edit lock for this note
    #[error("Note {note_key} is already being edited ({holder})")]
    LockConflict { note_key: String, holder: String },

    /// Tokenizer backend failed; term weighting degrades, data stays intact
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// YAML encode/decode error outside of note front matter
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON encode/decode error for the index file
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// I/O error carrying the file and action it happened in.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }
}
