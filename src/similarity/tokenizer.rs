//! Text segmentation behind the term-weight engine.
//!
//! Japanese notes are segmented by an external morphological tagger whose
//! process invocation is supplied by the caller; this module owns only the
//! tagger's line format. A plain word splitter serves as the fallback when
//! no tagger is installed.

use crate::error::Result;

/// Trait for turning note text into a token stream.
///
/// Implementations must be thread-safe. A failed tokenization degrades the
/// term-weight engine (the note is skipped) but never corrupts stored data.
pub trait Tokenizer: Send + Sync {
    /// Tokenize raw note text.
    fn tokenize(&self, text: &str) -> Result<Vec<String>>;

    /// Get the name/identifier of this tokenizer.
    fn name(&self) -> &str;
}

// Word classes that carry content: noun, verb, adjective
const CONTENT_WORD_CLASSES: [&str; 3] = ["名詞", "動詞", "形容詞"];

/// Extract content words from morphological tagger output.
///
/// Each line is `surface<TAB>features` with comma-separated features whose
/// first element is the word class. Lines without a tab (blank lines, the
/// trailing `EOS` marker) are skipped; so are words of non-content classes.
pub fn parse_tagged_lines(output: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for line in output.lines() {
        if let Some((surface, features)) = line.split_once('\t') {
            let class = features.split(',').next().unwrap_or("");
            if CONTENT_WORD_CLASSES.contains(&class) {
                tokens.push(surface.to_string());
            }
        }
    }
    tokens
}

/// Tokenizer backed by an external morphological tagger.
///
/// The tagger process is injected as a function from raw text to the
/// tagger's captured standard output; this type parses that output.
pub struct TaggedTokenizer<F> {
    tag: F,
}

impl<F> TaggedTokenizer<F>
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    pub fn new(tag: F) -> Self {
        Self { tag }
    }
}

impl<F> Tokenizer for TaggedTokenizer<F>
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        let output = (self.tag)(text)?;
        Ok(parse_tagged_lines(&output))
    }

    fn name(&self) -> &str {
        "tagged"
    }
}

/// Fallback tokenizer: lowercased alphanumeric runs, no word-class filter.
#[derive(Debug, Default, Clone, Copy)]
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        Ok(text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(|word| word.to_lowercase())
            .collect())
    }

    fn name(&self) -> &str {
        "word"
    }
}
