//! Link resolver: find related notes by term-weight similarity and record
//! links in front matter, the index, and optionally the note body.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;

use regex::Regex;

use crate::atomic_write_file;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::frontmatter::types::FrontMatter;
use crate::frontmatter::FrontMatterCodec;
use crate::index::{load_index, resolve, save_index, Zettel};
use crate::similarity::tokenizer::Tokenizer;
use crate::similarity::{build_corpus, cosine_similarity, tfidf_vectors, TermVector};

/// Similarity floor below which notes are not considered related.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.5;

/// Heading under which fallback body links are collected.
const LINKS_SECTION: &str = "## Links";

/// Notes related to `from` by cosine similarity at or above `threshold`.
///
/// The note itself and notes without a computed vector are excluded.
/// Results are ordered by descending similarity; equal scores fall back to
/// ascending note key so the ordering is total.
pub fn find_related(
    from: &Zettel,
    zettels: &[Zettel],
    threshold: f64,
    vectors: &HashMap<String, TermVector>,
) -> Vec<Zettel> {
    let from_vector = match vectors.get(&from.note_id) {
        Some(vector) => vector,
        None => {
            log::warn!("No term vector for note {}", from.note_id);
            return Vec::new();
        }
    };

    let mut scored: Vec<(f64, &Zettel)> = Vec::new();
    for zettel in zettels {
        if zettel.note_id == from.note_id {
            continue;
        }
        let vector = match vectors.get(&zettel.note_id) {
            Some(vector) => vector,
            None => continue,
        };
        let similarity = cosine_similarity(from_vector, vector);
        if similarity >= threshold {
            scored.push((similarity, zettel));
        }
    }

    scored.sort_by(|(similarity_a, a), (similarity_b, b)| {
        similarity_b
            .partial_cmp(similarity_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.note_id.cmp(&b.note_id))
    });

    if scored.is_empty() {
        log::warn!("No related notes found for {}", from.note_id);
    }

    scored.into_iter().map(|(_, zettel)| zettel.clone()).collect()
}

/// Order-preserving union of two link lists. Existing order is kept and
/// each incoming link is appended once; comparison is exact string
/// equality.
pub fn merge_links(existing: &[String], incoming: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(existing.len() + incoming.len());
    for link in existing.iter().chain(incoming) {
        if seen.insert(link.clone()) {
            merged.push(link.clone());
        }
    }
    merged
}

/// Record links in a note's front matter. Merging makes re-adding a no-op,
/// and a note never links to itself.
pub fn add_links(front_matter: &mut FrontMatter, new_links: &[String]) {
    let incoming: Vec<String> = new_links
        .iter()
        .filter(|link| link.as_str() != front_matter.id)
        .cloned()
        .collect();
    front_matter.links = merge_links(&front_matter.links, &incoming);
}

/// How the insertion point for a visible body link is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorStrategy {
    /// First anchor (in the given order) with a whole-word match wins.
    #[default]
    FirstMatch,
    /// Longest anchor with a whole-word match wins.
    LongestAnchor,
}

/// Anchor candidates for a destination note: its heaviest terms, best
/// first, ties broken alphabetically.
pub fn anchor_candidates(vector: &TermVector, limit: usize) -> Vec<String> {
    let mut terms: Vec<(&String, f64)> = vector.iter().map(|(term, weight)| (term, *weight)).collect();
    terms.sort_by(|(term_a, weight_a), (term_b, weight_b)| {
        weight_b
            .partial_cmp(weight_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| term_a.cmp(term_b))
    });
    terms.into_iter().take(limit).map(|(term, _)| term.clone()).collect()
}

/// Insert a visible `[[note-key]]` link into a body.
///
/// Anchors are tried as whole-word matches; the link is spliced in right
/// after the first span the strategy settles on. When no anchor matches,
/// the link is appended under a trailing `## Links` section, which is
/// created if the body does not have one.
pub fn insert_body_link(
    body: &str,
    note_key: &str,
    anchors: &[String],
    strategy: AnchorStrategy,
) -> String {
    let link_text = format!("[[{}]]", note_key);

    let mut ordered: Vec<&str> = anchors
        .iter()
        .map(String::as_str)
        .filter(|anchor| !anchor.is_empty())
        .collect();
    if strategy == AnchorStrategy::LongestAnchor {
        // Stable sort keeps the given order among anchors of equal length
        ordered.sort_by(|a, b| b.len().cmp(&a.len()));
    }

    for anchor in ordered {
        if let Some(end) = whole_word_match_end(body, anchor) {
            let mut spliced = String::with_capacity(body.len() + link_text.len() + 1);
            spliced.push_str(&body[..end]);
            spliced.push(' ');
            spliced.push_str(&link_text);
            spliced.push_str(&body[end..]);
            return spliced;
        }
    }

    append_links_section(body, &link_text)
}

/// Byte offset just past the first whole-word occurrence of `anchor`.
fn whole_word_match_end(body: &str, anchor: &str) -> Option<usize> {
    let pattern = format!(r"\b{}\b", regex::escape(anchor));
    let re = Regex::new(&pattern).ok()?;
    re.find(body).map(|m| m.end())
}

fn append_links_section(body: &str, link_text: &str) -> String {
    let trimmed = body.trim_end();
    let item = format!("- {}", link_text);
    if trimmed.lines().any(|line| line.trim() == LINKS_SECTION) {
        format!("{}\n{}", trimmed, item)
    } else if trimmed.is_empty() {
        format!("{}\n\n{}", LINKS_SECTION, item)
    } else {
        format!("{}\n\n{}\n\n{}", trimmed, LINKS_SECTION, item)
    }
}

/// Link a note to every note scoring at or above `threshold`, recording
/// the links in its front matter and the index. Returns the linked note
/// keys in rank order.
pub fn auto_link(
    config: &Config,
    from: &str,
    threshold: f64,
    tokenizer: &dyn Tokenizer,
) -> Result<Vec<String>> {
    let index_path = config.index_path();
    let mut zettels = load_index(&index_path)?;
    let position = resolve(&zettels, from)?;

    let documents = build_corpus(&zettels, tokenizer);
    let vectors = tfidf_vectors(&documents);

    let related = find_related(&zettels[position], &zettels, threshold, &vectors);
    if related.is_empty() {
        return Ok(Vec::new());
    }
    let related_keys: Vec<String> = related.iter().map(|zettel| zettel.note_id.clone()).collect();

    write_links(&mut zettels, position, &related_keys)?;
    save_index(&index_path, &zettels)?;

    log::info!(
        "Linked {} related notes to {}",
        related_keys.len(),
        zettels[position].note_id
    );
    Ok(related_keys)
}

/// Manually link one note to another; both may be given as index
/// identifier or note key.
pub fn link_notes(config: &Config, from: &str, to: &str) -> Result<()> {
    let index_path = config.index_path();
    let mut zettels = load_index(&index_path)?;
    let from_position = resolve(&zettels, from)?;
    let to_position = resolve(&zettels, to)?;

    if from_position == to_position {
        return Err(Error::MalformedData("a note cannot link to itself".to_string()));
    }

    let to_key = zettels[to_position].note_id.clone();
    write_links(&mut zettels, from_position, &[to_key])?;
    save_index(&index_path, &zettels)?;
    Ok(())
}

// Rewrites the note file's front matter and mirrors the merged link list
// into the index entry; the caller persists the index.
fn write_links(zettels: &mut [Zettel], position: usize, new_links: &[String]) -> Result<()> {
    let note_path = PathBuf::from(&zettels[position].note_path);
    let content = fs::read_to_string(&note_path)
        .map_err(|e| Error::io(format!("failed to read note {}", note_path.display()), e))?;
    let (mut front_matter, body) = FrontMatterCodec::parse(&content)?;

    add_links(&mut front_matter, new_links);
    let rewritten = FrontMatterCodec::serialize(&front_matter, &body)?;
    atomic_write_file(&note_path, rewritten.as_bytes())?;

    zettels[position].links = front_matter.links;
    Ok(())
}
