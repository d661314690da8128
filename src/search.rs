//! Full-text search plumbing around a ripgrep backend. The crate never
//! spawns the search tool itself; callers hand its `--json` output to
//! [`parse_search_output`] and build query patterns with the helpers
//! below.

use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SearchRecord {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: SearchData,
}

#[derive(Debug, Default, Deserialize)]
struct SearchData {
    #[serde(default)]
    path: TextField,
    #[serde(default)]
    line_number: Option<u64>,
    #[serde(default)]
    lines: TextField,
    #[serde(default)]
    submatches: Vec<Submatch>,
}

#[derive(Debug, Default, Deserialize)]
struct TextField {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct Submatch {
    #[serde(rename = "match")]
    matched: TextField,
}

/// One matched or context line from the search backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchLine {
    pub line_number: Option<u64>,
    pub text: String,
    pub is_match: bool,
}

/// Group the backend's JSON-lines output by file.
///
/// Blank lines are skipped; lines that fail to parse are logged and
/// skipped. Records without a path or line text (begin/end/summary
/// markers) contribute nothing.
pub fn parse_search_output(output: &str) -> BTreeMap<String, Vec<MatchLine>> {
    let mut results: BTreeMap<String, Vec<MatchLine>> = BTreeMap::new();

    for line in output.lines() {
        if line.is_empty() {
            continue;
        }
        let record: SearchRecord = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(err) => {
                log::warn!("Failed to parse search output line: {}", err);
                continue;
            }
        };

        let path = record.data.path.text;
        let text = record.data.lines.text.trim();
        if path.is_empty() || text.is_empty() {
            continue;
        }

        results.entry(path).or_default().push(MatchLine {
            line_number: record.data.line_number,
            text: text.to_string(),
            is_match: record.kind == "match",
        });
    }
    results
}

/// Matched fragments only, in backend order.
pub fn matched_terms(output: &str) -> Vec<String> {
    let mut terms = Vec::new();
    for line in output.lines() {
        if line.is_empty() {
            continue;
        }
        if let Ok(record) = serde_json::from_str::<SearchRecord>(line) {
            if record.kind == "match" {
                terms.extend(record.data.submatches.into_iter().map(|s| s.matched.text));
            }
        }
    }
    terms
}

/// Flatten grouped results into `path:text` lines for a fuzzy picker.
pub fn picker_lines(results: &BTreeMap<String, Vec<MatchLine>>) -> Vec<String> {
    let mut lines = Vec::new();
    for (path, matches) in results {
        for m in matches {
            lines.push(format!("{}:{}", path, m.text));
        }
    }
    lines
}

/// Pattern matching front matter titles; an empty keyword matches every
/// title line.
pub fn title_pattern(keyword: &str) -> String {
    if keyword.is_empty() {
        r"^title:\s*".to_string()
    } else {
        format!(r"^title:\s*.*{}", keyword)
    }
}

/// Pattern matching a front matter type line.
pub fn type_pattern(note_type: &str) -> String {
    format!(r"^type:\s*{}", note_type)
}

/// Pattern matching `tag` as a whole word inside a front matter tag list.
pub fn tag_pattern(tag: &str) -> String {
    format!(r"^tags:\s*\[.*\b{}\b.*\]", tag)
}
