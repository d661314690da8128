//! Link graph over index records: adjacency, backlinks, and root
//! detection for tree-style traversal.

use std::collections::{HashMap, HashSet};

use crate::frontmatter::types::NoteType;
use crate::index::Zettel;

/// Adjacency view of the note link structure.
///
/// Only notes that carry outgoing links get an adjacency entry; the
/// title and type maps cover every record so leaf nodes still resolve.
#[derive(Debug, Default)]
pub struct NoteGraph {
    pub adjacency: HashMap<String, Vec<String>>,
    pub titles: HashMap<String, String>,
    pub types: HashMap<String, NoteType>,
}

pub fn build_graph(zettels: &[Zettel]) -> NoteGraph {
    let mut graph = NoteGraph::default();
    for zettel in zettels {
        graph.titles.insert(zettel.note_id.clone(), zettel.title.clone());
        graph.types.insert(zettel.note_id.clone(), zettel.note_type);
        for link in &zettel.links {
            graph
                .adjacency
                .entry(zettel.note_id.clone())
                .or_default()
                .push(link.clone());
        }
    }
    graph
}

impl NoteGraph {
    /// Reverse adjacency: target note-key to the sorted keys linking to it.
    pub fn backlinks(&self) -> HashMap<String, Vec<String>> {
        let mut backlinks: HashMap<String, Vec<String>> = HashMap::new();
        for (source, targets) in &self.adjacency {
            for target in targets {
                backlinks.entry(target.clone()).or_default().push(source.clone());
            }
        }
        for sources in backlinks.values_mut() {
            sources.sort();
        }
        backlinks
    }

    /// Nodes with outgoing links that no other node points at, sorted.
    /// These are the natural starting points for a tree walk.
    pub fn root_nodes(&self) -> Vec<String> {
        let referenced: HashSet<&String> = self.adjacency.values().flatten().collect();
        let mut roots: Vec<String> = self
            .adjacency
            .keys()
            .filter(|node| !referenced.contains(*node))
            .cloned()
            .collect();
        roots.sort();
        roots
    }
}

/// Active records carrying `tag`, matched against whole tags without
/// regard to case.
pub fn filter_by_tag<'a>(zettels: &'a [Zettel], tag: &str) -> Vec<&'a Zettel> {
    let wanted = tag.to_lowercase();
    zettels
        .iter()
        .filter(|z| !z.lifecycle.is_archived() && !z.lifecycle.is_deleted())
        .filter(|z| z.tags.iter().any(|t| t.to_lowercase() == wanted))
        .collect()
}
