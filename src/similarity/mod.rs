//! Term-weight engine: TF-IDF vectors over the note corpus and the cosine
//! measure between them.

pub mod tokenizer;

use std::collections::{HashMap, HashSet};
use std::fs;

use crate::index::Zettel;
use tokenizer::Tokenizer;

/// Sparse term-to-weight vector.
pub type TermVector = HashMap<String, f64>;

/// Relative term frequency of one document. Weights sum to 1.0; an empty
/// token list yields an empty map.
pub fn term_frequency(tokens: &[String]) -> TermVector {
    let mut tf = TermVector::new();
    if tokens.is_empty() {
        return tf;
    }
    for token in tokens {
        *tf.entry(token.clone()).or_insert(0.0) += 1.0;
    }
    let total = tokens.len() as f64;
    for weight in tf.values_mut() {
        *weight /= total;
    }
    tf
}

/// Smoothed inverse document frequency over a corpus keyed by note key:
/// `ln(N / (1 + document_count))` per term.
pub fn inverse_document_frequency(documents: &HashMap<String, Vec<String>>) -> TermVector {
    let total_docs = documents.len() as f64;
    let mut document_count: HashMap<&str, f64> = HashMap::new();
    for tokens in documents.values() {
        let mut seen = HashSet::new();
        for token in tokens {
            if seen.insert(token.as_str()) {
                *document_count.entry(token.as_str()).or_insert(0.0) += 1.0;
            }
        }
    }

    let mut idf = TermVector::new();
    for (term, count) in document_count {
        idf.insert(term.to_string(), (total_docs / (1.0 + count)).ln());
    }
    idf
}

/// TF-IDF vector per document: elementwise product of the document's term
/// frequencies with the corpus inverse document frequencies.
pub fn tfidf_vectors(documents: &HashMap<String, Vec<String>>) -> HashMap<String, TermVector> {
    let idf = inverse_document_frequency(documents);
    let mut vectors = HashMap::new();
    for (key, tokens) in documents {
        let tf = term_frequency(tokens);
        let mut vector = TermVector::with_capacity(tf.len());
        for (term, tf_weight) in tf {
            let idf_weight = idf.get(&term).copied().unwrap_or(0.0);
            vector.insert(term, tf_weight * idf_weight);
        }
        vectors.insert(key.clone(), vector);
    }
    vectors
}

/// Cosine similarity of two sparse vectors. Returns 0.0 when either vector
/// has zero norm, so the result is never NaN.
pub fn cosine_similarity(a: &TermVector, b: &TermVector) -> f64 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    for (term, weight_a) in a {
        if let Some(weight_b) = b.get(term) {
            dot += weight_a * weight_b;
        }
        norm_a += weight_a * weight_a;
    }

    let mut norm_b = 0.0;
    for weight_b in b.values() {
        norm_b += weight_b * weight_b;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Tokenize every readable note in the index, keyed by note key.
///
/// Unreadable files and tokenizer failures are logged and skipped; the
/// affected notes simply get no vector.
pub fn build_corpus(zettels: &[Zettel], tokenizer: &dyn Tokenizer) -> HashMap<String, Vec<String>> {
    let mut documents = HashMap::new();
    for zettel in zettels {
        let content = match fs::read_to_string(&zettel.note_path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Skipping unreadable note {}: {}", zettel.note_path, e);
                continue;
            }
        };
        match tokenizer.tokenize(&content) {
            Ok(tokens) => {
                documents.insert(zettel.note_id.clone(), tokens);
            }
            Err(e) => {
                log::warn!(
                    "Tokenizer {} failed on {}: {}",
                    tokenizer.name(),
                    zettel.note_path,
                    e
                );
            }
        }
    }
    documents
}
