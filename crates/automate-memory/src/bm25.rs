//! BM25 lexical scoring (k1 = 1.5, b = 0.75) over tokenized chunk text.

use std::collections::HashMap;

pub const K1: f32 = 1.5;
pub const B: f32 = 0.75;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is",
    "it", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there",
    "these", "they", "this", "to", "was", "will", "with", "you", "your", "i", "we", "do",
    "does", "did", "have", "has", "had", "can", "could", "would", "should", "from", "about",
];

/// Lowercase, split on non-alphanumeric runs, drop single-character tokens
/// and stopwords.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 1 && !STOPWORDS.contains(t))
        .map(|t| t.to_string())
        .collect()
}

/// A document's token multiset plus its length, prepared once per chunk.
pub struct Document {
    pub term_counts: HashMap<String, u32>,
    pub length: usize,
}

impl Document {
    pub fn from_text(text: &str) -> Self {
        let tokens = tokenize(text);
        let length = tokens.len();
        let mut term_counts = HashMap::new();
        for t in tokens {
            *term_counts.entry(t).or_insert(0) += 1;
        }
        Document { term_counts, length }
    }
}

/// Scores `query` against every document in `corpus`, returning one score
/// per corpus entry in the same order. Documents containing none of the
/// query terms score `0.0`.
pub fn score_corpus(query: &str, corpus: &[Document]) -> Vec<f32> {
    let query_terms = tokenize(query);
    if query_terms.is_empty() || corpus.is_empty() {
        return vec![0.0; corpus.len()];
    }

    let n = corpus.len() as f32;
    let avg_len: f32 = if corpus.is_empty() {
        0.0
    } else {
        corpus.iter().map(|d| d.length as f32).sum::<f32>() / n
    };

    let mut df: HashMap<&str, u32> = HashMap::new();
    for term in &query_terms {
        let count = corpus.iter().filter(|d| d.term_counts.contains_key(term)).count() as u32;
        df.insert(term.as_str(), count);
    }

    corpus
        .iter()
        .map(|doc| {
            let mut score = 0.0f32;
            for term in &query_terms {
                let f = *doc.term_counts.get(term).unwrap_or(&0) as f32;
                if f == 0.0 {
                    continue;
                }
                let n_q = *df.get(term.as_str()).unwrap_or(&0) as f32;
                let idf = ((n - n_q + 0.5) / (n_q + 0.5) + 1.0).ln();
                let denom = f + K1 * (1.0 - B + B * (doc.length as f32 / avg_len.max(1.0)));
                score += idf * (f * (K1 + 1.0)) / denom.max(1e-9);
            }
            score.max(0.0)
        })
        .collect()
}
