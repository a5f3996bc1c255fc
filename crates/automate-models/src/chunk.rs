//! Chunk type for the vector index.

use serde::{Deserialize, Serialize};

/// An immutable slice of a source document, the atomic unit of indexing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// `"<file>:<chunk_index>"`.
    pub id: String,
    /// Source file key this chunk was produced from.
    pub file: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub char_start: usize,
    pub char_end: usize,
}

impl Chunk {
    pub fn new(file: &str, index: usize, text: String, embedding: Vec<f32>, char_start: usize, char_end: usize) -> Self {
        Self {
            id: format!("{file}:{index}"),
            file: file.to_string(),
            text,
            embedding,
            char_start,
            char_end,
        }
    }

    /// Dedup key: file plus first 100 chars of text.
    pub fn dedup_key(&self) -> (String, String) {
        let prefix: String = self.text.chars().take(100).collect();
        (self.file.clone(), prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_file_colon_index() {
        let c = Chunk::new("notes.md", 3, "hello".into(), vec![], 0, 5);
        assert_eq!(c.id, "notes.md:3");
    }

    #[test]
    fn dedup_key_truncates_to_100_chars() {
        let long = "x".repeat(200);
        let c = Chunk::new("f", 0, long.clone(), vec![], 0, 200);
        let (file, prefix) = c.dedup_key();
        assert_eq!(file, "f");
        assert_eq!(prefix.len(), 100);
    }
}
