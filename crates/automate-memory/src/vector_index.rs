//! The chunked hybrid vector + BM25 index over a tree of text files.
//!
//! One [`VectorIndex`] owns the chunk list, the embedding cache and the
//! per-file content hashes for one memory root (a session's memory
//! directory, an agent's shared memory directory, etc). Everything is
//! persisted as two JSON documents written through
//! [`automate_persistence::atomic_write_json`].

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use automate_models::Chunk;
use automate_persistence::{atomic_write_json, read_json_tolerant, DropCounter};
use serde::{Deserialize, Serialize};

use crate::bm25::{self, Document};
use crate::chunking::{chunk_text, materialize};
use crate::embedding::EmbeddingClient;
use crate::error::Result;

/// Index format version. Bumping this discards an on-disk index written by
/// an older layout rather than risking a misread.
const INDEX_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy)]
pub struct IndexConfig {
    pub chunk_size: usize,
    pub overlap: usize,
    pub vector_weight: f32,
    pub bm25_weight: f32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            chunk_size: 800,
            overlap: 100,
            vector_weight: 0.6,
            bm25_weight: 0.4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Hybrid,
    VectorOnly,
    TextOnly,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct IndexFile {
    version: u32,
    chunks: Vec<Chunk>,
    file_hashes: HashMap<String, String>,
}

/// A fingerprint-keyed embedding cache, persisted separately from the index
/// so a chunking-parameter change doesn't force every embedding to be
/// recomputed.
#[derive(Debug, Serialize, Deserialize, Default)]
struct EmbeddingCacheFile {
    entries: HashMap<String, Vec<f32>>,
}

pub struct VectorIndex {
    config: IndexConfig,
    chunks: Vec<Chunk>,
    file_hashes: HashMap<String, String>,
    embedding_cache: HashMap<String, Vec<f32>>,
    embedding_client: Arc<dyn EmbeddingClient>,
    index_path: PathBuf,
    cache_path: PathBuf,
    drop_counter: DropCounter,
}

fn fingerprint(text: &str) -> String {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

fn content_hash(content: &str) -> String {
    fingerprint(content)
}

impl VectorIndex {
    pub fn new(dir: impl AsRef<Path>, embedding_client: Arc<dyn EmbeddingClient>) -> Self {
        Self::with_config(dir, embedding_client, IndexConfig::default())
    }

    pub fn with_config(dir: impl AsRef<Path>, embedding_client: Arc<dyn EmbeddingClient>, config: IndexConfig) -> Self {
        let dir = dir.as_ref();
        VectorIndex {
            config,
            chunks: Vec::new(),
            file_hashes: HashMap::new(),
            embedding_cache: HashMap::new(),
            embedding_client,
            index_path: dir.join(".vector-index.json"),
            cache_path: dir.join(".embedding-cache.json"),
            drop_counter: DropCounter::new(),
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn dropped_count(&self) -> u64 {
        self.drop_counter.total()
    }

    /// Load persisted state. A version mismatch or corrupt file is treated
    /// as an empty index: corrupt persistent state is dropped, not fatal.
    pub fn load(&mut self) -> Result<()> {
        match read_json_tolerant::<IndexFile>(&self.index_path) {
            Some(file) if file.version == INDEX_FORMAT_VERSION => {
                self.chunks = file.chunks;
                self.file_hashes = file.file_hashes;
            }
            Some(_) => {
                self.drop_counter.record(&self.index_path, "index format version mismatch");
            }
            None => {}
        }

        if let Some(cache) = read_json_tolerant::<EmbeddingCacheFile>(&self.cache_path) {
            self.embedding_cache = cache.entries;
        }

        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        let index_file = IndexFile {
            version: INDEX_FORMAT_VERSION,
            chunks: self.chunks.clone(),
            file_hashes: self.file_hashes.clone(),
        };
        atomic_write_json(&self.index_path, &index_file)?;

        let cache_file = EmbeddingCacheFile { entries: self.embedding_cache.clone() };
        atomic_write_json(&self.cache_path, &cache_file)?;

        Ok(())
    }

    /// Whether `content` differs from what is currently indexed for `file_key`.
    pub fn needs_reindex(&self, file_key: &str, content: &str) -> bool {
        self.file_hashes.get(file_key).map(|h| h.as_str()) != Some(content_hash(content).as_str())
    }

    /// Re-chunk and re-embed `file_key`, replacing any chunks previously
    /// indexed for it. Returns the number of chunks now indexed for the
    /// file. A no-op (returns the existing count) if the content hash is
    /// unchanged.
    pub async fn index_file(&mut self, file_key: &str, content: &str) -> Result<usize> {
        let hash = content_hash(content);
        if self.file_hashes.get(file_key) == Some(&hash) {
            return Ok(self.chunks.iter().filter(|c| c.file == file_key).count());
        }

        self.chunks.retain(|c| c.file != file_key);

        let spans = chunk_text(content, self.config.chunk_size, self.config.overlap);
        let materialized = materialize(content, &spans);

        let mut seen_dedup: std::collections::HashSet<(String, String)> = std::collections::HashSet::new();
        let mut pieces = Vec::new();
        for (start, end, text) in materialized {
            let key = (file_key.to_string(), text.chars().take(100).collect::<String>());
            if !seen_dedup.insert(key) {
                continue;
            }
            pieces.push((start, end, text));
        }

        if pieces.is_empty() {
            self.file_hashes.insert(file_key.to_string(), hash);
            return Ok(0);
        }

        let mut to_embed_indices = Vec::new();
        let mut to_embed_texts = Vec::new();
        for (i, (_, _, text)) in pieces.iter().enumerate() {
            let fp = fingerprint(text);
            if !self.embedding_cache.contains_key(&fp) {
                to_embed_indices.push(i);
                to_embed_texts.push(text.clone());
            }
        }

        for batch_start in (0..to_embed_texts.len()).step_by(crate::embedding::MAX_BATCH_SIZE) {
            let batch_end = (batch_start + crate::embedding::MAX_BATCH_SIZE).min(to_embed_texts.len());
            let batch = &to_embed_texts[batch_start..batch_end];
            let embeddings = self.embedding_client.embed_batch(batch).await?;
            for (text, embedding) in batch.iter().zip(embeddings.into_iter()) {
                self.embedding_cache.insert(fingerprint(text), embedding);
            }
        }

        let mut new_chunks = Vec::with_capacity(pieces.len());
        for (index, (start, end, text)) in pieces.into_iter().enumerate() {
            let fp = fingerprint(&text);
            let embedding = self.embedding_cache.get(&fp).cloned().unwrap_or_default();
            new_chunks.push(Chunk::new(file_key, index, text, embedding, start, end));
        }

        let count = new_chunks.len();
        self.chunks.extend(new_chunks);
        self.file_hashes.insert(file_key.to_string(), hash);
        Ok(count)
    }

    /// Remove every chunk indexed for `file_key`. Returns the number removed.
    pub fn remove_file(&mut self, file_key: &str) -> usize {
        let before = self.chunks.len();
        self.chunks.retain(|c| c.file != file_key);
        self.file_hashes.remove(file_key);
        before - self.chunks.len()
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.file_hashes.clear();
        self.embedding_cache.clear();
    }

    pub async fn search(&self, query: &str, top_k: usize, mode: SearchMode) -> Result<Vec<ScoredChunk>> {
        if self.chunks.is_empty() || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let vector_scores = if matches!(mode, SearchMode::Hybrid | SearchMode::VectorOnly) {
            let query_embedding = self.embedding_client.embed_batch(&[query.to_string()]).await?;
            let q = query_embedding.into_iter().next().unwrap_or_default();
            let raw: Vec<f32> = self
                .chunks
                .iter()
                .map(|c| crate::embedding::cosine_similarity(&q, &c.embedding))
                .collect();
            normalize(&raw)
        } else {
            vec![0.0; self.chunks.len()]
        };

        let bm25_scores = if matches!(mode, SearchMode::Hybrid | SearchMode::TextOnly) {
            let corpus: Vec<Document> = self.chunks.iter().map(|c| Document::from_text(&c.text)).collect();
            normalize(&bm25::score_corpus(query, &corpus))
        } else {
            vec![0.0; self.chunks.len()]
        };

        let mut scored: Vec<ScoredChunk> = self
            .chunks
            .iter()
            .cloned()
            .zip(vector_scores.iter())
            .zip(bm25_scores.iter())
            .map(|((chunk, &v), &b)| {
                let score = match mode {
                    SearchMode::Hybrid => self.config.vector_weight * v + self.config.bm25_weight * b,
                    SearchMode::VectorOnly => v,
                    SearchMode::TextOnly => b,
                };
                ScoredChunk { chunk, score }
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }
}

fn normalize(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().cloned().fold(0.0f32, f32::max).max(0.001);
    scores.iter().map(|s| s / max).collect()
}
