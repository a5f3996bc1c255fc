//! Identity files, curated long-term memory, daily logs and prompt
//! injection, delegating chunked semantic search to
//! [`automate_memory::VectorIndex`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use automate_memory::{EmbeddingClient, IndexConfig, MemoryError, SearchMode, VectorIndex};
use automate_persistence::DropCounter;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::{AgentError, Result};

/// Character budget a single identity-file section is truncated to inside
/// the prompt injection, before a truncation marker is appended.
const SECTION_TRUNCATE_LEN: usize = 5_000;
/// Character budget `MEMORY.md` is truncated to.
const MEMORY_TRUNCATE_LEN: usize = 8_000;
/// Character budget yesterday's daily log tail is truncated to.
const YESTERDAY_LOG_TRUNCATE_LEN: usize = 2_000;

/// The closed set of recognized identity files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityFile {
    Personality,
    Bootstrap,
    Identity,
    User,
    Agents,
    Heartbeat,
    Tools,
    Memory,
}

impl IdentityFile {
    pub const ALL: [IdentityFile; 8] = [
        IdentityFile::Personality,
        IdentityFile::Bootstrap,
        IdentityFile::Identity,
        IdentityFile::User,
        IdentityFile::Agents,
        IdentityFile::Heartbeat,
        IdentityFile::Tools,
        IdentityFile::Memory,
    ];

    pub fn filename(self) -> &'static str {
        match self {
            IdentityFile::Personality => "PERSONALITY.md",
            IdentityFile::Bootstrap => "BOOTSTRAP.md",
            IdentityFile::Identity => "IDENTITY.md",
            IdentityFile::User => "USER.md",
            IdentityFile::Agents => "AGENTS.md",
            IdentityFile::Heartbeat => "HEARTBEAT.md",
            IdentityFile::Tools => "TOOLS.md",
            IdentityFile::Memory => "MEMORY.md",
        }
    }

    fn default_content(self) -> &'static str {
        match self {
            IdentityFile::Personality => include_str!("../assets/defaults/PERSONALITY.md"),
            IdentityFile::Bootstrap => include_str!("../assets/defaults/BOOTSTRAP.md"),
            IdentityFile::Identity => include_str!("../assets/defaults/IDENTITY.md"),
            IdentityFile::User => include_str!("../assets/defaults/USER.md"),
            IdentityFile::Agents => include_str!("../assets/defaults/AGENTS.md"),
            IdentityFile::Heartbeat => include_str!("../assets/defaults/HEARTBEAT.md"),
            IdentityFile::Tools => include_str!("../assets/defaults/TOOLS.md"),
            IdentityFile::Memory => include_str!("../assets/defaults/MEMORY.md"),
        }
    }

    pub fn from_filename(name: &str) -> Option<IdentityFile> {
        IdentityFile::ALL.into_iter().find(|f| f.filename() == name)
    }
}

/// Where a [`SearchResult`] ultimately came from, after the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchSource {
    Hybrid,
    VectorOnly,
    Bm25Fallback,
    LegacySubstring,
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub file: String,
    pub text: String,
    pub score: f32,
    pub source: SearchSource,
}

pub struct MemoryManagerConfig {
    pub directory: PathBuf,
    pub shared_directory: Option<PathBuf>,
    pub index: IndexConfig,
}

impl MemoryManagerConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        MemoryManagerConfig {
            directory: directory.into(),
            shared_directory: None,
            index: IndexConfig::default(),
        }
    }
}

pub struct MemoryManager {
    directory: PathBuf,
    shared_directory: Option<PathBuf>,
    index: RwLock<VectorIndex>,
    indexing_enabled: std::sync::atomic::AtomicBool,
    drop_counter: DropCounter,
}

impl MemoryManager {
    pub fn new(config: MemoryManagerConfig, embedding_client: Arc<dyn EmbeddingClient>) -> Self {
        let index = VectorIndex::with_config(&config.directory, embedding_client, config.index);
        MemoryManager {
            directory: config.directory,
            shared_directory: config.shared_directory,
            index: RwLock::new(index),
            indexing_enabled: std::sync::atomic::AtomicBool::new(true),
            drop_counter: DropCounter::new(),
        }
    }

    fn path_for(&self, file: IdentityFile) -> PathBuf {
        self.directory.join(file.filename())
    }

    /// Copy any missing identity file from the bundled defaults. Called on
    /// first initialization.
    pub fn ensure_defaults(&self) -> Result<()> {
        std::fs::create_dir_all(&self.directory)?;
        for file in IdentityFile::ALL {
            let path = self.path_for(file);
            if !path.exists() {
                std::fs::write(&path, file.default_content())?;
            }
        }
        Ok(())
    }

    pub fn get_identity_file(&self, file: IdentityFile) -> Result<Option<String>> {
        let path = self.path_for(file);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(&path)?))
    }

    pub fn save_identity_file(&self, file: IdentityFile, content: &str) -> Result<()> {
        std::fs::create_dir_all(&self.directory)?;
        std::fs::write(self.path_for(file), content)?;
        Ok(())
    }

    pub fn has_bootstrap(&self) -> bool {
        self.path_for(IdentityFile::Bootstrap).exists()
    }

    pub fn delete_bootstrap(&self) -> Result<()> {
        let path = self.path_for(IdentityFile::Bootstrap);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn get_memory(&self) -> Result<String> {
        Ok(self.get_identity_file(IdentityFile::Memory)?.unwrap_or_default())
    }

    pub fn save_memory(&self, content: &str) -> Result<()> {
        self.save_identity_file(IdentityFile::Memory, content)
    }

    pub fn append_memory(&self, entry: &str) -> Result<()> {
        let mut current = self.get_memory()?;
        if !current.is_empty() && !current.ends_with('\n') {
            current.push('\n');
        }
        current.push_str(entry);
        if !current.ends_with('\n') {
            current.push('\n');
        }
        self.save_memory(&current)
    }

    fn daily_log_path(&self, date: NaiveDate) -> PathBuf {
        self.directory.join(format!("{}.md", date.format("%Y-%m-%d")))
    }

    pub fn append_daily_log(&self, entry: &str) -> Result<()> {
        std::fs::create_dir_all(&self.directory)?;
        let path = self.daily_log_path(Utc::now().date_naive());
        let mut content = if path.exists() { std::fs::read_to_string(&path)? } else { String::new() };
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(entry);
        if !content.ends_with('\n') {
            content.push('\n');
        }
        std::fs::write(&path, content)?;
        Ok(())
    }

    pub fn get_daily_log(&self, date: NaiveDate) -> Result<Option<String>> {
        let path = self.daily_log_path(date);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(&path)?))
    }

    /// Yesterday's and today's logs, in that order, skipping either one that
    /// doesn't exist.
    pub fn get_recent_daily_logs(&self) -> Result<Vec<(NaiveDate, String)>> {
        let today = Utc::now().date_naive();
        let yesterday = today - ChronoDuration::days(1);
        let mut out = Vec::new();
        if let Some(content) = self.get_daily_log(yesterday)? {
            out.push((yesterday, content));
        }
        if let Some(content) = self.get_daily_log(today)? {
            out.push((today, content));
        }
        Ok(out)
    }

    /// Delete all identity files and the index, then recreate the bundled
    /// defaults.
    pub async fn factory_reset(&self) -> Result<()> {
        for file in IdentityFile::ALL {
            let path = self.path_for(file);
            if path.exists() {
                std::fs::remove_file(&path)?;
            }
        }
        {
            let mut index = self.index.write().await;
            index.clear();
            index.save()?;
        }
        self.ensure_defaults()?;
        Ok(())
    }

    pub async fn enable_indexing(&self) {
        self.indexing_enabled.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    pub async fn disable_indexing(&self) {
        self.indexing_enabled.store(false, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn indexing_enabled(&self) -> bool {
        self.indexing_enabled.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub async fn clear_index(&self) -> Result<()> {
        let mut index = self.index.write().await;
        index.clear();
        index.save()?;
        Ok(())
    }

    /// Load any persisted index state. Call once at startup.
    pub async fn load_index(&self) -> Result<()> {
        self.index.write().await.load()?;
        Ok(())
    }

    fn markdown_files(&self) -> Result<Vec<PathBuf>> {
        if !self.directory.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in std::fs::read_dir(&self.directory)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("md") {
                out.push(path);
            }
        }
        out.sort();
        Ok(out)
    }

    /// Re-index every markdown file in the memory directory. Returns
    /// `(files_indexed, chunks_indexed, files_skipped)`.
    pub async fn index_all(&self) -> Result<(usize, usize, usize)> {
        if !self.indexing_enabled() {
            return Ok((0, 0, 0));
        }

        let files = self.markdown_files()?;
        let mut files_indexed = 0;
        let mut chunks_indexed = 0;
        let mut files_skipped = 0;

        let mut index = self.index.write().await;
        for path in files {
            let key = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            let content = match std::fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) => {
                    warn!(file = %key, error = %e, "failed to read memory file for indexing");
                    files_skipped += 1;
                    continue;
                }
            };

            if !index.needs_reindex(&key, &content) {
                files_skipped += 1;
                continue;
            }

            match index.index_file(&key, &content).await {
                Ok(count) => {
                    files_indexed += 1;
                    chunks_indexed += count;
                }
                Err(e) => {
                    warn!(file = %key, error = %e, "failed to index memory file");
                    files_skipped += 1;
                }
            }
        }
        index.save()?;

        Ok((files_indexed, chunks_indexed, files_skipped))
    }

    /// Hybrid search with graceful degradation: embedding failure falls back
    /// to BM25-only over existing chunks; no chunks at all falls back to a
    /// legacy substring scan over the memory directory's markdown files.
    pub async fn semantic_search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let index = self.index.read().await;

        if index.chunk_count() == 0 {
            drop(index);
            return self.legacy_substring_search(query, limit);
        }

        match index.search(query, limit, SearchMode::Hybrid).await {
            Ok(scored) => Ok(scored
                .into_iter()
                .map(|s| SearchResult {
                    file: s.chunk.file,
                    text: s.chunk.text,
                    score: s.score,
                    source: SearchSource::Hybrid,
                })
                .collect()),
            Err(MemoryError::Embedding(reason)) => {
                warn!(%reason, "embedding API failed, falling back to BM25-only search");
                let scored = index.search(query, limit, SearchMode::TextOnly).await?;
                Ok(scored
                    .into_iter()
                    .map(|s| SearchResult {
                        file: s.chunk.file,
                        text: s.chunk.text,
                        score: s.score,
                        source: SearchSource::Bm25Fallback,
                    })
                    .collect())
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Substring scan over the memory directory's markdown files, used only
    /// when no chunks exist at all. Returns synthetic results with a neutral
    /// score.
    fn legacy_substring_search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let needle = query.to_lowercase();
        if needle.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        for path in self.markdown_files()? {
            let Ok(content) = std::fs::read_to_string(&path) else { continue };
            if content.to_lowercase().contains(&needle) {
                let file = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
                out.push(SearchResult {
                    file,
                    text: content.chars().take(400).collect(),
                    score: 0.5,
                    source: SearchSource::LegacySubstring,
                });
            }
            if out.len() >= limit {
                break;
            }
        }
        Ok(out)
    }

    /// Compose the full prompt-injection string.
    pub fn get_prompt_injection(&self) -> Result<String> {
        let mut sections: Vec<String> = Vec::new();

        if let Some(bootstrap) = self.get_identity_file(IdentityFile::Bootstrap)? {
            if !bootstrap.trim().is_empty() {
                sections.push(format!("## FIRST RUN\n\n{bootstrap}"));
            }
        }

        for file in [
            IdentityFile::Agents,
            IdentityFile::Personality,
            IdentityFile::Identity,
            IdentityFile::User,
            IdentityFile::Tools,
        ] {
            if let Some(content) = self.get_identity_file(file)? {
                if content.trim().is_empty() {
                    continue;
                }
                let body = truncate_with_marker(&content, SECTION_TRUNCATE_LEN);
                sections.push(format!("## {}\n\n{body}", file.filename()));
            }
        }

        if let Some(memory) = self.get_identity_file(IdentityFile::Memory)? {
            if !memory.trim().is_empty() {
                let body = truncate_with_marker_search(&memory, MEMORY_TRUNCATE_LEN);
                sections.push(format!("## Long-term Memory\n\n{body}"));
            }
        }

        let recent_logs = self.get_recent_daily_logs()?;
        if !recent_logs.is_empty() {
            let mut body = String::new();
            for (i, (date, content)) in recent_logs.iter().enumerate() {
                let is_yesterday = i == 0 && recent_logs.len() == 2;
                let rendered = if is_yesterday {
                    tail(content, YESTERDAY_LOG_TRUNCATE_LEN)
                } else {
                    content.clone()
                };
                if !body.is_empty() {
                    body.push_str("\n\n");
                }
                body.push_str(&format!("### {date}\n\n{rendered}"));
            }
            sections.push(format!("## Recent Daily Log\n\n{body}"));
        }

        if sections.is_empty() {
            return Ok(String::new());
        }

        Ok(format!(
            "\n\n# Agent Memory & Identity\n\n{}",
            sections.join("\n\n---\n\n")
        ))
    }

    /// Read/write surface for the shared cross-agent memory directory. A
    /// no-op read returns `None`/a no-op write errors if no shared directory
    /// was configured.
    pub fn read_shared(&self, key: &str) -> Result<Option<String>> {
        let Some(dir) = &self.shared_directory else { return Ok(None) };
        let path = dir.join(format!("{}.md", sanitize_key(key)));
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(&path)?))
    }

    pub fn write_shared(&self, key: &str, content: &str) -> Result<()> {
        let dir = self
            .shared_directory
            .as_ref()
            .ok_or_else(|| AgentError::Validation("no shared memory directory configured".into()))?;
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.md", sanitize_key(key)));
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn drop_counter(&self) -> &DropCounter {
        &self.drop_counter
    }
}

fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '-' })
        .collect()
}

fn truncate_with_marker(content: &str, limit: usize) -> String {
    if content.chars().count() <= limit {
        return content.to_string();
    }
    let truncated: String = content.chars().take(limit).collect();
    format!("{truncated}\n\n_[truncated, {} characters omitted]_", content.chars().count() - limit)
}

fn truncate_with_marker_search(content: &str, limit: usize) -> String {
    if content.chars().count() <= limit {
        return content.to_string();
    }
    let truncated: String = content.chars().take(limit).collect();
    format!("{truncated}\n\n_[truncated — use semantic search for the remainder]_")
}

fn tail(content: &str, limit: usize) -> String {
    let chars: Vec<char> = content.chars().collect();
    if chars.len() <= limit {
        return content.to_string();
    }
    chars[chars.len() - limit..].iter().collect()
}

/// Extract the agent's configured name from `IDENTITY.md`'s first
/// `**Name:** <value>` line. Placeholder values (`_..._`, `(...)`, or
/// mentioning "pick something"/"pick one") are treated as unset.
pub fn extract_identity_field(identity_content: &str, label: &str) -> Option<String> {
    let prefix = format!("**{label}:**");
    for line in identity_content.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix(&prefix) {
            let value = rest.trim();
            if value.is_empty() {
                return None;
            }
            if value.starts_with('_') || value.starts_with('(') {
                return None;
            }
            let lowered = value.to_lowercase();
            if lowered.contains("pick something") || lowered.contains("pick one") {
                return None;
            }
            return Some(value.to_string());
        }
    }
    None
}

pub fn extract_agent_name(identity_content: &str) -> Option<String> {
    extract_identity_field(identity_content, "Name")
}

pub fn extract_agent_emoji(identity_content: &str) -> Option<String> {
    extract_identity_field(identity_content, "Emoji")
}

/// Effectively-empty test for heartbeat checklist content.
pub fn is_effectively_empty(content: &str) -> bool {
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "---" || trimmed == "***" {
            continue;
        }
        if trimmed.chars().all(|c| c == '#') {
            continue;
        }
        if is_empty_bullet(trimmed) {
            continue;
        }
        return false;
    }
    true
}

fn is_empty_bullet(trimmed: &str) -> bool {
    for marker in ["- ", "* ", "+ "] {
        if let Some(rest) = trimmed.strip_prefix(marker) {
            return rest.trim().is_empty();
        }
    }
    matches!(trimmed, "-" | "*" | "+")
}

#[cfg(test)]
mod tests {
    use super::*;
    use automate_memory::HashEmbeddingClient;
    use tempfile::TempDir;

    fn manager(dir: &Path) -> MemoryManager {
        MemoryManager::new(MemoryManagerConfig::new(dir), Arc::new(HashEmbeddingClient::new(8)))
    }

    #[test]
    fn ensure_defaults_populates_missing_files() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(dir.path());
        mgr.ensure_defaults().unwrap();
        for file in IdentityFile::ALL {
            assert!(dir.path().join(file.filename()).exists());
        }
    }

    #[test]
    fn ensure_defaults_does_not_overwrite_existing() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(dir.path());
        mgr.ensure_defaults().unwrap();
        mgr.save_identity_file(IdentityFile::Identity, "**Name:** Ada\n").unwrap();
        mgr.ensure_defaults().unwrap();
        let content = mgr.get_identity_file(IdentityFile::Identity).unwrap().unwrap();
        assert!(content.contains("Ada"));
    }

    #[test]
    fn has_bootstrap_reflects_file_presence() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(dir.path());
        mgr.ensure_defaults().unwrap();
        assert!(mgr.has_bootstrap());
        mgr.delete_bootstrap().unwrap();
        assert!(!mgr.has_bootstrap());
    }

    #[test]
    fn append_memory_adds_newline_separated_entries() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(dir.path());
        mgr.append_memory("first fact").unwrap();
        mgr.append_memory("second fact").unwrap();
        let content = mgr.get_memory().unwrap();
        assert!(content.contains("first fact"));
        assert!(content.contains("second fact"));
    }

    #[test]
    fn daily_log_round_trips_for_today() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(dir.path());
        mgr.append_daily_log("did a thing").unwrap();
        let logs = mgr.get_recent_daily_logs().unwrap();
        assert!(logs.iter().any(|(_, c)| c.contains("did a thing")));
    }

    #[test]
    fn prompt_injection_orders_sections_per_spec() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(dir.path());
        mgr.save_identity_file(IdentityFile::Bootstrap, "welcome").unwrap();
        mgr.save_identity_file(IdentityFile::Agents, "agent notes").unwrap();
        mgr.save_identity_file(IdentityFile::Memory, "long term fact").unwrap();

        let injection = mgr.get_prompt_injection().unwrap();
        assert!(injection.starts_with("\n\n# Agent Memory & Identity\n\n"));
        let bootstrap_pos = injection.find("## FIRST RUN").unwrap();
        let agents_pos = injection.find("## AGENTS.md").unwrap();
        let memory_pos = injection.find("## Long-term Memory").unwrap();
        assert!(bootstrap_pos < agents_pos);
        assert!(agents_pos < memory_pos);
    }

    #[test]
    fn prompt_injection_skips_empty_files() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(dir.path());
        mgr.save_identity_file(IdentityFile::Agents, "").unwrap();
        let injection = mgr.get_prompt_injection().unwrap();
        assert!(!injection.contains("## AGENTS.md"));
    }

    #[test]
    fn truncation_marks_oversized_sections() {
        let long = "x".repeat(SECTION_TRUNCATE_LEN + 500);
        let truncated = truncate_with_marker(&long, SECTION_TRUNCATE_LEN);
        assert!(truncated.contains("truncated"));
        assert!(truncated.len() < long.len());
    }

    #[tokio::test]
    async fn index_all_skips_unchanged_files() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(dir.path());
        std::fs::write(dir.path().join("notes.md"), "Some content about rust programming.").unwrap();

        let (indexed_first, _, skipped_first) = mgr.index_all().await.unwrap();
        assert_eq!(indexed_first, 1);
        assert_eq!(skipped_first, 0);

        let (indexed_second, _, skipped_second) = mgr.index_all().await.unwrap();
        assert_eq!(indexed_second, 0);
        assert_eq!(skipped_second, 1);
    }

    #[tokio::test]
    async fn semantic_search_falls_back_to_legacy_substring_with_no_chunks() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(dir.path());
        std::fs::write(dir.path().join("notes.md"), "PostgreSQL indexing strategies are great.").unwrap();

        let results = mgr.semantic_search("postgres", 5).await.unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].source, SearchSource::LegacySubstring);
    }

    #[tokio::test]
    async fn semantic_search_uses_hybrid_once_indexed() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(dir.path());
        std::fs::write(dir.path().join("notes.md"), "PostgreSQL indexing strategies are great for databases.").unwrap();
        mgr.index_all().await.unwrap();

        let results = mgr.semantic_search("postgres indexing", 5).await.unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].source, SearchSource::Hybrid);
    }

    #[test]
    fn extract_name_returns_none_for_placeholder() {
        assert_eq!(extract_agent_name("**Name:** _pick something_\n"), None);
        assert_eq!(extract_agent_name("**Name:** (unset)\n"), None);
        assert_eq!(extract_agent_name("**Name:** Ada\n"), Some("Ada".to_string()));
    }

    #[test]
    fn effectively_empty_ignores_structure_only_content() {
        assert!(is_effectively_empty("# Heartbeat\n\n---\n\n- \n***\n"));
        assert!(!is_effectively_empty("# Heartbeat\n\n- check the build\n"));
    }

    #[tokio::test]
    async fn factory_reset_restores_defaults_and_clears_index() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(dir.path());
        mgr.save_identity_file(IdentityFile::Identity, "**Name:** Ada\n").unwrap();
        mgr.index_all().await.unwrap();

        mgr.factory_reset().await.unwrap();

        let identity = mgr.get_identity_file(IdentityFile::Identity).unwrap().unwrap();
        assert!(identity.contains("pick something"));
        let (indexed, _, _) = mgr.index_all().await.unwrap();
        assert!(indexed > 0);
    }

    #[test]
    fn shared_memory_sanitizes_key() {
        let dir = TempDir::new().unwrap();
        let shared = dir.path().join("shared");
        let mut config = MemoryManagerConfig::new(dir.path());
        config.shared_directory = Some(shared.clone());
        let mgr = MemoryManager::new(config, Arc::new(HashEmbeddingClient::new(8)));

        mgr.write_shared("weird key!!", "content").unwrap();
        assert!(shared.join("weird-key--.md").exists());
        let read = mgr.read_shared("weird key!!").unwrap();
        assert_eq!(read, Some("content".to_string()));
    }
}
