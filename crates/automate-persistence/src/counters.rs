//! Observability for silently-tolerated corrupt state.
//!
//! Every load path that discards corrupt content on disk (sessions, jobs,
//! vector index, embedding cache) must make that loss observable rather than
//! truly silent. A [`DropCounter`] gives call sites a cheap, thread-safe
//! place to record it alongside a `tracing::warn!` log line.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct DropCounter {
    count: AtomicU64,
}

impl DropCounter {
    pub const fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
        }
    }

    /// Record one corrupt-file drop and emit a warning log line.
    pub fn record(&self, path: &std::path::Path, reason: &str) {
        self.count.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(path = %path.display(), reason, "discarded corrupt persisted state");
    }

    pub fn total(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_increments_total() {
        let counter = DropCounter::new();
        assert_eq!(counter.total(), 0);
        counter.record(std::path::Path::new("/tmp/x.json"), "invalid json");
        counter.record(std::path::Path::new("/tmp/y.json"), "invalid json");
        assert_eq!(counter.total(), 2);
    }
}
