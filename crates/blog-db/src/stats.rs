//! Statement accounting
//!
//! Every repository records the statements it sends so callers can observe
//! how many round-trips a fetch strategy costs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counter of executed SQL statements
#[derive(Debug, Default)]
pub struct QueryStats {
    statements: AtomicU64,
}

impl QueryStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Record one statement about to be executed
    pub fn record(&self, statement: &'static str) {
        let count = self.statements.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(target: "blog_db::sql", statement, count, "executing statement");
    }

    pub fn statements(&self) -> u64 {
        self.statements.load(Ordering::Relaxed)
    }

    /// Reset to zero, returning the previous count
    pub fn reset(&self) -> u64 {
        self.statements.swap(0, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_reset() {
        let stats = QueryStats::new();
        assert_eq!(stats.statements(), 0);

        stats.record("posts.find_page");
        stats.record("users.find_authors");
        assert_eq!(stats.statements(), 2);

        assert_eq!(stats.reset(), 2);
        assert_eq!(stats.statements(), 0);
    }

    #[test]
    fn test_shared_between_clones() {
        let stats = QueryStats::new();
        let shared = Arc::clone(&stats);
        shared.record("comments.find_by_post");
        assert_eq!(stats.statements(), 1);
    }
}
