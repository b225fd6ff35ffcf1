//! Hierarchical index configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for index recomputation and tree mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Rows written per UPDATE statement during recomputation.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Extra attempts after a snapshot conflict before giving up.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Backoff before the first retry, doubled on every further attempt.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
    /// Recompute indexes after a folder move commits.
    #[serde(default = "default_true")]
    pub reindex_after_move: bool,
    /// Recompute indexes after duplication or template materialization.
    #[serde(default = "default_true")]
    pub reindex_after_copy: bool,
}

impl IndexingConfig {
    /// Backoff to wait before retry number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(factor))
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff(),
            reindex_after_move: true,
            reindex_after_copy: true,
        }
    }
}

fn default_batch_size() -> usize {
    200
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    50
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        let config = IndexingConfig::default();
        assert_eq!(config.backoff_for(1), Duration::from_millis(50));
        assert_eq!(config.backoff_for(2), Duration::from_millis(100));
        assert_eq!(config.backoff_for(3), Duration::from_millis(200));
    }
}
