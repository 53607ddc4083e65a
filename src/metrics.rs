//! Metrics describing chain contents and the ingestion that produced them.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ChainError, Result};

/// Summary of a chain's contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainStats {
    /// Number of preceding words used as context.
    pub order: usize,
    /// Number of distinct state keys.
    pub states: usize,
    /// Total number of recorded (key, successor) observations.
    pub transitions: usize,
    /// Number of distinct words known to the chain.
    pub vocabulary: usize,
    /// Largest successor bag held by a single state.
    pub widest_state: usize,
}

impl ChainStats {
    /// Average number of successor observations per state.
    #[must_use]
    pub fn mean_successors(&self) -> f64 {
        if self.states == 0 {
            return 0.0;
        }
        self.transitions as f64 / self.states as f64
    }

    /// Serialises the summary to JSON.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let encoded = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        encoded.map_err(|err| ChainError::Internal(err.to_string()))
    }
}

/// Metrics captured for each ingested source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceMetrics {
    /// Path or URL of the source.
    pub source: String,
    /// Bytes read from the source.
    pub bytes_read: u64,
    /// Whitespace-separated tokens read before normalisation.
    pub tokens_read: usize,
    /// Words that survived normalisation and were fed to the chain.
    pub words_ingested: usize,
    /// Time spent on the source.
    pub elapsed: Duration,
}

/// Aggregate metrics produced by a build session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BuildMetrics {
    /// Per-source snapshots in ingestion order.
    pub sources: Vec<SourceMetrics>,
    /// Total duration of the build.
    pub total_duration: Duration,
}

impl BuildMetrics {
    /// Creates an empty metrics container with pre-allocated capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            sources: Vec::with_capacity(capacity),
            total_duration: Duration::ZERO,
        }
    }

    /// Words fed to the chain across every source.
    #[must_use]
    pub fn words_ingested(&self) -> usize {
        self.sources.iter().map(|source| source.words_ingested).sum()
    }

    /// Bytes read across every source.
    #[must_use]
    pub fn bytes_read(&self) -> u64 {
        self.sources.iter().map(|source| source.bytes_read).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_successors_handles_empty_chain() {
        assert_eq!(ChainStats::default().mean_successors(), 0.0);
        let stats = ChainStats {
            order: 2,
            states: 4,
            transitions: 10,
            vocabulary: 6,
            widest_state: 3,
        };
        assert!((stats.mean_successors() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn stats_serialise_to_json() {
        let stats = ChainStats {
            order: 1,
            states: 2,
            transitions: 3,
            vocabulary: 3,
            widest_state: 2,
        };
        let json = stats.to_json(false).expect("encode");
        let decoded: ChainStats = serde_json::from_str(&json).expect("decode");
        assert_eq!(decoded, stats);
        assert!(json.contains("\"widest_state\":2"));
    }

    #[test]
    fn build_metrics_totals_sources() {
        let mut metrics = BuildMetrics::new(2);
        for (name, words) in [("a.txt", 4), ("b.txt", 7)] {
            metrics.sources.push(SourceMetrics {
                source: name.into(),
                bytes_read: 10,
                tokens_read: words + 1,
                words_ingested: words,
                elapsed: Duration::from_millis(1),
            });
        }
        assert_eq!(metrics.words_ingested(), 11);
        assert_eq!(metrics.bytes_read(), 20);
    }
}
