use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Per-stage counters shared between a stage's tasks and its observer
///
/// Cheap to clone: all clones point at the same counters. A value is
/// `received` when the stage accepts it from upstream and `forwarded` when
/// the downstream rendezvous completes; the difference is whatever the stage
/// filtered out, evicted, or still held when it stopped.
#[derive(Debug, Clone)]
pub struct StageMetrics {
    received: Arc<AtomicU64>,
    forwarded: Arc<AtomicU64>,
}

impl StageMetrics {
    /// Create a zeroed metrics handle
    pub fn new() -> Self {
        Self {
            received: Arc::new(AtomicU64::new(0)),
            forwarded: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Record a value accepted from upstream
    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a value handed to downstream
    pub fn record_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Total values accepted from upstream
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Total values handed to downstream
    pub fn forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }

    /// Values that entered the stage but never left it
    pub fn dropped(&self) -> u64 {
        self.received().saturating_sub(self.forwarded())
    }

    /// Get a snapshot of current counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            received: self.received(),
            forwarded: self.forwarded(),
            dropped: self.dropped(),
        }
    }
}

impl Default for StageMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of stage counters at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub received: u64,
    pub forwarded: u64,
    pub dropped: u64,
}

impl MetricsSnapshot {
    /// Format counters as a human-readable string
    pub fn format(&self) -> String {
        format!(
            "received: {}, forwarded: {}, dropped: {}",
            self.received, self.forwarded, self.dropped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = StageMetrics::new();
        for _ in 0..5 {
            metrics.record_received();
        }
        for _ in 0..3 {
            metrics.record_forwarded();
        }
        assert_eq!(metrics.received(), 5);
        assert_eq!(metrics.forwarded(), 3);
        assert_eq!(metrics.dropped(), 2);
    }

    #[test]
    fn clones_observe_the_same_counters() {
        let metrics = StageMetrics::new();
        let observer = metrics.clone();
        metrics.record_received();
        assert_eq!(observer.received(), 1);
    }

    #[test]
    fn snapshot_matches_counters() {
        let metrics = StageMetrics::new();
        metrics.record_received();
        metrics.record_forwarded();
        let snapshot = metrics.snapshot();
        assert_eq!(
            snapshot,
            MetricsSnapshot {
                received: 1,
                forwarded: 1,
                dropped: 0
            }
        );
        assert!(snapshot.format().contains("received: 1"));
    }
}
