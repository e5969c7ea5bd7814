use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use strum_macros::Display;

use crate::PartitionLabel;

/// Time window of one batch plus the number of server-side records each
/// partition is expected to produce.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchWindow {
    pub start_ms: i64,
    pub expected: BTreeMap<PartitionLabel, u64>,
}

impl BatchWindow {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self { start_ms: started_at.timestamp_millis(), expected: BTreeMap::new() }
    }

    pub fn expect(mut self, partition: PartitionLabel, count: u64) -> Self {
        self.expected.insert(partition, count);
        self
    }

    /// Start of the log query range, widened by `lookback`.
    pub fn query_start_ms(&self, lookback: Duration) -> i64 {
        self.start_ms - lookback.as_millis() as i64
    }

    /// Partitions that produced at least one successful call.
    pub fn queried_partitions(&self) -> impl Iterator<Item = (&PartitionLabel, u64)> {
        self.expected
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(label, count)| (label, *count))
    }
}

/// Server-side invocation counts by route (region or account).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteDistribution {
    counts: BTreeMap<String, u64>,
}

impl RouteDistribution {
    pub fn record(mut self, route: impl ToString, count: u64) -> Self {
        *self.counts.entry(route.to_string()).or_default() += count;
        self
    }

    pub fn counts(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<(String, u64)> for RouteDistribution {
    fn from_iter<T: IntoIterator<Item = (String, u64)>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Self::default(), |acc, (route, count)| acc.record(route, count))
    }
}

/// Best snapshot seen so far for one partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub snapshot: RouteDistribution,
    pub expected: u64,
}

impl Reconciled {
    /// A snapshot is final only when it counts exactly the expected calls.
    /// Fewer means records have not propagated yet, more means records from
    /// outside the batch leaked into the window.
    pub fn is_complete(&self) -> bool {
        self.snapshot.total() == self.expected
    }

    fn distance(&self) -> u64 {
        self.snapshot.total().abs_diff(self.expected)
    }
}

/// Per-partition reconciliation state across polling attempts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciledDistribution {
    partitions: BTreeMap<PartitionLabel, Reconciled>,
}

impl ReconciledDistribution {
    /// Offers a new snapshot for a partition.
    ///
    /// A complete snapshot is never replaced. Otherwise the snapshot whose
    /// total is closest to the expected count wins, so the best available
    /// data survives a later empty query.
    pub fn offer(&mut self, partition: PartitionLabel, expected: u64, snapshot: RouteDistribution) {
        let candidate = Reconciled { snapshot, expected };
        match self.partitions.get(&partition) {
            Some(current) if current.is_complete() => {}
            Some(current) if current.distance() <= candidate.distance() => {}
            _ => {
                self.partitions.insert(partition, candidate);
            }
        }
    }

    pub fn get(&self, partition: &PartitionLabel) -> Option<&Reconciled> {
        self.partitions.get(partition)
    }

    pub fn is_complete_for(&self, partition: &PartitionLabel) -> bool {
        self.get(partition).is_some_and(Reconciled::is_complete)
    }

    /// Observed total for a partition, 0 when nothing was seen.
    pub fn found(&self, partition: &PartitionLabel) -> u64 {
        self.get(partition).map(|r| r.snapshot.total()).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PartitionLabel, &Reconciled)> {
        self.partitions.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.values().all(|r| r.snapshot.is_empty())
    }
}

/// Final result of the reconciliation poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub distribution: ReconciledDistribution,
    pub attempts: usize,
    /// True when every queried partition reached its expected count.
    pub complete: bool,
}

/// Status of a submitted log analytics query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum QueryStatus {
    Running,
    Complete,
    Failed,
    Cancelled,
    NotFound,
}

/// A log analytics query counting invocations of one route identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub log_group: String,
    pub model_id: String,
    pub start_ms: i64,
    pub end_ms: i64,
}

impl LogQuery {
    /// Query text grouping matching invocations by serving region.
    ///
    /// Invocation logs store the model id as an inference-profile ARN, hence
    /// the suffix match.
    pub fn query_string(&self) -> String {
        format!(
            "filter modelId like /inference-profile\\/{}/\nand toMillis(@timestamp) >= {}\n| stats count(*) as invocationCount by inferenceRegion\n| sort inferenceRegion",
            self.model_id, self.start_ms
        )
    }

    pub fn start_seconds(&self) -> i64 {
        self.start_ms / 1000
    }

    pub fn end_seconds(&self) -> i64 {
        self.end_ms / 1000
    }
}
