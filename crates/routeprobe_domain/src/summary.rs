use std::collections::BTreeMap;
use std::time::Duration;

use crate::{PartitionLabel, ProbeResult};

/// Percentage of `part` in `whole`, defined as 0 when `whole` is 0.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

/// Summary statistics over a set of probe results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub throttled: u64,
    /// Mean latency over successful calls only.
    pub mean_latency: Duration,
}

impl BatchSummary {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a ProbeResult>) -> Self {
        let mut summary = Self::default();
        let mut latency_sum = Duration::ZERO;

        for result in results {
            summary.total += 1;
            if result.success {
                summary.successful += 1;
                latency_sum += result.latency;
            } else {
                summary.failed += 1;
                if result.is_throttled() {
                    summary.throttled += 1;
                }
            }
        }

        if summary.successful > 0 {
            summary.mean_latency = latency_sum / summary.successful as u32;
        }
        summary
    }

    pub fn success_rate(&self) -> f64 {
        percentage(self.successful, self.successful + self.failed)
    }

    pub fn is_fully_successful(&self) -> bool {
        self.total > 0 && self.failed == 0
    }
}

/// Groups results by partition and summarises each group.
pub fn summarize_by_partition(results: &[ProbeResult]) -> BTreeMap<PartitionLabel, BatchSummary> {
    let mut groups: BTreeMap<PartitionLabel, Vec<&ProbeResult>> = BTreeMap::new();
    for result in results {
        groups.entry(result.partition.clone()).or_default().push(result);
    }

    groups
        .into_iter()
        .map(|(label, group)| (label, BatchSummary::from_results(group)))
        .collect()
}

/// Counts successful results by the route that served them.
pub fn route_usage(results: &[ProbeResult]) -> BTreeMap<String, u64> {
    results
        .iter()
        .filter(|result| result.success)
        .filter_map(|result| result.route.clone())
        .fold(BTreeMap::new(), |mut acc, route| {
            *acc.entry(route).or_default() += 1;
            acc
        })
}
