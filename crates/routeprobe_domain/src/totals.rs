use std::collections::BTreeMap;

use crate::{BatchSummary, PartitionLabel, ProbeResult, percentage, route_usage, summarize_by_partition};

/// Success and failure counts that can be summed across runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub successful: u64,
    pub failed: u64,
    pub throttled: u64,
}

impl Tally {
    pub fn total(&self) -> u64 {
        self.successful + self.failed
    }

    pub fn success_rate(&self) -> f64 {
        percentage(self.successful, self.total())
    }

    fn absorb(&mut self, summary: &BatchSummary) {
        self.successful += summary.successful;
        self.failed += summary.failed;
        self.throttled += summary.throttled;
    }
}

/// Statistics accumulated over the runs of a looping scenario.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunTotals {
    pub runs: u64,
    /// Runs the scenario judged as showing the expected behaviour.
    pub effective_runs: u64,
    pub overall: Tally,
    pub partitions: BTreeMap<PartitionLabel, Tally>,
    pub routes: BTreeMap<String, u64>,
}

impl RunTotals {
    pub fn record(&mut self, results: &[ProbeResult], effective: bool) {
        self.runs += 1;
        if effective {
            self.effective_runs += 1;
        }

        self.overall.absorb(&BatchSummary::from_results(results));
        for (label, summary) in summarize_by_partition(results) {
            self.partitions.entry(label).or_default().absorb(&summary);
        }
        for (route, count) in route_usage(results) {
            *self.routes.entry(route).or_default() += count;
        }
    }

    pub fn effective_rate(&self) -> f64 {
        percentage(self.effective_runs, self.runs)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_record_accumulates_runs() {
        let run = vec![
            ProbeResult::success(1, "B".into(), Duration::from_secs(1), "consumer-b"),
            ProbeResult::failure(2, "A".into(), Duration::ZERO, ErrorKind::Throttled),
        ];
        let mut fixture = RunTotals::default();

        fixture.record(&run, true);
        fixture.record(&run, false);

        assert_eq!(fixture.runs, 2);
        assert_eq!(fixture.effective_runs, 1);
        assert_eq!(fixture.effective_rate(), 50.0);
        assert_eq!(fixture.overall, Tally { successful: 2, failed: 2, throttled: 2 });
        assert_eq!(
            fixture.partitions[&PartitionLabel::from("A")],
            Tally { successful: 0, failed: 2, throttled: 2 }
        );
        assert_eq!(fixture.routes, BTreeMap::from([("consumer-b".to_string(), 2)]));
    }

    #[test]
    fn test_empty_totals() {
        let fixture = RunTotals::default();
        assert_eq!(fixture.effective_rate(), 0.0);
        assert_eq!(fixture.overall.success_rate(), 0.0);
    }
}
