use std::sync::Arc;
use std::time::Duration;

use routeprobe_config::Config;
use routeprobe_display::{
    ConsumerRow, ConsumerSummaryTable, ProgressLine, banner, consumer_quota_table,
    expected_behaviour, loop_header, quota_cumulative, quota_final,
};
use routeprobe_domain::{
    BatchSummary, Endpoint, PartitionLabel, ProbeRequest, ProbeResult, RunTotals,
    summarize_by_partition,
};
use tokio::time::Instant;

use crate::{ConsoleExt, Dispatcher, Infra, LoopRunner, ProgressStyle};

const REQUESTS_PER_CONSUMER: usize = 5;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Minimum success rate a normal consumer needs for isolation to hold.
const ISOLATION_THRESHOLD: f64 = 80.0;

const PROMPT_STEMS: [&str; 10] = [
    "Hi #{}!", "Hello #{}", "Hey #{}", "Test #{}", "Quick #{}", "Fast #{}", "Demo #{}",
    "Quota #{}", "Limit #{}", "Check #{}",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerKind {
    Noisy,
    Normal,
}

impl ConsumerKind {
    fn as_str(&self) -> &'static str {
        match self {
            ConsumerKind::Noisy => "NOISY",
            ConsumerKind::Normal => "NORMAL",
        }
    }
}

/// A tenant of the proxy with its own key and model group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumer {
    pub label: &'static str,
    pub api_key: &'static str,
    pub model: &'static str,
    pub kind: ConsumerKind,
}

pub const CONSUMERS: [Consumer; 3] = [
    Consumer {
        label: "A",
        api_key: "consumer-a-key",
        model: "consumer-a-model",
        kind: ConsumerKind::Noisy,
    },
    Consumer {
        label: "B",
        api_key: "consumer-b-key",
        model: "consumer-b-model",
        kind: ConsumerKind::Normal,
    },
    Consumer {
        label: "C",
        api_key: "consumer-c-key",
        model: "consumer-c-model",
        kind: ConsumerKind::Normal,
    },
];

impl Consumer {
    fn prompt(&self, index: usize) -> String {
        PROMPT_STEMS[index % PROMPT_STEMS.len()].replace("{}", self.label)
    }

    fn requests(&self) -> Vec<ProbeRequest> {
        let endpoint = Endpoint::Proxy {
            api_key: self.api_key.to_string(),
            model: self.model.to_string(),
        };
        (0..REQUESTS_PER_CONSUMER)
            .map(|index| {
                ProbeRequest::new(index + 1, self.label.into(), self.prompt(index), endpoint.clone())
                    .timeout(REQUEST_TIMEOUT)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuotaReport {
    pub results: Vec<ProbeResult>,
    /// Every normal consumer kept at least the isolation threshold.
    pub isolation_effective: bool,
    pub noisy_rate_limited: bool,
}

/// Whether the normal consumers stayed above the isolation threshold.
pub fn isolation_effective(results: &[ProbeResult]) -> bool {
    let partitions = summarize_by_partition(results);
    CONSUMERS
        .iter()
        .filter(|consumer| consumer.kind == ConsumerKind::Normal)
        .all(|consumer| {
            partitions
                .get(&PartitionLabel::from(consumer.label))
                .is_some_and(|summary| summary.success_rate() >= ISOLATION_THRESHOLD)
        })
}

/// Runs one noisy and two well-behaved consumers side by side and checks
/// that only the noisy one gets throttled.
pub struct QuotaDemo<I> {
    infra: Arc<I>,
    config: Arc<Config>,
}

impl<I: Infra> QuotaDemo<I> {
    pub fn new(infra: Arc<I>, config: Arc<Config>) -> Self {
        Self { infra, config }
    }

    fn rows(&self) -> Vec<ConsumerRow> {
        CONSUMERS
            .iter()
            .map(|consumer| ConsumerRow {
                label: consumer.label.into(),
                kind: consumer.kind.as_str().to_string(),
                rpm: self.config.rpm_for(consumer.model),
                requests: REQUESTS_PER_CONSUMER,
            })
            .collect()
    }

    pub async fn run(&self, run_number: Option<u64>) -> anyhow::Result<QuotaReport> {
        let console = &*self.infra;
        let rows = self.rows();

        let mut title = "LITELLM QUOTA ISOLATION DEMO - THROTTLING NOISY NEIGHBORS".to_string();
        if let Some(run) = run_number {
            title.push_str(&format!(" (Run #{run})"));
        }
        console.print(banner(&title));
        console.println("This demo shows how quota isolation prevents one noisy consumer from");
        console.println("affecting other consumers.\n");
        console.println(consumer_quota_table(&rows));
        console.println(format!(
            "All consumers will send {REQUESTS_PER_CONSUMER} requests in parallel simultaneously."
        ));
        console.println("Quota isolation prevents Consumer A's throttling from affecting B and C.");
        console.println(expected_behaviour(&rows));

        console.progress(ProgressLine::info("Starting consumers..."));
        let started = Instant::now();
        let requests = CONSUMERS.iter().flat_map(Consumer::requests).collect();
        let results = Dispatcher::new(self.infra.clone())
            .dispatch(requests, &ProgressStyle::Consumer)
            .await;
        console.progress(ProgressLine::info(format!(
            "Demo completed in {:.1} seconds",
            started.elapsed().as_secs_f64()
        )));

        let partitions = summarize_by_partition(&results);
        let table_rows = rows
            .iter()
            .map(|row| (row, partitions.get(&row.label).cloned().unwrap_or_default()))
            .collect();
        console.print(ConsumerSummaryTable::new(table_rows).to_string());

        let isolation_effective = isolation_effective(&results);
        let noisy_rate_limited = CONSUMERS
            .iter()
            .filter(|consumer| consumer.kind == ConsumerKind::Noisy)
            .filter_map(|consumer| partitions.get(&PartitionLabel::from(consumer.label)))
            .any(|summary: &BatchSummary| summary.throttled > 0);

        if isolation_effective {
            console.progress(ProgressLine::success(
                "QUOTA ISOLATION WORKING: normal consumers were not affected by the noisy neighbor",
            ));
        } else {
            console.progress(ProgressLine::warning(
                "Quota isolation not effective: normal consumers fell below 80% success",
            ));
        }
        if !noisy_rate_limited {
            console.progress(ProgressLine::warning(
                "Noisy consumer was never rate limited (check its RPM quota)",
            ));
        }

        Ok(QuotaReport { results, isolation_effective, noisy_rate_limited })
    }

    /// Repeats the run until `runner` is cancelled, then prints totals.
    pub async fn run_loop(&self, runner: &LoopRunner) -> anyhow::Result<RunTotals> {
        let console = &*self.infra;
        console.print(loop_header("Quota Isolation", runner.interval().as_secs()));

        let mut totals = RunTotals::default();
        loop {
            let run = totals.runs + 1;
            console.progress(ProgressLine::info(format!("Starting run #{run}")));
            let report = self.run(Some(run)).await?;
            totals.record(&report.results, report.isolation_effective);
            console.print(quota_cumulative(&totals));

            if !runner.pause(console).await {
                break;
            }
        }

        console.println("");
        console.progress(ProgressLine::success("Demo stopped gracefully"));
        console.println("");
        console.print(quota_final(&totals));
        Ok(totals)
    }
}
