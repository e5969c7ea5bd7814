use std::sync::Arc;
use std::time::Duration;

use routeprobe_config::Config;
use routeprobe_display::{
    ProgressLine, REPORT_WIDTH, average_response_time, banner, load_balance_cumulative,
    load_balance_final, load_balance_summary, loop_header, router_settings_table, rule,
};
use routeprobe_domain::{BatchSummary, ProbeResult, RouteClassifier, RunTotals, route_usage};

use crate::fallback::routed_requests;
use crate::{ConsoleExt, Dispatcher, Infra, LoopRunner, ProgressStyle};

pub const LOAD_BALANCE_MODEL: &str = "claude-sonnet-loadbalance-demo";

const PROMPTS: [&str; 10] = [
    "What is machine learning?",
    "Explain cloud computing briefly.",
    "What are microservices?",
    "Define artificial intelligence.",
    "What is serverless computing?",
    "Explain containerization.",
    "What is DevOps?",
    "Define data science.",
    "What is edge computing?",
    "Explain API design.",
];

const LAUNCH_SPACING: Duration = Duration::from_millis(100);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct LoadBalanceReport {
    pub results: Vec<ProbeResult>,
    /// More than one deployment served the batch.
    pub distributed: bool,
}

/// Sends a batch to a model group backed by several deployments and shows
/// how the proxy spread it.
pub struct LoadBalanceDemo<I> {
    infra: Arc<I>,
    config: Arc<Config>,
}

impl<I: Infra> LoadBalanceDemo<I> {
    pub fn new(infra: Arc<I>, config: Arc<Config>) -> Self {
        Self { infra, config }
    }

    pub async fn run(&self, run_number: Option<u64>) -> anyhow::Result<LoadBalanceReport> {
        let console = &*self.infra;
        let classifier = RouteClassifier::new(self.config.fallback_models(LOAD_BALANCE_MODEL));

        let title = match run_number {
            Some(run) => format!("LITELLM LOAD BALANCING DEMO (Run #{run})"),
            None => "LITELLM LOAD BALANCING DEMO".to_string(),
        };
        console.print(banner(&title));
        console.println(
            "This demo shows how requests are distributed across multiple Claude Sonnet models",
        );
        console.println(format!(
            "Requests to '{LOAD_BALANCE_MODEL}' are load balanced between the primary deployments"
        ));
        console.println(
            "When primary models reach their rate limits, requests fall back to Sonnet 3.5\n",
        );
        console.println(router_settings_table(
            self.config.router.routing_strategy.as_deref(),
            &self.config.fallback_chain(LOAD_BALANCE_MODEL),
        ));

        console.progress(ProgressLine::info(format!(
            "Starting {} concurrent requests to demonstrate load balancing...",
            PROMPTS.len()
        )));
        console.println("");

        let style = ProgressStyle::Routed { classifier, width: 50, announce: false };
        let requests = routed_requests(LOAD_BALANCE_MODEL, &PROMPTS, LAUNCH_SPACING, REQUEST_TIMEOUT);
        let results = Dispatcher::new(self.infra.clone()).dispatch(requests, &style).await;

        console.print(format!("\n{}", load_balance_summary(&results)));
        let usage = route_usage(&results);
        let distributed = usage.len() > 1;
        if !usage.is_empty() {
            if distributed {
                console.progress(ProgressLine::success(
                    "LOAD BALANCING WORKING: Requests distributed across multiple models!",
                ));
            } else {
                console.progress(ProgressLine::warning(
                    "Only one model responded (normal if only one instance configured)",
                ));
            }
        }
        console.print(average_response_time(&BatchSummary::from_results(&results)));
        console.println(rule(REPORT_WIDTH));

        Ok(LoadBalanceReport { results, distributed })
    }

    /// Repeats the run until `runner` is cancelled, then prints totals.
    pub async fn run_loop(&self, runner: &LoopRunner) -> anyhow::Result<RunTotals> {
        let console = &*self.infra;
        console.print(loop_header("Load Balancing", runner.interval().as_secs()));

        let mut totals = RunTotals::default();
        loop {
            let run = totals.runs + 1;
            console.progress(ProgressLine::info(format!("Starting run #{run}")));
            let report = self.run(Some(run)).await?;
            totals.record(&report.results, report.distributed);
            console.print(load_balance_cumulative(&totals));

            if !runner.pause(console).await {
                break;
            }
        }

        console.println("");
        console.progress(ProgressLine::success("Demo stopped gracefully"));
        console.println("");
        console.print(load_balance_final(&totals));
        Ok(totals)
    }
}
