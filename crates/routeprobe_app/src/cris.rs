use std::sync::Arc;

use chrono::{Local, Utc};
use routeprobe_config::Config;
use routeprobe_display::{
    ProgressLine, banner, batch_overview, query_parameters, region_table, rule, REPORT_WIDTH,
};
use routeprobe_domain::{
    BatchSummary, BatchWindow, Endpoint, PartitionLabel, ProbeRequest, ProbeResult,
    ReconcileOutcome,
};
use tokio::time::Instant;

use crate::{ConsoleExt, Dispatcher, Infra, ProgressStyle, QueryTarget, Reconciler, prompt_for};

const PROMPTS: [&str; 5] = [
    "Hello from CRIS request!",
    "Test message for cross-region demo",
    "CRIS demo request",
    "Cross-region test message",
    "Regional distribution test",
];

pub const CRIS_PARTITION: &str = "CRIS";

/// Outcome of a cross-region inference run.
#[derive(Debug, Clone, PartialEq)]
pub struct CrisReport {
    pub results: Vec<ProbeResult>,
    /// `None` when no call succeeded and logs were not queried.
    pub reconciliation: Option<ReconcileOutcome>,
}

/// Sends a batch straight to a cross-region inference profile and reads back
/// which regions served it.
pub struct CrisDemo<I> {
    infra: Arc<I>,
    config: Arc<Config>,
    reconciler: Reconciler<I>,
}

impl<I: Infra> CrisDemo<I> {
    pub fn new(infra: Arc<I>, config: Arc<Config>) -> Self {
        let reconciler =
            Reconciler::new(infra.clone(), &config.aws.log_group, &config.cris.model_id);
        Self { infra, config, reconciler }
    }

    pub fn reconciler(mut self, reconciler: Reconciler<I>) -> Self {
        self.reconciler = reconciler;
        self
    }

    fn requests(&self, total: usize) -> Vec<ProbeRequest> {
        let endpoint = Endpoint::Bedrock {
            profile: self.config.aws.profile.clone(),
            model_id: self.config.cris.model_id.clone(),
        };
        (0..total)
            .map(|index| {
                ProbeRequest::new(
                    index + 1,
                    PartitionLabel::from(CRIS_PARTITION),
                    prompt_for(&PROMPTS, index),
                    endpoint.clone(),
                )
            })
            .collect()
    }

    pub async fn run(&self, total: usize) -> anyhow::Result<CrisReport> {
        let model_id = &self.config.cris.model_id;
        let console = &*self.infra;

        console.print(banner("AMAZON BEDROCK CROSS-REGION INFERENCE (CRIS) DEMO"));
        console.println(format!(
            "Sending {total} requests in parallel to demonstrate cross-region distribution."
        ));
        console.println(format!("Cross-Region inference profile: {model_id}"));
        console.println(
            "CRIS will automatically route requests to available regions for optimal performance\n",
        );

        console.progress(ProgressLine::info("Starting CRIS requests..."));
        let started_at = Utc::now();
        let started = Instant::now();
        let results = Dispatcher::new(self.infra.clone())
            .dispatch(self.requests(total), &ProgressStyle::Regional)
            .await;
        console.progress(ProgressLine::info(format!(
            "Demo completed in {:.1} seconds",
            started.elapsed().as_secs_f64()
        )));

        let summary = BatchSummary::from_results(&results);
        console.print(format!("\n{}", banner("CRIS ANALYSIS")));
        console.println(batch_overview(&summary));

        let mut reconciliation = None;
        if summary.successful > 0 {
            let window = BatchWindow::new(started_at)
                .expect(PartitionLabel::from(CRIS_PARTITION), summary.successful);
            let from = started_at
                - chrono::TimeDelta::from_std(self.reconciler.lookback()).unwrap_or_default();
            console.println(query_parameters(
                "Query Parameters:",
                &self.config.aws.log_group,
                model_id,
                from.with_timezone(&Local),
                Local::now(),
            ));
            console.progress(ProgressLine::info("Waiting for logs to propagate to CloudWatch..."));

            let targets = [QueryTarget::new(CRIS_PARTITION.into(), &self.config.aws.profile)];
            let outcome = self.reconciler.reconcile(&window, &targets).await;
            self.render_regions(&outcome);
            reconciliation = Some(outcome);
        }

        console.println(rule(REPORT_WIDTH));
        Ok(CrisReport { results, reconciliation })
    }

    fn render_regions(&self, outcome: &ReconcileOutcome) {
        let console = &*self.infra;
        let partition = PartitionLabel::from(CRIS_PARTITION);

        match outcome.distribution.get(&partition) {
            Some(reconciled) if !reconciled.snapshot.is_empty() => {
                console.print(format!("\n{}", region_table(&reconciled.snapshot, false)));
                if !reconciled.is_complete() {
                    console.progress(ProgressLine::warning(format!(
                        "Partial data: found {}/{} invocations after {} attempts",
                        reconciled.snapshot.total(),
                        reconciled.expected,
                        outcome.attempts
                    )));
                }
            }
            _ => console.progress(ProgressLine::warning(
                "CloudWatch analysis unavailable (check AWS credentials/permissions)",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use routeprobe_domain::{ErrorKind, ProbeFailure};

    use super::*;
    use crate::tests::{MockInfra, snapshot};

    #[tokio::test(start_paused = true)]
    async fn test_client_results_reconciled_with_regions() {
        let infra = Arc::new(
            MockInfra::default()
                .snapshots("default", vec![snapshot(&[("us-east-1", 12), ("us-west-2", 8)])]),
        );
        let fixture = CrisDemo::new(infra.clone(), Arc::new(Config::default()));

        let actual = fixture.run(20).await.unwrap();

        assert_eq!(actual.results.len(), 20);
        let reconciliation = actual.reconciliation.unwrap();
        assert!(reconciliation.complete);
        assert_eq!(reconciliation.attempts, 1);
        let text = infra.console_text();
        assert!(text.contains("us-east-1    |          12 |      60.0%"));
        assert!(text.contains("us-west-2    |           8 |      40.0%"));
        assert!(!text.contains("Partial data"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_failures_skip_log_queries() {
        let infra = (1..=3).fold(MockInfra::default(), |infra, sequence| {
            infra.reply(
                sequence,
                Err(ProbeFailure::new(ErrorKind::AccessDenied, "AccessDeniedException")),
                Duration::ZERO,
            )
        });
        let infra = Arc::new(infra);
        let fixture = CrisDemo::new(infra.clone(), Arc::new(Config::default()));

        let actual = fixture.run(3).await.unwrap();

        assert_eq!(actual.reconciliation, None);
        assert_eq!(infra.queries_for("default"), 0);
        assert!(infra.console_text().contains("Request # 1 | ERROR | Access Denied"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_logs_still_print_client_statistics() {
        let infra = Arc::new(MockInfra::default().deny_logs("default"));
        let fixture = CrisDemo::new(infra.clone(), Arc::new(Config::default()));

        let actual = fixture.run(4).await.unwrap();

        assert!(!actual.reconciliation.unwrap().complete);
        let text = infra.console_text();
        assert!(text.contains("Successful:"));
        assert!(text.contains("CloudWatch analysis unavailable (check AWS credentials/permissions)"));
    }
}
