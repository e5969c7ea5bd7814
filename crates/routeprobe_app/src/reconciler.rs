use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use chrono::Utc;
use derive_setters::Setters;
use futures::future::join_all;
use routeprobe_display::ProgressLine;
use routeprobe_domain::{
    BatchWindow, Error, LogQuery, PartitionLabel, QueryStatus, ReconcileOutcome,
    ReconciledDistribution, RouteDistribution,
};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{ConsoleExt, Infra};

/// Fixed polling schedule tuned for invocation log delivery latency.
#[derive(Debug, Clone, PartialEq, Eq, Setters)]
pub struct ReconcileSchedule {
    pub attempts: usize,
    pub first_wait: Duration,
    pub retry_wait: Duration,
    /// Margin subtracted from the batch start when filtering log records.
    pub lookback: Duration,
    pub query_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ReconcileSchedule {
    fn default() -> Self {
        Self {
            attempts: 5,
            first_wait: Duration::from_secs(60),
            retry_wait: Duration::from_secs(30),
            lookback: Duration::from_secs(60),
            query_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(2),
        }
    }
}

impl ReconcileSchedule {
    fn wait_before(&self, attempt: usize) -> Duration {
        if attempt == 0 { self.first_wait } else { self.retry_wait }
    }
}

/// A partition together with the credential profile its logs live under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTarget {
    pub partition: PartitionLabel,
    pub profile: String,
}

impl QueryTarget {
    pub fn new(partition: PartitionLabel, profile: impl ToString) -> Self {
        Self { partition, profile: profile.to_string() }
    }
}

/// Polls log analytics until server-side counts match the client's view.
pub struct Reconciler<I> {
    infra: Arc<I>,
    schedule: ReconcileSchedule,
    log_group: String,
    model_id: String,
}

impl<I: Infra> Reconciler<I> {
    pub fn new(infra: Arc<I>, log_group: impl ToString, model_id: impl ToString) -> Self {
        Self {
            infra,
            schedule: ReconcileSchedule::default(),
            log_group: log_group.to_string(),
            model_id: model_id.to_string(),
        }
    }

    pub fn schedule(mut self, schedule: ReconcileSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn lookback(&self) -> Duration {
        self.schedule.lookback
    }

    /// Runs the bounded retry loop.
    ///
    /// Each attempt queries every partition that is not complete yet, in
    /// parallel. Partitions without successful calls are never queried. The
    /// loop ends early once every queried partition is complete.
    pub async fn reconcile(&self, window: &BatchWindow, targets: &[QueryTarget]) -> ReconcileOutcome {
        let attempts = self.schedule.attempts;
        let mut distribution = ReconciledDistribution::default();
        let mut performed = 0;

        for attempt in 0..attempts {
            let wait = self.schedule.wait_before(attempt);
            self.infra.progress(ProgressLine::info(format!(
                "Waiting {}s for logs to propagate... ({}/{attempts})",
                wait.as_secs(),
                attempt + 1
            )));
            tokio::time::sleep(wait).await;
            performed = attempt + 1;

            let pending: Vec<_> = self
                .pending(window, targets, &distribution)
                .into_iter()
                .map(|(target, expected)| async move {
                    (target, expected, self.query_partition(target, window).await)
                })
                .collect();

            for (target, expected, outcome) in join_all(pending).await {
                match outcome {
                    Ok(snapshot) => distribution.offer(target.partition.clone(), expected, snapshot),
                    Err(error) => {
                        warn!(partition = %target.partition, "Log query attempt failed: {error:#}");
                        self.infra.progress(ProgressLine::warning(format!("{error:#}")));
                    }
                }
            }

            let missing = self.pending(window, targets, &distribution);
            if missing.is_empty() {
                info!(attempts = performed, "Reconciliation complete");
                break;
            }
            if attempt + 1 < attempts {
                self.report_missing(&missing, &distribution);
            }
        }

        let complete = self.pending(window, targets, &distribution).is_empty();
        ReconcileOutcome { distribution, attempts: performed, complete }
    }

    fn pending<'a>(
        &self,
        window: &BatchWindow,
        targets: &'a [QueryTarget],
        distribution: &ReconciledDistribution,
    ) -> Vec<(&'a QueryTarget, u64)> {
        window
            .queried_partitions()
            .filter(|(label, _)| !distribution.is_complete_for(label))
            .filter_map(|(label, expected)| {
                targets
                    .iter()
                    .find(|target| &target.partition == label)
                    .map(|target| (target, expected))
            })
            .collect()
    }

    fn report_missing(&self, missing: &[(&QueryTarget, u64)], distribution: &ReconciledDistribution) {
        let line = if let [(target, expected)] = missing {
            match distribution.found(&target.partition) {
                0 => format!("No data found yet for {}, will retry...", target.partition),
                found => format!(
                    "Found {found}/{expected} requests for {}, will retry for complete data...",
                    target.partition
                ),
            }
        } else {
            let parts: Vec<_> = missing
                .iter()
                .map(|(target, expected)| {
                    format!(
                        "{} ({}/{expected})",
                        target.partition,
                        distribution.found(&target.partition)
                    )
                })
                .collect();
            format!("Incomplete data for: {}, will retry...", parts.join(", "))
        };
        self.infra.progress(ProgressLine::warning(line));
    }

    async fn query_partition(
        &self,
        target: &QueryTarget,
        window: &BatchWindow,
    ) -> anyhow::Result<RouteDistribution> {
        let partition = &target.partition;
        let profile = target.profile.as_str();

        self.infra
            .verify_access(profile)
            .await
            .map_err(|_| Error::LogsUnavailable(partition.clone()))?;

        let query = LogQuery {
            log_group: self.log_group.clone(),
            model_id: self.model_id.clone(),
            start_ms: window.query_start_ms(self.schedule.lookback),
            end_ms: Utc::now().timestamp_millis(),
        };
        self.infra.progress(ProgressLine::info(format!(
            "Starting CloudWatch query for {partition}, model: {}",
            self.model_id
        )));

        let query_id = self
            .infra
            .start_query(profile, &query)
            .await
            .map_err(|error| Error::QueryStart {
                partition: partition.clone(),
                message: format!("{error:#}"),
            })?;

        self.wait_for_completion(partition, profile, &query_id).await?;
        self.infra.progress(ProgressLine::success(format!(
            "{partition} CloudWatch query completed"
        )));

        self.infra
            .query_results(profile, &query_id)
            .await
            .with_context(|| format!("Failed to read {partition} query results"))
    }

    async fn wait_for_completion(
        &self,
        partition: &PartitionLabel,
        profile: &str,
        query_id: &str,
    ) -> anyhow::Result<()> {
        let deadline = Instant::now() + self.schedule.query_timeout;

        loop {
            let status = self
                .infra
                .query_status(profile, &self.log_group, query_id)
                .await
                .with_context(|| format!("Error checking {partition} query status"))?;
            debug!(%partition, query_id, %status, "Polled log query");

            match status {
                QueryStatus::Complete => return Ok(()),
                QueryStatus::Running => {}
                QueryStatus::NotFound => return Err(Error::QueryNotFound(partition.clone()).into()),
                QueryStatus::Failed | QueryStatus::Cancelled => {
                    return Err(Error::QueryFailed { partition: partition.clone(), status }.into());
                }
            }

            if Instant::now() + self.schedule.poll_interval > deadline {
                return Err(Error::QueryTimeout {
                    partition: partition.clone(),
                    seconds: self.schedule.query_timeout.as_secs(),
                }
                .into());
            }
            tokio::time::sleep(self.schedule.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::tests::{MockInfra, snapshot};

    fn window() -> BatchWindow {
        BatchWindow::new(Utc::now())
    }

    fn targets() -> Vec<QueryTarget> {
        vec![
            QueryTarget::new("ACCOUNT1".into(), "primary"),
            QueryTarget::new("ACCOUNT2".into(), "secondary"),
        ]
    }

    fn reconciler(infra: Arc<MockInfra>) -> Reconciler<MockInfra> {
        Reconciler::new(infra, "BedrockModelInvocation", "us.anthropic.claude")
    }

    #[tokio::test(start_paused = true)]
    async fn test_undercount_is_retried_until_exact() {
        let infra = Arc::new(MockInfra::default().snapshots(
            "primary",
            vec![snapshot(&[("us-east-1", 7)]), snapshot(&[("us-east-1", 6), ("us-west-2", 4)])],
        ));
        let fixture = window().expect("ACCOUNT1".into(), 10);

        let actual = reconciler(infra.clone()).reconcile(&fixture, &targets()).await;

        assert!(actual.complete);
        assert_eq!(actual.attempts, 2);
        assert_eq!(actual.distribution.found(&"ACCOUNT1".into()), 10);
        assert_eq!(infra.queries_for("primary"), 2);
        assert!(
            infra
                .console_lines()
                .iter()
                .any(|line| line.ends_with("Found 7/10 requests for ACCOUNT1, will retry for complete data..."))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_overcount_is_not_accepted() {
        let infra = Arc::new(MockInfra::default().snapshots(
            "primary",
            vec![snapshot(&[("us-east-1", 12)]), snapshot(&[("us-east-1", 6), ("us-west-2", 4)])],
        ));
        let fixture = window().expect("ACCOUNT1".into(), 10);

        let actual = reconciler(infra.clone()).reconcile(&fixture, &targets()).await;

        assert!(actual.complete);
        assert_eq!(actual.attempts, 2);
        assert_eq!(actual.distribution.found(&"ACCOUNT1".into()), 10);
        assert_eq!(infra.queries_for("primary"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_overcount_is_partial() {
        let infra = Arc::new(
            MockInfra::default().snapshots("primary", vec![snapshot(&[("us-east-1", 12)])]),
        );
        let fixture = window().expect("ACCOUNT1".into(), 10);

        let actual = reconciler(infra.clone()).reconcile(&fixture, &targets()).await;

        assert!(!actual.complete);
        assert_eq!(actual.attempts, 5);
        assert_eq!(actual.distribution.found(&"ACCOUNT1".into()), 12);
        assert!(!actual.distribution.is_complete_for(&"ACCOUNT1".into()));
        assert_eq!(infra.queries_for("primary"), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_polled_within_log_group() {
        let infra = Arc::new(
            MockInfra::default().snapshots("primary", vec![snapshot(&[("us-east-1", 1)])]),
        );
        let fixture = window().expect("ACCOUNT1".into(), 1);

        reconciler(infra.clone()).reconcile(&fixture, &targets()).await;

        let actual = infra.status_polls();
        let expected = vec![(
            "primary".to_string(),
            "BedrockModelInvocation".to_string(),
            "primary-1".to_string(),
        )];
        assert_eq!(actual, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_attempts_return_best_partial_snapshot() {
        let infra = Arc::new(
            MockInfra::default().snapshots("primary", vec![snapshot(&[("us-east-1", 7)])]),
        );
        let fixture = window().expect("ACCOUNT1".into(), 10);
        let started = Instant::now();

        let actual = reconciler(infra.clone()).reconcile(&fixture, &targets()).await;

        assert!(!actual.complete);
        assert_eq!(actual.attempts, 5);
        assert_eq!(actual.distribution.found(&"ACCOUNT1".into()), 7);
        assert_eq!(infra.queries_for("primary"), 5);
        assert!(started.elapsed() >= Duration::from_secs(60 + 4 * 30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_partition_is_not_requeried() {
        let infra = Arc::new(
            MockInfra::default()
                .snapshots("primary", vec![snapshot(&[("us-east-1", 3)])])
                .snapshots(
                    "secondary",
                    vec![RouteDistribution::default(), RouteDistribution::default(), snapshot(&[("us-west-2", 2)])],
                ),
        );
        let fixture = window().expect("ACCOUNT1".into(), 3).expect("ACCOUNT2".into(), 2);

        let actual = reconciler(infra.clone()).reconcile(&fixture, &targets()).await;

        assert!(actual.complete);
        assert_eq!(actual.attempts, 3);
        assert_eq!(infra.queries_for("primary"), 1);
        assert_eq!(infra.queries_for("secondary"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partition_without_successes_is_skipped() {
        let infra = Arc::new(
            MockInfra::default().snapshots("primary", vec![snapshot(&[("us-east-1", 4)])]),
        );
        let fixture = window().expect("ACCOUNT1".into(), 4).expect("ACCOUNT2".into(), 0);

        let actual = reconciler(infra.clone()).reconcile(&fixture, &targets()).await;

        assert!(actual.complete);
        assert_eq!(actual.attempts, 1);
        assert_eq!(infra.queries_for("secondary"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_query_falls_through_to_next_attempt() {
        let infra = Arc::new(
            MockInfra::default()
                .statuses("primary", vec![QueryStatus::Running, QueryStatus::Failed, QueryStatus::Complete])
                .snapshots("primary", vec![snapshot(&[("us-east-1", 2)])]),
        );
        let fixture = window().expect("ACCOUNT1".into(), 2);

        let actual = reconciler(infra.clone()).reconcile(&fixture, &targets()).await;

        assert!(actual.complete);
        assert_eq!(actual.attempts, 2);
        assert!(
            infra
                .console_lines()
                .iter()
                .any(|line| line.ends_with("ACCOUNT1 log query failed"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_never_completing_times_out() {
        let infra = Arc::new(
            MockInfra::default()
                .statuses("primary", vec![QueryStatus::Running])
                .snapshots("primary", vec![snapshot(&[("us-east-1", 2)])]),
        );
        let fixture = window().expect("ACCOUNT1".into(), 2);
        let schedule = ReconcileSchedule::default().attempts(1usize);

        let actual = reconciler(infra.clone())
            .schedule(schedule)
            .reconcile(&fixture, &targets())
            .await;

        assert!(!actual.complete);
        assert!(actual.distribution.is_empty());
        assert!(
            infra
                .console_lines()
                .iter()
                .any(|line| line.ends_with("ACCOUNT1 log query timed out after 60s"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_query_is_not_found() {
        let infra = Arc::new(MockInfra::default().statuses("primary", vec![QueryStatus::NotFound]));
        let fixture = window().expect("ACCOUNT1".into(), 2);
        let schedule = ReconcileSchedule::default().attempts(1usize);

        reconciler(infra.clone())
            .schedule(schedule)
            .reconcile(&fixture, &targets())
            .await;

        assert!(
            infra
                .console_lines()
                .iter()
                .any(|line| line.ends_with("ACCOUNT1 log query not found"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_log_access_degrades() {
        let infra = Arc::new(MockInfra::default().deny_logs("primary"));
        let fixture = window().expect("ACCOUNT1".into(), 2);

        let actual = reconciler(infra.clone()).reconcile(&fixture, &targets()).await;

        assert!(!actual.complete);
        assert!(actual.distribution.is_empty());
        assert_eq!(infra.queries_for("primary"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_range_applies_lookback() {
        let infra = Arc::new(
            MockInfra::default().snapshots("primary", vec![snapshot(&[("us-east-1", 1)])]),
        );
        let fixture = BatchWindow { start_ms: 1_000_000, expected: Default::default() }
            .expect("ACCOUNT1".into(), 1);

        reconciler(infra.clone()).reconcile(&fixture, &targets()).await;

        let actual = infra.recorded_queries();
        assert_eq!(actual.len(), 1);
        assert_eq!(actual[0].start_ms, 940_000);
        assert_eq!(actual[0].log_group, "BedrockModelInvocation");
    }
}
