use std::sync::Arc;

use chrono::{Local, Utc};
use futures::future::join_all;
use routeprobe_config::Config;
use routeprobe_display::{
    AccountSummaryTable, ProgressLine, REPORT_WIDTH, account_table, banner, query_parameters,
    region_table, rule,
};
use routeprobe_domain::{
    AccountIdentity, BatchSummary, BatchWindow, Endpoint, Error, PartitionLabel, ProbeRequest,
    ProbeResult, ReconcileOutcome, Strategy, summarize_by_partition,
};
use tokio::time::Instant;
use tracing::info;

use crate::{ConsoleExt, Dispatcher, Infra, ProgressStyle, QueryTarget, Reconciler, prompt_for};

const PROMPTS: [&str; 5] = [
    "Hello from cross-account request!",
    "Test message for account isolation demo",
    "Cross-account demo request",
    "Multi-account test message",
    "Account distribution test",
];

pub const PRIMARY_ACCOUNT: &str = "ACCOUNT1";
pub const SECONDARY_ACCOUNT: &str = "ACCOUNT2";

/// Outcome of an account sharding run.
#[derive(Debug, Clone, PartialEq)]
pub struct ShardingReport {
    pub accounts: Vec<AccountIdentity>,
    pub results: Vec<ProbeResult>,
    pub reconciliation: Option<ReconcileOutcome>,
}

/// Spreads a batch over two AWS accounts and compares per-account outcomes.
pub struct ShardingDemo<I> {
    infra: Arc<I>,
    config: Arc<Config>,
    reconciler: Reconciler<I>,
}

impl<I: Infra> ShardingDemo<I> {
    pub fn new(infra: Arc<I>, config: Arc<Config>) -> Self {
        let reconciler =
            Reconciler::new(infra.clone(), &config.aws.log_group, &config.cris.model_id);
        Self { infra, config, reconciler }
    }

    pub fn reconciler(mut self, reconciler: Reconciler<I>) -> Self {
        self.reconciler = reconciler;
        self
    }

    fn targets(&self) -> Vec<QueryTarget> {
        vec![
            QueryTarget::new(PRIMARY_ACCOUNT.into(), &self.config.aws.profile),
            QueryTarget::new(SECONDARY_ACCOUNT.into(), &self.config.aws.secondary_profile),
        ]
    }

    /// Resolves both profiles to accounts; either failing is fatal.
    async fn verify_accounts(&self) -> anyhow::Result<Vec<AccountIdentity>> {
        let targets = self.targets();
        let lookups = targets.iter().map(|target| async move {
            let account = self.infra.account_id(&target.profile).await;
            (target, account)
        });

        let mut accounts = Vec::new();
        let mut failure = None;
        for (target, account) in join_all(lookups).await {
            match account {
                Ok(id) => accounts.push(AccountIdentity::new(target.partition.clone(), &target.profile, id)),
                Err(error) => {
                    let error = Error::CredentialVerification {
                        account: target.partition.clone(),
                        profile: target.profile.clone(),
                        message: format!("{error:#}"),
                    };
                    self.infra.progress(ProgressLine::error(&error));
                    failure = failure.or(Some(error));
                }
            }
        }

        if let Some(error) = failure {
            self.infra.println(format!(
                "\nError: Failed to verify AWS credentials for both accounts.\n\
                 Please ensure both profiles are configured in ~/.aws/credentials\n  \
                 Primary profile: {}\n  Secondary profile: {}",
                self.config.aws.profile, self.config.aws.secondary_profile
            ));
            return Err(error.into());
        }
        Ok(accounts)
    }

    fn requests(&self, total: usize, strategy: Strategy) -> Vec<ProbeRequest> {
        let targets = self.targets();
        let labels: Vec<PartitionLabel> = targets.iter().map(|t| t.partition.clone()).collect();
        let plan = strategy.plan(total, &labels, &mut rand::thread_rng());

        plan.into_iter()
            .enumerate()
            .map(|(index, partition)| {
                let profile = targets
                    .iter()
                    .find(|target| target.partition == partition)
                    .map(|target| target.profile.clone())
                    .unwrap_or_else(|| self.config.aws.profile.clone());
                ProbeRequest::new(
                    index + 1,
                    partition,
                    prompt_for(&PROMPTS, index),
                    Endpoint::Bedrock { profile, model_id: self.config.cris.model_id.clone() },
                )
            })
            .collect()
    }

    pub async fn run(&self, total: usize, strategy: Strategy) -> anyhow::Result<ShardingReport> {
        let console = &*self.infra;
        let model_id = &self.config.cris.model_id;

        console.print(banner("AWS ACCOUNT SHARDING DEMO"));
        console.println(format!(
            "Sending {total} requests in parallel ({} per account) to demonstrate account sharding.",
            total / 2
        ));
        console.println(format!("Cross-Region inference profile: {model_id}"));
        console.println(format!("Distribution strategy: {strategy}"));
        console.println(
            "CRIS will automatically route requests to available regions within each AWS account for optimal performance\n",
        );

        let accounts = self.verify_accounts().await?;
        console.print(account_table(&accounts));
        let same_account = same_account(&accounts);
        if same_account {
            console.println("\nWarning: Both profiles point to the same AWS account!");
            console.println("For true cross-account demonstration, configure different accounts.");
        }

        console.println("");
        console.progress(ProgressLine::info("Starting cross-account requests..."));
        let started_at = Utc::now();
        let started = Instant::now();
        let requests = self.requests(total, strategy);
        info!(%strategy, requests = requests.len(), "Planned sharded batch");
        let results = Dispatcher::new(self.infra.clone())
            .dispatch(requests, &ProgressStyle::Account)
            .await;
        console.progress(ProgressLine::info(format!(
            "Demo completed in {:.1} seconds",
            started.elapsed().as_secs_f64()
        )));

        let partitions = summarize_by_partition(&results);
        let overall = BatchSummary::from_results(&results);
        console.print(format!("\n{}\n", banner("ACCOUNT SHARDING ANALYSIS")));
        console.print(AccountSummaryTable::new(&partitions, &overall).to_string());

        let mut reconciliation = None;
        if overall.successful > 0 {
            let window = partitions.iter().fold(BatchWindow::new(started_at), |window, (label, summary)| {
                window.expect(label.clone(), summary.successful)
            });
            let from = started_at
                - chrono::TimeDelta::from_std(self.reconciler.lookback()).unwrap_or_default();
            console.println("");
            console.println(query_parameters(
                "CloudWatch Query Parameters:",
                &self.config.aws.log_group,
                model_id,
                from.with_timezone(&Local),
                Local::now(),
            ));
            console.progress(ProgressLine::info("Waiting for logs to propagate to CloudWatch..."));

            let outcome = self.reconciler.reconcile(&window, &self.targets()).await;
            self.render_regions(&outcome);
            reconciliation = Some(outcome);
        }

        if same_account {
            console.println("\nNote: Both profiles use the same AWS account.");
            console.println("   For true quota isolation, configure different AWS accounts.");
        }
        console.println(rule(REPORT_WIDTH));

        Ok(ShardingReport { accounts, results, reconciliation })
    }

    fn render_regions(&self, outcome: &ReconcileOutcome) {
        let console = &*self.infra;
        if outcome.distribution.is_empty() {
            console.progress(ProgressLine::warning(
                "CloudWatch analysis unavailable (check AWS credentials/permissions)",
            ));
            return;
        }

        for (label, reconciled) in outcome.distribution.iter() {
            if reconciled.snapshot.is_empty() {
                continue;
            }
            console.print(format!("\n{label}:\n{}", region_table(&reconciled.snapshot, true)));
            if !reconciled.is_complete() {
                console.progress(ProgressLine::warning(format!(
                    "Partial data for {label}: found {}/{} invocations",
                    reconciled.snapshot.total(),
                    reconciled.expected
                )));
            }
        }
    }
}

fn same_account(accounts: &[AccountIdentity]) -> bool {
    match accounts {
        [first, second] => first.account_id == second.account_id,
        _ => false,
    }
}
