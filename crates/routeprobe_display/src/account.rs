use std::collections::BTreeMap;
use std::fmt;

use colored::Colorize;
use routeprobe_domain::{AccountIdentity, BatchSummary, PartitionLabel};

use crate::table::thin_rule;

/// Verified accounts with masked ids and their profiles.
pub fn account_table(accounts: &[AccountIdentity]) -> String {
    let mut out = String::from("AWS Account Configuration:\n");
    out.push_str("-------------|------------|--------------------\n");
    out.push_str("Account Name | Account ID | Profile Name\n");
    out.push_str("-------------|------------|--------------------\n");
    for account in accounts {
        out.push_str(&format!(
            "{:<12} | {:>10} | {:<18}\n",
            account.partition.as_str(),
            account.masked_id(),
            account.profile
        ));
    }
    out.push_str("-------------|------------|--------------------\n");
    out
}

/// Per-account outcome table with a total row.
///
/// Rows with any failure are red, fully successful rows green.
pub struct AccountSummaryTable<'a> {
    partitions: &'a BTreeMap<PartitionLabel, BatchSummary>,
    overall: &'a BatchSummary,
    with_colors: bool,
}

impl<'a> AccountSummaryTable<'a> {
    pub fn new(
        partitions: &'a BTreeMap<PartitionLabel, BatchSummary>,
        overall: &'a BatchSummary,
    ) -> Self {
        Self { partitions, overall, with_colors: true }
    }

    pub fn with_colors(mut self, with_colors: bool) -> Self {
        self.with_colors = with_colors;
        self
    }

    fn row(&self, label: &str, summary: &BatchSummary) -> String {
        let line = format!(
            "{label:<10} | {:>5} | {:>7} | {:>6} | {:>11.1}% | {:>7.2}s",
            summary.total,
            summary.successful,
            summary.failed,
            summary.success_rate(),
            summary.mean_latency.as_secs_f64()
        );
        if !self.with_colors {
            line
        } else if summary.is_fully_successful() {
            line.bright_green().to_string()
        } else {
            line.bright_red().to_string()
        }
    }
}

impl fmt::Display for AccountSummaryTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", thin_rule(70))?;
        writeln!(f, "Account    | Total | Success | Failed | Success Rate | Avg Time")?;
        writeln!(f, "-----------|-------|---------|--------|--------------|----------")?;
        for (label, summary) in self.partitions {
            writeln!(f, "{}", self.row(label.as_str(), summary))?;
        }
        writeln!(f, "{}", thin_rule(70))?;
        writeln!(f, "{}", self.row("TOTAL", self.overall))
    }
}
