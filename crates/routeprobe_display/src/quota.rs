use std::fmt::{self, Write};

use colored::Colorize;
use routeprobe_domain::{BatchSummary, PartitionLabel, RunTotals};

use crate::table::{REPORT_WIDTH, SECTION_WIDTH, banner, rule, thin_rule};

/// A consumer row of the quota tables.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumerRow {
    pub label: PartitionLabel,
    /// `NOISY` or `NORMAL`.
    pub kind: String,
    pub rpm: Option<u32>,
    pub requests: usize,
}

/// Configured quota and planned load of every consumer.
pub fn consumer_quota_table(rows: &[ConsumerRow]) -> String {
    let mut out = String::from("| Consumer | RPM (quota) | # Requests | Type   |\n");
    out.push_str("|----------|-------------|------------|--------|\n");
    for row in rows {
        let rpm = row.rpm.map(|rpm| rpm.to_string()).unwrap_or_else(|| "N/A".to_string());
        let _ = writeln!(
            out,
            "| {:<8} | {rpm:<11} | {:<10} | {:<6} |",
            row.label.as_str(),
            row.requests,
            row.kind
        );
    }
    out
}

/// What each consumer should observe given its quota and planned load.
pub fn expected_behaviour(rows: &[ConsumerRow]) -> String {
    let mut out = String::from("Expected behavior based on individual quotas:\n");
    for row in rows {
        let who = format!("Consumer {} ({}):", row.label, row.kind);
        let _ = match row.rpm {
            Some(rpm) if row.requests as u64 > rpm as u64 => writeln!(
                out,
                "  • {who:<21} {} requests > {rpm} RPM quota  → {} requests should be throttled",
                row.requests,
                row.requests as u64 - rpm as u64
            ),
            Some(rpm) => writeln!(
                out,
                "  • {who:<21} {} requests <= {rpm} RPM quota → all {} requests should succeed",
                row.requests, row.requests
            ),
            None => writeln!(out, "  • {who:<21} {} requests, no RPM quota configured", row.requests),
        };
    }
    out
}

/// Per-consumer outcome table; rows below 100% success are red.
pub struct ConsumerSummaryTable<'a> {
    rows: Vec<(&'a ConsumerRow, BatchSummary)>,
    with_colors: bool,
}

impl<'a> ConsumerSummaryTable<'a> {
    pub fn new(rows: Vec<(&'a ConsumerRow, BatchSummary)>) -> Self {
        Self { rows, with_colors: true }
    }

    pub fn with_colors(mut self, with_colors: bool) -> Self {
        self.with_colors = with_colors;
        self
    }
}

impl fmt::Display for ConsumerSummaryTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\n{}", banner("QUOTA ISOLATION ANALYSIS"))?;
        writeln!(
            f,
            "Consumer   | Type   | Success Rate | Total | Success | Failed | Rate Limited | Avg Time"
        )?;
        writeln!(
            f,
            "-----------+--------+--------------+-------+---------+--------+--------------+---------"
        )?;

        for (row, summary) in &self.rows {
            let line = format!(
                "{:<10} | {:6} | {:5.1}%{:>7} | {:5} | {:7} | {:6} | {:12} | {:7.2}s",
                row.label.as_str(),
                row.kind,
                summary.success_rate(),
                " ",
                summary.total,
                summary.successful,
                summary.failed,
                summary.throttled,
                summary.mean_latency.as_secs_f64()
            );
            if self.with_colors && !summary.is_fully_successful() {
                writeln!(f, "{}", line.bright_red())?;
            } else {
                writeln!(f, "{line}")?;
            }
        }
        writeln!(f)
    }
}

/// Running totals printed after every quota isolation loop iteration.
pub fn quota_cumulative(totals: &RunTotals) -> String {
    let mut out = String::from("\nCUMULATIVE STATISTICS\n");
    let _ = writeln!(out, "{}", thin_rule(SECTION_WIDTH));
    let _ = writeln!(out, "Total Runs:                {}", totals.runs);
    let _ = writeln!(out, "Effective Isolation Runs:  {}", totals.effective_runs);
    let _ = writeln!(out, "Isolation Success Rate:    {:5.1}%", totals.effective_rate());

    out.push_str("\nCumulative Consumer Stats:\n");
    for (label, tally) in &totals.partitions {
        let _ = writeln!(
            out,
            "  Consumer-{label}: {:3} success, {:3} rate limited ({:5.1}% success rate)",
            tally.successful,
            tally.throttled,
            tally.success_rate()
        );
    }
    let _ = writeln!(out, "{}", thin_rule(SECTION_WIDTH));
    out
}

/// Closing statistics of a stopped quota isolation loop.
pub fn quota_final(totals: &RunTotals) -> String {
    let mut out = String::from("FINAL STATISTICS\n");
    let _ = writeln!(out, "{}", rule(REPORT_WIDTH));
    let _ = writeln!(out, "Total Runs Completed:      {}", totals.runs);
    let _ = writeln!(out, "Effective Isolation Runs:  {}", totals.effective_runs);
    let _ = writeln!(out, "Overall Isolation Success: {:5.1}%", totals.effective_rate());
    let _ = writeln!(out, "{}", rule(REPORT_WIDTH));
    out
}
