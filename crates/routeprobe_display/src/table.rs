use std::fmt::Write;

use routeprobe_domain::{BatchSummary, percentage};

pub const REPORT_WIDTH: usize = 80;
pub const SECTION_WIDTH: usize = 40;

pub fn rule(width: usize) -> String {
    "=".repeat(width)
}

pub fn thin_rule(width: usize) -> String {
    "-".repeat(width)
}

/// Title framed by full-width `=` rules.
pub fn banner(title: &str) -> String {
    format!("{}\n{title}\n{}\n", rule(REPORT_WIDTH), rule(REPORT_WIDTH))
}

/// Share of `part` in `whole` as `"12.5%"`, or `"N/A"` when `whole` is 0.
pub fn share_or_na(part: u64, whole: u64) -> String {
    if whole == 0 {
        "N/A".to_string()
    } else {
        format!("{:5.1}%", percentage(part, whole))
    }
}

/// Client-side totals of a batch.
pub fn batch_overview(summary: &BatchSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total Requests:        {}", summary.total);
    let _ = writeln!(out, "Successful:            {}", summary.successful);
    let _ = writeln!(out, "Failed:                {}", summary.failed);
    let _ = writeln!(out, "Throttled:             {}", summary.throttled);
    let _ = writeln!(out, "Success Rate:          {}", share_or_na(summary.successful, summary.total));
    let _ = writeln!(
        out,
        "Avg Response Time:     {:.2}s",
        summary.mean_latency.as_secs_f64()
    );
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_share_or_na() {
        assert_eq!(share_or_na(1, 3), " 33.3%");
        assert_eq!(share_or_na(0, 0), "N/A");
    }

    #[test]
    fn test_batch_overview_without_calls() {
        let actual = batch_overview(&BatchSummary::default());
        assert!(actual.contains("Success Rate:          N/A\n"));
        assert!(actual.contains("Avg Response Time:     0.00s\n"));
    }

    #[test]
    fn test_banner() {
        let actual = banner("CRIS ANALYSIS");
        assert!(actual.starts_with(&"=".repeat(80)));
        assert_eq!(actual.lines().nth(1), Some("CRIS ANALYSIS"));
    }
}
