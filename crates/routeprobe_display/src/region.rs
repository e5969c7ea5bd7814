use std::fmt::Write;

use chrono::{DateTime, Local};
use routeprobe_domain::{RouteDistribution, percentage};

/// Invocation counts per serving region with their share of the total.
pub fn region_table(distribution: &RouteDistribution, framed: bool) -> String {
    let total = distribution.total();
    let mut out = String::new();

    if framed {
        out.push_str("-------------|-------------|------------\n");
    }
    out.push_str("Region       | Invocations | Percentage\n");
    out.push_str("-------------|-------------|------------\n");
    for (region, count) in distribution.counts() {
        let _ = writeln!(
            out,
            "{region:<12} | {count:>11} | {:>9.1}%",
            percentage(*count, total)
        );
    }
    out
}

/// Parameters of the log analytics query shown before polling starts.
pub fn query_parameters(
    heading: &str,
    log_group: &str,
    model_id: &str,
    from: DateTime<Local>,
    to: DateTime<Local>,
) -> String {
    format!(
        "{heading}\n  Log Group:    {log_group}\n  Model Filter: {model_id}\n  Time Range:   {} - {}\n",
        from.format("%H:%M:%S"),
        to.format("%H:%M:%S")
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_region_table() {
        let fixture: RouteDistribution = [("us-east-1".to_string(), 3), ("us-west-2".to_string(), 1)]
            .into_iter()
            .collect();

        let actual = region_table(&fixture, false);
        let expected = "\
Region       | Invocations | Percentage
-------------|-------------|------------
us-east-1    |           3 |      75.0%
us-west-2    |           1 |      25.0%
";
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_region_table_empty_has_no_rows() {
        let actual = region_table(&RouteDistribution::default(), true);
        assert_eq!(actual.lines().count(), 3);
    }

    #[test]
    fn test_query_parameters() {
        let from = Local.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        let to = Local.with_ymd_and_hms(2025, 1, 1, 10, 2, 30).unwrap();

        let actual = query_parameters("Query Parameters:", "BedrockModelInvocation", "us.model", from, to);
        assert!(actual.contains("  Log Group:    BedrockModelInvocation\n"));
        assert!(actual.ends_with("  Time Range:   10:00:00 - 10:02:30\n"));
    }
}
