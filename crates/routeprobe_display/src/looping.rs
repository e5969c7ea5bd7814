use std::fmt::Write;

use crate::table::{REPORT_WIDTH, rule};

/// Banner shown once when a scenario starts in loop mode.
pub fn loop_header(scenario: &str, interval_secs: u64) -> String {
    let mut out = format!("CONTINUOUS {} DEMO\n", scenario.to_uppercase());
    let _ = writeln!(out, "{}", rule(REPORT_WIDTH));
    let _ = writeln!(
        out,
        "Running {} demo every {interval_secs} seconds",
        scenario.to_lowercase()
    );
    out.push_str("Press Ctrl+C to stop gracefully\n");
    let _ = writeln!(out, "{}", rule(REPORT_WIDTH));
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_loop_header() {
        let actual = loop_header("Quota Isolation", 30);
        let lines: Vec<_> = actual.lines().collect();
        assert_eq!(lines[0], "CONTINUOUS QUOTA ISOLATION DEMO");
        assert_eq!(lines[2], "Running quota isolation demo every 30 seconds");
        assert_eq!(lines[3], "Press Ctrl+C to stop gracefully");
    }
}
