use std::fmt::Write;

use routeprobe_config::{DeploymentRole, ModelDeployment};

use crate::table::{REPORT_WIDTH, rule};

const DIVIDER: &str =
    "|-----------------------------------------------|-----------------------------|-----------|";

/// Router settings with the deployments of one fallback chain.
pub fn router_settings_table(
    routing_strategy: Option<&str>,
    chain: &[(DeploymentRole, &ModelDeployment)],
) -> String {
    let mut out = String::from("ROUTER SETTINGS CONFIGURATION\n");
    let _ = writeln!(out, "{}", rule(REPORT_WIDTH));
    let _ = writeln!(out, "Routing Strategy:      {}", routing_strategy.unwrap_or("N/A"));
    out.push('\n');
    let _ = writeln!(out, "{DIVIDER}");
    let _ = writeln!(
        out,
        "| {:<45} | {:<27} | {:<9} |",
        "Model", "Max Requests Per Min (RPM)", "Type"
    );
    let _ = writeln!(out, "{DIVIDER}");
    for (role, deployment) in chain {
        let rpm = deployment
            .rpm
            .map(|rpm| rpm.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let _ = writeln!(
            out,
            "| {:<45} | {rpm:<27} | {:<9} |",
            deployment.model,
            role.to_string()
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_router_settings_table() {
        let primary = ModelDeployment::new("demo", "bedrock/us.anthropic.claude-sonnet-4").rpm(5u32);
        let fallback = ModelDeployment::new("fallback", "anthropic.claude-3-5-sonnet");
        let fixture = vec![(DeploymentRole::Primary, &primary), (DeploymentRole::Fallback, &fallback)];

        let actual = router_settings_table(Some("simple-shuffle"), &fixture);
        let lines: Vec<_> = actual.lines().collect();

        assert_eq!(lines[2], "Routing Strategy:      simple-shuffle");
        assert_eq!(
            lines[5],
            "| Model                                         | Max Requests Per Min (RPM)  | Type      |"
        );
        assert_eq!(
            lines[7],
            "| us.anthropic.claude-sonnet-4                  | 5                           | Primary   |"
        );
        assert_eq!(
            lines[8],
            "| anthropic.claude-3-5-sonnet                   | N/A                         | Fallback  |"
        );
    }

    #[test]
    fn test_missing_strategy_renders_na() {
        let actual = router_settings_table(None, &[]);
        assert!(actual.contains("Routing Strategy:      N/A\n"));
    }
}
