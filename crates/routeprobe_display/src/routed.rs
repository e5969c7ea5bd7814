use std::collections::BTreeMap;
use std::fmt::Write;

use routeprobe_domain::{
    BatchSummary, ProbeResult, RouteClassifier, RouteRole, RunTotals, percentage, route_usage,
};

use crate::table::{REPORT_WIDTH, SECTION_WIDTH, banner, rule, share_or_na, thin_rule};

/// Successful calls that were served by a fallback route.
pub fn fallback_events<'a>(
    results: &'a [ProbeResult],
    classifier: &RouteClassifier,
) -> Vec<&'a ProbeResult> {
    let mut events: Vec<_> = results
        .iter()
        .filter(|result| {
            result
                .route
                .as_deref()
                .is_some_and(|route| classifier.classify(route) == RouteRole::Fallback)
        })
        .collect();
    events.sort_by_key(|result| result.sequence);
    events
}

/// Counts and per-model usage of a fallback run.
pub fn fallback_summary(results: &[ProbeResult], classifier: &RouteClassifier) -> String {
    let summary = BatchSummary::from_results(results);
    let fallbacks = fallback_events(results, classifier).len() as u64;

    let mut out = banner("FALLBACK DEMONSTRATION RESULTS");
    let _ = writeln!(out, "Total Requests:        {}", summary.total);
    let _ = writeln!(out, "Successful:            {}", summary.successful);
    let _ = writeln!(out, "Failed:                {}", summary.failed);
    let _ = writeln!(out, "Primary Model Used:    {}", summary.successful - fallbacks);
    let _ = writeln!(out, "Fallback Triggered:    {fallbacks}");
    out.push('\n');

    let usage = route_usage(results);
    if !usage.is_empty() {
        out.push_str("Model Usage Distribution:\n");
        let width = usage.keys().map(|model| model.len()).max().unwrap_or(0);
        for (model, count) in &usage {
            let role = match classifier.classify(model) {
                RouteRole::Fallback => "FALLBACK",
                RouteRole::Primary => "PRIMARY ",
            };
            let _ = writeln!(
                out,
                "  {role} {model:<width$} : {count:2} requests ({:5.1}%)",
                percentage(*count, summary.successful)
            );
        }
    }
    out
}

/// One line per call that failed over, in sequence order.
pub fn fallback_events_detail(results: &[ProbeResult], classifier: &RouteClassifier) -> String {
    let events = fallback_events(results, classifier);
    let id_width = events.iter().map(|e| e.sequence.to_string().len()).max().unwrap_or(0);
    let model_width = events
        .iter()
        .filter_map(|e| e.route.as_deref().map(str::len))
        .max()
        .unwrap_or(0);

    let mut out = String::from("Fallback Events Detail:\n");
    for event in events {
        let _ = writeln!(
            out,
            "  Request #{:>id_width$} → {:<model_width$} (Response: {:5.2}s)",
            event.sequence,
            event.route.as_deref().unwrap_or_default(),
            event.latency.as_secs_f64()
        );
    }
    out
}

fn distribution_lines(out: &mut String, usage: &BTreeMap<String, u64>, total: u64, count_width: usize) {
    for (model, count) in usage {
        let _ = writeln!(
            out,
            "  {model:50} : {count:count_width$} requests ({:5.1}%)",
            percentage(*count, total)
        );
    }
}

/// Counts and per-model distribution of a load balancing run.
pub fn load_balance_summary(results: &[ProbeResult]) -> String {
    let summary = BatchSummary::from_results(results);

    let mut out = banner("LOAD BALANCING RESULTS");
    let _ = writeln!(out, "Total Requests:     {}", summary.total);
    let _ = writeln!(out, "Successful:         {}", summary.successful);
    let _ = writeln!(out, "Failed:             {}", summary.failed);
    out.push('\n');

    let usage = route_usage(results);
    if !usage.is_empty() {
        out.push_str("Model Distribution:\n");
        distribution_lines(&mut out, &usage, summary.successful, 2);
        out.push('\n');
    }
    out
}

pub fn average_response_time(summary: &BatchSummary) -> String {
    format!("Average Response Time: {:.2}s\n", summary.mean_latency.as_secs_f64())
}

/// Running totals printed after every load balancing loop iteration.
pub fn load_balance_cumulative(totals: &RunTotals) -> String {
    let mut out = String::from("\nCUMULATIVE STATISTICS\n");
    let _ = writeln!(out, "{}", thin_rule(SECTION_WIDTH));
    let _ = writeln!(out, "Total Runs:           {}", totals.runs);
    let _ = writeln!(out, "Total Successful:     {}", totals.overall.successful);
    let _ = writeln!(out, "Total Failed:         {}", totals.overall.failed);

    if !totals.routes.is_empty() {
        out.push_str("\nCumulative Model Distribution:\n");
        distribution_lines(&mut out, &totals.routes, totals.overall.successful, 3);
    }
    let _ = writeln!(out, "{}", thin_rule(SECTION_WIDTH));
    out
}

/// Closing statistics of a stopped load balancing loop.
pub fn load_balance_final(totals: &RunTotals) -> String {
    let mut out = String::from("FINAL STATISTICS\n");
    let _ = writeln!(out, "{}", rule(REPORT_WIDTH));
    let _ = writeln!(out, "Total Runs Completed: {}", totals.runs);
    let _ = writeln!(out, "Total Requests:       {}", totals.overall.total());
    let _ = writeln!(
        out,
        "Success Rate:         {}",
        share_or_na(totals.overall.successful, totals.overall.total())
    );
    let _ = writeln!(out, "{}", rule(REPORT_WIDTH));
    out
}
