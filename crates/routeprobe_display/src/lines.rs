use std::time::Duration;

use routeprobe_domain::{ProbeFailure, ProbeReply, ProbeRequest, RouteClassifier, RouteRole};

use crate::{ProgressLine, Tone};

type Outcome = Result<ProbeReply, ProbeFailure>;

fn truncated(message: &str) -> String {
    let head: String = message.chars().take(50).collect();
    format!("{head}...")
}

/// Line announcing a probe before it is sent.
pub fn launch_line(request: &ProbeRequest) -> ProgressLine {
    ProgressLine::new(
        Tone::Highlight,
        format!("Request #{:2}: Asking '{}'...", request.sequence, request.prompt),
    )
}

/// Completion line of a direct call to a cross-region inference profile.
pub fn regional_line(request: &ProbeRequest, latency: Duration, outcome: &Outcome) -> ProgressLine {
    let id = request.sequence;
    match outcome {
        Ok(_) => ProgressLine::success(format!(
            "Request #{id:2} | SUCCESS | {:.2}s",
            latency.as_secs_f64()
        )),
        Err(failure) if failure.kind.is_throttled() => {
            ProgressLine::warning(format!("Request #{id:2} | THROTTLED"))
        }
        Err(failure) => ProgressLine::error(format!("Request #{id:2} | ERROR | {}", failure.kind)),
    }
}

/// Completion line of a call sent through one of several accounts.
pub fn account_line(request: &ProbeRequest, latency: Duration, outcome: &Outcome) -> ProgressLine {
    let id = request.sequence;
    let account = request.partition.as_str();
    match outcome {
        Ok(_) => ProgressLine::success(format!(
            "Request #{id:2} | {account:8} | SUCCESS | {:.2}s",
            latency.as_secs_f64()
        )),
        Err(failure) if failure.kind.is_throttled() => {
            ProgressLine::warning(format!("Request #{id:2} | {account:8} | THROTTLED"))
        }
        Err(failure) => ProgressLine::error(format!(
            "Request #{id:2} | {account:8} | ERROR | {}",
            truncated(&failure.message)
        )),
    }
}

/// Completion line of a proxy call showing which deployment served it.
pub fn routed_line(
    request: &ProbeRequest,
    latency: Duration,
    outcome: &Outcome,
    classifier: &RouteClassifier,
    width: usize,
) -> ProgressLine {
    let id = request.sequence;
    match outcome {
        Ok(reply) => {
            let (label, tone) = match classifier.classify(&reply.route) {
                RouteRole::Fallback => ("FALLBACK!", Tone::Warning),
                RouteRole::Primary => ("PRIMARY: ", Tone::Success),
            };
            ProgressLine::new(
                tone,
                format!(
                    "Request #{id:2} → {label} Model: {:<width$} | Time: {:5.2}s",
                    reply.route,
                    latency.as_secs_f64()
                ),
            )
        }
        Err(failure) if failure.kind.is_throttled() => {
            ProgressLine::error(format!("Request #{id:2} → RATE LIMIT: {}", failure.message))
        }
        Err(failure) => {
            ProgressLine::error(format!("Request #{id:2} → ERROR: {}", failure.message))
        }
    }
}

/// Completion line of a call issued on behalf of one consumer.
pub fn consumer_line(request: &ProbeRequest, latency: Duration, outcome: &Outcome) -> ProgressLine {
    let id = request.sequence;
    let consumer = request.partition.as_str();
    match outcome {
        Ok(_) => ProgressLine::success(format!(
            "{consumer} | SUCCESS      | Req #{id:2} | {:.2}s",
            latency.as_secs_f64()
        )),
        Err(failure) if failure.kind.is_throttled() => {
            ProgressLine::error(format!("{consumer} | RATE LIMITED | Req #{id:2}"))
        }
        Err(failure) => ProgressLine::error(format!(
            "{consumer} | ERROR        | Req #{id:2} → {}",
            truncated(&failure.message)
        )),
    }
}
