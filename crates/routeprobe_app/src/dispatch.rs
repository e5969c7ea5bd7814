use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::StreamExt;
use futures::stream;
use routeprobe_display::{
    ProgressLine, account_line, consumer_line, launch_line, regional_line, routed_line,
};
use routeprobe_domain::{
    ErrorKind, ProbeFailure, ProbeReply, ProbeRequest, ProbeResult, RouteClassifier,
};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::{ConsoleExt, Infra};

/// Upper bound on in-flight probe calls regardless of batch size.
pub const MAX_CONCURRENCY: usize = 20;

/// Append-only collection of probe results shared by concurrent tasks.
#[derive(Debug, Default)]
pub struct ResultSink {
    results: Mutex<Vec<ProbeResult>>,
}

impl ResultSink {
    pub fn push(&self, result: ProbeResult) {
        self.results
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(result);
    }

    /// Consumes the sink once every producer is done, in arrival order.
    pub fn finish(self) -> Vec<ProbeResult> {
        self.results.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

/// How completed probes are reported on the console.
#[derive(Debug, Clone)]
pub enum ProgressStyle {
    Regional,
    Account,
    Routed { classifier: RouteClassifier, width: usize, announce: bool },
    Consumer,
}

impl ProgressStyle {
    fn launched(&self, request: &ProbeRequest) -> Option<ProgressLine> {
        match self {
            ProgressStyle::Routed { announce: true, .. } => Some(launch_line(request)),
            _ => None,
        }
    }

    fn completed(
        &self,
        request: &ProbeRequest,
        latency: Duration,
        outcome: &Result<ProbeReply, ProbeFailure>,
    ) -> ProgressLine {
        match self {
            ProgressStyle::Regional => regional_line(request, latency, outcome),
            ProgressStyle::Account => account_line(request, latency, outcome),
            ProgressStyle::Routed { classifier, width, .. } => {
                routed_line(request, latency, outcome, classifier, *width)
            }
            ProgressStyle::Consumer => consumer_line(request, latency, outcome),
        }
    }
}

/// Issues a batch of probe calls with bounded concurrency.
pub struct Dispatcher<I> {
    infra: Arc<I>,
}

impl<I: Infra> Dispatcher<I> {
    pub fn new(infra: Arc<I>) -> Self {
        Self { infra }
    }

    /// Sends every request and resolves once all of them have settled.
    ///
    /// The returned vector holds exactly one result per request.
    pub async fn dispatch(
        &self,
        requests: Vec<ProbeRequest>,
        style: &ProgressStyle,
    ) -> Vec<ProbeResult> {
        let limit = requests.len().clamp(1, MAX_CONCURRENCY);
        info!(requests = requests.len(), limit, "Dispatching probe batch");

        let sink = ResultSink::default();
        stream::iter(requests)
            .for_each_concurrent(limit, |request| {
                let sink = &sink;
                async move {
                    if !request.launch_delay.is_zero() {
                        tokio::time::sleep(request.launch_delay).await;
                    }
                    if let Some(line) = style.launched(&request) {
                        self.infra.progress(line);
                    }

                    let started = Instant::now();
                    let outcome = self.invoke(&request).await;
                    let latency = started.elapsed();

                    debug!(
                        sequence = request.sequence,
                        partition = %request.partition,
                        ?latency,
                        ok = outcome.is_ok(),
                        "Probe settled"
                    );
                    self.infra.progress(style.completed(&request, latency, &outcome));
                    sink.push(ProbeResult::from_outcome(&request, latency, &outcome));
                }
            })
            .await;

        sink.finish()
    }

    async fn invoke(&self, request: &ProbeRequest) -> Result<ProbeReply, ProbeFailure> {
        match tokio::time::timeout(request.timeout, self.infra.invoke(request)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ProbeFailure::new(
                ErrorKind::Other,
                format!("Request timed out after {}s", request.timeout.as_secs()),
            )),
        }
    }
}

/// Cycles through `prompts` so request `index` gets `prompts[index % len]`.
pub fn prompt_for(prompts: &[&str], index: usize) -> String {
    if prompts.is_empty() {
        return String::new();
    }
    prompts[index % prompts.len()].to_string()
}
