use std::time::Duration;

use derive_setters::Setters;

use crate::{ErrorKind, PartitionLabel};

/// Where a probe call is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Direct Bedrock `InvokeModel` using the credentials of an AWS profile.
    Bedrock { profile: String, model_id: String },
    /// OpenAI-compatible chat completion through the routing proxy.
    Proxy { api_key: String, model: String },
}

/// A single probe call, tagged with its sequence id and partition.
#[derive(Debug, Clone, PartialEq, Setters)]
#[setters(into)]
pub struct ProbeRequest {
    /// 1-based id shown in progress lines.
    pub sequence: usize,
    pub partition: PartitionLabel,
    pub prompt: String,
    pub endpoint: Endpoint,
    pub timeout: Duration,
    /// Delay applied before the call is issued, used to stagger launches.
    pub launch_delay: Duration,
}

impl ProbeRequest {
    pub fn new(
        sequence: usize,
        partition: PartitionLabel,
        prompt: impl ToString,
        endpoint: Endpoint,
    ) -> Self {
        Self {
            sequence,
            partition,
            prompt: prompt.to_string(),
            endpoint,
            timeout: Duration::from_secs(30),
            launch_delay: Duration::ZERO,
        }
    }
}

/// Successful reply of an external endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReply {
    /// Model or deployment that actually served the call.
    pub route: String,
}

impl ProbeReply {
    pub fn new(route: impl ToString) -> Self {
        Self { route: route.to_string() }
    }
}

/// Classified failure of a probe call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ProbeFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl ProbeFailure {
    pub fn new(kind: ErrorKind, message: impl ToString) -> Self {
        Self { kind, message: message.to_string() }
    }

    /// Builds a failure whose kind is derived from the message text.
    pub fn classified(message: impl ToString) -> Self {
        let message = message.to_string();
        Self { kind: ErrorKind::classify(&message), message }
    }
}

/// Immutable outcome of one probe call.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub sequence: usize,
    pub partition: PartitionLabel,
    pub success: bool,
    pub latency: Duration,
    pub route: Option<String>,
    pub error: Option<ErrorKind>,
}

impl ProbeResult {
    pub fn success(
        sequence: usize,
        partition: PartitionLabel,
        latency: Duration,
        route: impl ToString,
    ) -> Self {
        Self {
            sequence,
            partition,
            success: true,
            latency,
            route: Some(route.to_string()),
            error: None,
        }
    }

    pub fn failure(
        sequence: usize,
        partition: PartitionLabel,
        latency: Duration,
        kind: ErrorKind,
    ) -> Self {
        Self {
            sequence,
            partition,
            success: false,
            latency,
            route: None,
            error: Some(kind),
        }
    }

    pub fn from_outcome(
        request: &ProbeRequest,
        latency: Duration,
        outcome: &Result<ProbeReply, ProbeFailure>,
    ) -> Self {
        match outcome {
            Ok(reply) => {
                Self::success(request.sequence, request.partition.clone(), latency, &reply.route)
            }
            Err(failure) => {
                Self::failure(request.sequence, request.partition.clone(), latency, failure.kind)
            }
        }
    }

    pub fn is_throttled(&self) -> bool {
        self.error.is_some_and(|kind| kind.is_throttled())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_from_outcome_success() {
        let request = ProbeRequest::new(
            3,
            "A".into(),
            "Hi",
            Endpoint::Proxy { api_key: "k".into(), model: "m".into() },
        );
        let outcome = Ok(ProbeReply::new("r1"));

        let actual = ProbeResult::from_outcome(&request, Duration::from_secs(1), &outcome);
        let expected = ProbeResult::success(3, "A".into(), Duration::from_secs(1), "r1");
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_from_outcome_failure_keeps_kind() {
        let request = ProbeRequest::new(
            4,
            "B".into(),
            "Hi",
            Endpoint::Proxy { api_key: "k".into(), model: "m".into() },
        );
        let outcome = Err(ProbeFailure::classified("ThrottlingException: slow down"));

        let actual = ProbeResult::from_outcome(&request, Duration::ZERO, &outcome);
        assert!(!actual.success);
        assert!(actual.is_throttled());
        assert_eq!(actual.route, None);
    }
}
