use std::time::Duration;

use reqwest::StatusCode;
use routeprobe_domain::{ErrorKind, ProbeFailure, ProbeReply};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::bedrock::Message;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// OpenAI-compatible chat completion client for the routing proxy.
#[derive(Debug, Clone)]
pub(crate) struct ProxyClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ProxyClient {
    pub fn new(base_url: Url) -> Self {
        Self { http: reqwest::Client::new(), base_url }
    }

    fn completions_url(&self) -> Result<Url, ProbeFailure> {
        self.base_url
            .join("chat/completions")
            .map_err(|error| ProbeFailure::new(ErrorKind::Other, error))
    }

    /// Sends one chat completion and reports the deployment that served it.
    pub async fn complete(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
        timeout: Duration,
    ) -> Result<ProbeReply, ProbeFailure> {
        let body = ChatRequest { model, messages: [Message { role: "user", content: prompt }] };
        let response = self
            .http
            .post(self.completions_url()?)
            .bearer_auth(api_key)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|error| transport_failure(error, timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|error| transport_failure(error, timeout))?;
        debug!(%status, model, "Proxy replied");

        if !status.is_success() {
            return Err(status_failure(status, &text));
        }

        let route = serde_json::from_str::<ChatResponse>(&text)
            .ok()
            .and_then(|response| response.model)
            .unwrap_or_else(|| "unknown".to_string());
        Ok(ProbeReply::new(route))
    }
}

fn transport_failure(error: reqwest::Error, timeout: Duration) -> ProbeFailure {
    if error.is_timeout() {
        ProbeFailure::new(
            ErrorKind::Other,
            format!("Request timed out after {}s", timeout.as_secs()),
        )
    } else {
        ProbeFailure::classified(error)
    }
}

/// Status code first, message text only when the status is not telling.
fn status_failure(status: StatusCode, body: &str) -> ProbeFailure {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    let message = format!("Error code: {} - {detail}", status.as_u16());

    match ErrorKind::from_status(status.as_u16()) {
        Some(kind) => ProbeFailure::new(kind, message),
        None => ProbeFailure::classified(message),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::mock_server::MockServer;

    fn client(fixture: &MockServer) -> ProxyClient {
        ProxyClient::new(Url::parse(&fixture.url()).unwrap())
    }

    #[tokio::test]
    async fn test_route_comes_from_response_model() {
        let mut fixture = MockServer::new().await;
        let mock = fixture
            .mock_completion(200, r#"{"model":"anthropic.claude-3-5-sonnet-20240620-v1:0"}"#)
            .await;

        let actual = client(&fixture)
            .complete("demo-key", "claude-sonnet-fallback-demo", "Hi", Duration::from_secs(5))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(actual, ProbeReply::new("anthropic.claude-3-5-sonnet-20240620-v1:0"));
    }

    #[tokio::test]
    async fn test_missing_model_is_unknown() {
        let mut fixture = MockServer::new().await;
        fixture.mock_completion(200, r#"{"choices":[]}"#).await;

        let actual = client(&fixture)
            .complete("demo-key", "m", "Hi", Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(actual.route, "unknown");
    }

    #[tokio::test]
    async fn test_rate_limit_status_is_throttled() {
        let mut fixture = MockServer::new().await;
        fixture
            .mock_completion(429, r#"{"error":{"message":"Rate limit exceeded for consumer-a-model"}}"#)
            .await;

        let actual = client(&fixture)
            .complete("consumer-a-key", "consumer-a-model", "Hi #A!", Duration::from_secs(5))
            .await
            .unwrap_err();

        assert_eq!(actual.kind, ErrorKind::Throttled);
        assert_eq!(actual.message, "Error code: 429 - Rate limit exceeded for consumer-a-model");
    }

    #[tokio::test]
    async fn test_unmapped_status_falls_back_to_message() {
        let mut fixture = MockServer::new().await;
        fixture
            .mock_completion(500, r#"{"error":{"message":"litellm.RateLimitError: bedrock throttled"}}"#)
            .await;

        let actual = client(&fixture)
            .complete("demo-key", "m", "Hi", Duration::from_secs(5))
            .await
            .unwrap_err();

        assert_eq!(actual.kind, ErrorKind::Throttled);
    }

    #[test]
    fn test_status_failure_plain_body() {
        let actual = status_failure(StatusCode::UNAUTHORIZED, "  invalid key \n");
        assert_eq!(actual.kind, ErrorKind::AccessDenied);
        assert_eq!(actual.message, "Error code: 401 - invalid key");
    }
}
