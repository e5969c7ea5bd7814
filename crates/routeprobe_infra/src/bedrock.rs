use std::time::Duration;

use aws_sdk_bedrockruntime::Client;
use aws_sdk_bedrockruntime::config::timeout::TimeoutConfig;
use aws_sdk_bedrockruntime::error::{DisplayErrorContext, SdkError};
use aws_sdk_bedrockruntime::operation::invoke_model::InvokeModelError;
use aws_sdk_bedrockruntime::primitives::Blob;
use routeprobe_domain::{ErrorKind, ProbeFailure, ProbeReply};
use serde::Serialize;

use crate::aws::AwsSessions;

const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
const MAX_TOKENS: u32 = 100;

#[derive(Debug, Serialize)]
struct InvokeBody<'a> {
    anthropic_version: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
pub(crate) struct Message<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

fn invoke_body(prompt: &str) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(&InvokeBody {
        anthropic_version: ANTHROPIC_VERSION,
        max_tokens: MAX_TOKENS,
        messages: [Message { role: "user", content: prompt }],
    })
}

/// Typed Bedrock errors that map onto a failure kind without looking at
/// the message.
fn typed_kind(error: &InvokeModelError) -> Option<ErrorKind> {
    match error {
        InvokeModelError::ThrottlingException(_)
        | InvokeModelError::ServiceQuotaExceededException(_) => Some(ErrorKind::Throttled),
        InvokeModelError::ValidationException(_) => Some(ErrorKind::Validation),
        InvokeModelError::AccessDeniedException(_) => Some(ErrorKind::AccessDenied),
        InvokeModelError::ResourceNotFoundException(_) => Some(ErrorKind::NotFound),
        _ => None,
    }
}

fn into_failure<R: std::fmt::Debug>(error: SdkError<InvokeModelError, R>) -> ProbeFailure {
    let message = DisplayErrorContext(&error).to_string();
    match &error {
        SdkError::ServiceError(service) => match typed_kind(service.err()) {
            Some(kind) => ProbeFailure::new(kind, message),
            None => ProbeFailure::classified(message),
        },
        SdkError::TimeoutError(_) => ProbeFailure::new(ErrorKind::Other, message),
        _ => ProbeFailure::classified(message),
    }
}

/// Direct `InvokeModel` call against a cross-region inference profile.
pub(crate) async fn invoke_model(
    sessions: &AwsSessions,
    profile: &str,
    model_id: &str,
    prompt: &str,
    timeout: Duration,
) -> Result<ProbeReply, ProbeFailure> {
    let body = invoke_body(prompt).map_err(|error| ProbeFailure::new(ErrorKind::Other, error))?;
    let client = Client::new(&sessions.config(profile).await);

    client
        .invoke_model()
        .model_id(model_id)
        .content_type("application/json")
        .accept("application/json")
        .body(Blob::new(body))
        .customize()
        .config_override(
            aws_sdk_bedrockruntime::config::Builder::default()
                .timeout_config(TimeoutConfig::builder().operation_timeout(timeout).build()),
        )
        .send()
        .await
        .map_err(into_failure)?;

    // The serving region is only visible in the invocation logs.
    Ok(ProbeReply::new(model_id))
}

#[cfg(test)]
mod tests {
    use aws_sdk_bedrockruntime::types::error::{
        AccessDeniedException, InternalServerException, ServiceQuotaExceededException,
        ThrottlingException, ValidationException,
    };
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_invoke_body_shape() {
        let actual: serde_json::Value = serde_json::from_slice(&invoke_body("Hello").unwrap()).unwrap();
        let expected = serde_json::json!({
            "anthropic_version": "bedrock-2023-05-31",
            "max_tokens": 100,
            "messages": [{"role": "user", "content": "Hello"}]
        });
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_typed_errors_take_precedence() {
        let fixture = [
            (
                InvokeModelError::ThrottlingException(ThrottlingException::builder().build()),
                Some(ErrorKind::Throttled),
            ),
            (
                InvokeModelError::ServiceQuotaExceededException(
                    ServiceQuotaExceededException::builder().build(),
                ),
                Some(ErrorKind::Throttled),
            ),
            (
                InvokeModelError::ValidationException(ValidationException::builder().build()),
                Some(ErrorKind::Validation),
            ),
            (
                InvokeModelError::AccessDeniedException(AccessDeniedException::builder().build()),
                Some(ErrorKind::AccessDenied),
            ),
            (
                InvokeModelError::InternalServerException(
                    InternalServerException::builder().build(),
                ),
                None,
            ),
        ];

        for (error, expected) in fixture {
            assert_eq!(typed_kind(&error), expected);
        }
    }
}
