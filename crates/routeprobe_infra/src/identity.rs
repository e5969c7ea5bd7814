use anyhow::Context as _;

use crate::aws::AwsSessions;

/// Account id behind a credential profile, via `GetCallerIdentity`.
pub(crate) async fn caller_account(sessions: &AwsSessions, profile: &str) -> anyhow::Result<String> {
    let client = aws_sdk_sts::Client::new(&sessions.config(profile).await);
    let identity = client
        .get_caller_identity()
        .send()
        .await
        .map_err(|error| anyhow::anyhow!(aws_sdk_sts::error::DisplayErrorContext(error).to_string()))
        .with_context(|| format!("Failed to get caller identity for profile '{profile}'"))?;

    identity
        .account()
        .map(str::to_string)
        .with_context(|| format!("No account id returned for profile '{profile}'"))
}
