use anyhow::Context as _;
use aws_sdk_cloudwatchlogs::Client;
use aws_sdk_cloudwatchlogs::error::DisplayErrorContext;
use aws_sdk_cloudwatchlogs::types::{QueryInfo, QueryStatus as SdkQueryStatus, ResultField};
use routeprobe_domain::{LogQuery, QueryStatus, RouteDistribution};
use tracing::debug;

use crate::aws::AwsSessions;

const REGION_FIELD: &str = "inferenceRegion";
const COUNT_FIELD: &str = "invocationCount";
const QUERY_PAGE_SIZE: i32 = 1000;

fn sdk_error(error: impl std::error::Error + 'static) -> anyhow::Error {
    anyhow::anyhow!(DisplayErrorContext(error).to_string())
}

async fn client(sessions: &AwsSessions, profile: &str) -> Client {
    Client::new(&sessions.config(profile).await)
}

pub(crate) async fn verify_access(sessions: &AwsSessions, profile: &str) -> anyhow::Result<()> {
    client(sessions, profile)
        .await
        .describe_log_groups()
        .limit(1)
        .send()
        .await
        .map_err(sdk_error)
        .with_context(|| format!("Cannot list log groups with profile '{profile}'"))?;
    Ok(())
}

pub(crate) async fn start_query(
    sessions: &AwsSessions,
    profile: &str,
    query: &LogQuery,
) -> anyhow::Result<String> {
    let output = client(sessions, profile)
        .await
        .start_query()
        .log_group_name(&query.log_group)
        .start_time(query.start_seconds())
        .end_time(query.end_seconds())
        .query_string(query.query_string())
        .send()
        .await
        .map_err(sdk_error)?;

    let query_id = output.query_id().context("Log query started without an id")?;
    debug!(profile, query_id, "Started log query");
    Ok(query_id.to_string())
}

pub(crate) async fn query_status(
    sessions: &AwsSessions,
    profile: &str,
    log_group: &str,
    query_id: &str,
) -> anyhow::Result<QueryStatus> {
    // Scoped to the log group so concurrent queries elsewhere in the account
    // cannot push this one off the first page.
    let output = client(sessions, profile)
        .await
        .describe_queries()
        .log_group_name(log_group)
        .max_results(QUERY_PAGE_SIZE)
        .send()
        .await
        .map_err(sdk_error)?;

    Ok(status_of(output.queries(), query_id))
}

/// Status of `query_id` among listed queries; an absent id is `NotFound`.
fn status_of(queries: &[QueryInfo], query_id: &str) -> QueryStatus {
    queries
        .iter()
        .find(|info| info.query_id() == Some(query_id))
        .map(|info| info.status().map(into_status).unwrap_or(QueryStatus::Running))
        .unwrap_or(QueryStatus::NotFound)
}

pub(crate) async fn query_results(
    sessions: &AwsSessions,
    profile: &str,
    query_id: &str,
) -> anyhow::Result<RouteDistribution> {
    let output = client(sessions, profile)
        .await
        .get_query_results()
        .query_id(query_id)
        .send()
        .await
        .map_err(sdk_error)?;

    Ok(distribution(output.results()))
}

fn into_status(status: &SdkQueryStatus) -> QueryStatus {
    match status {
        SdkQueryStatus::Complete => QueryStatus::Complete,
        SdkQueryStatus::Failed | SdkQueryStatus::Timeout => QueryStatus::Failed,
        SdkQueryStatus::Cancelled => QueryStatus::Cancelled,
        _ => QueryStatus::Running,
    }
}

/// Folds result rows into counts per region.
///
/// Rows are read by field name, falling back to column position when the
/// names are missing. Rows with an unparsable count are skipped.
fn distribution(rows: &[Vec<ResultField>]) -> RouteDistribution {
    rows.iter()
        .filter_map(|row| {
            let named = |name: &str| {
                row.iter()
                    .find(|field| field.field() == Some(name))
                    .and_then(ResultField::value)
            };
            let positional = |index: usize| row.get(index).and_then(ResultField::value);

            let region = named(REGION_FIELD).or_else(|| positional(0))?;
            let count = named(COUNT_FIELD).or_else(|| positional(1))?;
            let count = count.trim().parse::<u64>().ok()?;
            Some((region.to_string(), count))
        })
        .fold(RouteDistribution::default(), |acc, (region, count)| acc.record(region, count))
}
