use routeprobe_domain::{
    ConsoleWriter, LogQuery, ProbeFailure, ProbeReply, ProbeRequest, QueryStatus, RouteDistribution,
};

/// Sends a single probe call to the endpoint named by the request.
///
/// Failures are returned already classified; implementations never retry.
#[async_trait::async_trait]
pub trait InferenceInfra: Send + Sync {
    async fn invoke(&self, request: &ProbeRequest) -> Result<ProbeReply, ProbeFailure>;
}

/// Resolves which AWS account a credential profile belongs to.
#[async_trait::async_trait]
pub trait IdentityInfra: Send + Sync {
    async fn account_id(&self, profile: &str) -> anyhow::Result<String>;
}

/// Log analytics queries over the invocation logs of one account.
#[async_trait::async_trait]
pub trait LogInsightsInfra: Send + Sync {
    /// Cheap call proving the profile may read log groups.
    async fn verify_access(&self, profile: &str) -> anyhow::Result<()>;
    /// Submits a query and returns its id.
    async fn start_query(&self, profile: &str, query: &LogQuery) -> anyhow::Result<String>;
    /// Status of a query submitted against `log_group`.
    async fn query_status(
        &self,
        profile: &str,
        log_group: &str,
        query_id: &str,
    ) -> anyhow::Result<QueryStatus>;
    async fn query_results(
        &self,
        profile: &str,
        query_id: &str,
    ) -> anyhow::Result<RouteDistribution>;
}

/// Everything the scenarios need from the outside world.
pub trait Infra: InferenceInfra + IdentityInfra + LogInsightsInfra + ConsoleWriter + 'static {}

impl<T: InferenceInfra + IdentityInfra + LogInsightsInfra + ConsoleWriter + 'static> Infra for T {}
