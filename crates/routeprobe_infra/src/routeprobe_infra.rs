use std::io;

use anyhow::Context as _;
use routeprobe_app::{IdentityInfra, InferenceInfra, LogInsightsInfra};
use routeprobe_config::Config;
use routeprobe_domain::{
    ConsoleWriter, Endpoint, LogQuery, ProbeFailure, ProbeReply, ProbeRequest, QueryStatus,
    RouteDistribution,
};

use crate::aws::AwsSessions;
use crate::console::StdConsoleWriter;
use crate::proxy::ProxyClient;
use crate::{bedrock, identity, logs};

/// Production implementation of every outbound seam the scenarios use.
pub struct RouteProbeInfra {
    sessions: AwsSessions,
    proxy: ProxyClient,
    console: StdConsoleWriter,
}

impl RouteProbeInfra {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let endpoint = config
            .proxy
            .endpoint()
            .context("Invalid proxy endpoint in configuration")?;

        Ok(Self {
            sessions: AwsSessions::new(&config.aws.region),
            proxy: ProxyClient::new(endpoint),
            console: StdConsoleWriter::default(),
        })
    }
}

#[async_trait::async_trait]
impl InferenceInfra for RouteProbeInfra {
    async fn invoke(&self, request: &ProbeRequest) -> Result<ProbeReply, ProbeFailure> {
        match &request.endpoint {
            Endpoint::Bedrock { profile, model_id } => {
                bedrock::invoke_model(
                    &self.sessions,
                    profile,
                    model_id,
                    &request.prompt,
                    request.timeout,
                )
                .await
            }
            Endpoint::Proxy { api_key, model } => {
                self.proxy
                    .complete(api_key, model, &request.prompt, request.timeout)
                    .await
            }
        }
    }
}

#[async_trait::async_trait]
impl IdentityInfra for RouteProbeInfra {
    async fn account_id(&self, profile: &str) -> anyhow::Result<String> {
        identity::caller_account(&self.sessions, profile).await
    }
}

#[async_trait::async_trait]
impl LogInsightsInfra for RouteProbeInfra {
    async fn verify_access(&self, profile: &str) -> anyhow::Result<()> {
        logs::verify_access(&self.sessions, profile).await
    }

    async fn start_query(&self, profile: &str, query: &LogQuery) -> anyhow::Result<String> {
        logs::start_query(&self.sessions, profile, query).await
    }

    async fn query_status(
        &self,
        profile: &str,
        log_group: &str,
        query_id: &str,
    ) -> anyhow::Result<QueryStatus> {
        logs::query_status(&self.sessions, profile, log_group, query_id).await
    }

    async fn query_results(
        &self,
        profile: &str,
        query_id: &str,
    ) -> anyhow::Result<RouteDistribution> {
        logs::query_results(&self.sessions, profile, query_id).await
    }
}

impl ConsoleWriter for RouteProbeInfra {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.console.write(buf)
    }

    fn write_err(&self, buf: &[u8]) -> io::Result<usize> {
        self.console.write_err(buf)
    }

    fn flush(&self) -> io::Result<()> {
        self.console.flush()
    }

    fn flush_err(&self) -> io::Result<()> {
        self.console.flush_err()
    }
}
