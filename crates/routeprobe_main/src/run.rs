use std::sync::Arc;
use std::time::Duration;

use routeprobe_app::{
    ConsoleExt, CrisDemo, FallbackDemo, LoadBalanceDemo, LoopRunner, QuotaDemo, ShardingDemo,
};
use routeprobe_config::Config;
use routeprobe_display::ProgressLine;
use routeprobe_infra::RouteProbeInfra;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{Cli, Command, LoopArgs};

/// Loads the configuration and runs the selected scenario to completion.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Arc::new(Config::load(&cli.config));
    let infra = Arc::new(RouteProbeInfra::new(&config)?);
    info!(command = ?cli.command, "Starting scenario");

    match cli.command {
        Command::Cris { requests } => {
            CrisDemo::new(infra, config).run(requests.into()).await?;
        }
        Command::Sharding { requests, strategy } => {
            ShardingDemo::new(infra, config)
                .run(requests.into(), strategy)
                .await?;
        }
        Command::Fallback => {
            FallbackDemo::new(infra, config).run().await?;
        }
        Command::LoadBalance(LoopArgs { repeat, interval }) => {
            let demo = LoadBalanceDemo::new(infra.clone(), config);
            if repeat {
                demo.run_loop(&loop_runner(&infra, interval)).await?;
            } else {
                demo.run(None).await?;
            }
        }
        Command::Quota(LoopArgs { repeat, interval }) => {
            let demo = QuotaDemo::new(infra.clone(), config);
            if repeat {
                demo.run_loop(&loop_runner(&infra, interval)).await?;
            } else {
                demo.run(None).await?;
            }
        }
    }
    Ok(())
}

/// Runner whose token is cancelled by the first interrupt signal.
fn loop_runner(infra: &Arc<RouteProbeInfra>, interval: u64) -> LoopRunner {
    let token = CancellationToken::new();
    let signalled = token.clone();
    let console = infra.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            console.progress(ProgressLine::warning("Shutdown requested. Finishing current run..."));
            signalled.cancel();
        }
    });

    LoopRunner::new(Duration::from_secs(interval), token)
}
