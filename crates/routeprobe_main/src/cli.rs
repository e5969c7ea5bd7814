use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use routeprobe_config::DEFAULT_CONFIG_PATH;
use routeprobe_domain::Strategy;

#[derive(Parser, Debug)]
#[command(
    name = "routeprobe",
    version = env!("CARGO_PKG_VERSION"),
    about = "Probes LiteLLM and Amazon Bedrock routing features and reports what was observed"
)]
pub struct Cli {
    /// Path to the LiteLLM-style configuration file.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Enable debug diagnostics on stderr.
    #[arg(long, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Cross-region inference distribution, verified against invocation logs.
    Cris {
        /// Number of parallel requests.
        #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u16).range(1..=100))]
        requests: u16,
    },

    /// Cross-account sharding over the primary and secondary profiles.
    Sharding {
        /// Number of parallel requests.
        #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u16).range(1..=100))]
        requests: u16,

        /// How requests are spread across the two accounts.
        #[arg(long, default_value = "round-robin", value_parser = parse_strategy)]
        strategy: Strategy,
    },

    /// Fallback to secondary deployments when the primary is rate limited.
    Fallback,

    /// Load balancing across the deployments of one model group.
    LoadBalance(LoopArgs),

    /// Per-consumer quota isolation with a noisy neighbour.
    Quota(LoopArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct LoopArgs {
    /// Repeat the demo until interrupted.
    #[arg(long = "loop", default_value_t = false)]
    pub repeat: bool,

    /// Seconds between runs in loop mode.
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(5..))]
    pub interval: u64,
}

fn parse_strategy(value: &str) -> Result<Strategy, String> {
    Strategy::from_str(value)
        .map_err(|_| format!("unknown strategy '{value}' (expected round-robin, split or random)"))
}
