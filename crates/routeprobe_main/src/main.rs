use clap::Parser;
use routeprobe_display::ProgressLine;
use routeprobe_main::{Cli, init_logging, run};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let guard = init_logging(cli.verbose);

    if let Err(error) = run(cli).await {
        eprintln!("{}", ProgressLine::error(format!("{error:#}")));
        drop(guard);
        std::process::exit(1);
    }
}
