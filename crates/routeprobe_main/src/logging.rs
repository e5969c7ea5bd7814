use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the diagnostics filter directives.
pub const LOG_ENV: &str = "ROUTEPROBE_LOG";

/// Installs the global subscriber writing diagnostics to stderr.
///
/// The returned guard flushes buffered events on drop and must be held for
/// the lifetime of the program.
pub fn init_logging(verbose: bool) -> WorkerGuard {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(true)
        .init();

    guard
}
