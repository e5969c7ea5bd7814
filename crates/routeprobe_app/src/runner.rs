use std::time::Duration;

use routeprobe_display::ProgressLine;
use routeprobe_domain::ConsoleWriter;
use tokio_util::sync::CancellationToken;

use crate::ConsoleExt;

/// Paces the iterations of a looping scenario.
///
/// Cancellation is cooperative: a run in progress always finishes, and the
/// wait between runs notices the token within one tick.
#[derive(Debug, Clone)]
pub struct LoopRunner {
    interval: Duration,
    tick: Duration,
    token: CancellationToken,
}

impl LoopRunner {
    pub fn new(interval: Duration, token: CancellationToken) -> Self {
        Self { interval, tick: Duration::from_secs(1), token }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Waits out the interval before the next run.
    ///
    /// Returns `false` as soon as cancellation is observed.
    pub async fn pause<W: ConsoleWriter + ?Sized>(&self, console: &W) -> bool {
        if self.is_cancelled() {
            return false;
        }

        console.progress(ProgressLine::info(format!(
            "Waiting {} seconds until next run...",
            self.interval.as_secs()
        )));

        let ticks = (self.interval.as_millis() / self.tick.as_millis().max(1)) as u64;
        for _ in 0..ticks {
            if self.is_cancelled() {
                return false;
            }
            tokio::time::sleep(self.tick).await;
        }

        console.println("");
        !self.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;
    use crate::tests::MockInfra;

    #[tokio::test(start_paused = true)]
    async fn test_pause_waits_full_interval() {
        let console = MockInfra::default();
        let fixture = LoopRunner::new(Duration::from_secs(30), CancellationToken::new());
        let started = Instant::now();

        let actual = fixture.pause(&console).await;

        assert!(actual);
        assert_eq!(started.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_stops_within_one_tick_of_cancellation() {
        let console = MockInfra::default();
        let token = CancellationToken::new();
        let fixture = LoopRunner::new(Duration::from_secs(30), token.clone());
        let started = Instant::now();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            token.cancel();
        });
        let actual = fixture.pause(&console).await;

        assert!(!actual);
        assert!(started.elapsed() <= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_pause_after_cancellation_returns_immediately() {
        let console = MockInfra::default();
        let token = CancellationToken::new();
        token.cancel();
        let fixture = LoopRunner::new(Duration::from_secs(30), token);

        assert!(!fixture.pause(&console).await);
        assert!(console.console_lines().is_empty());
    }
}
