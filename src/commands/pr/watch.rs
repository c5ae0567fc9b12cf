//! Polling loop for `pr checks --watch`.

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::error::Result;
use super::models::check::ChecksSummary;

/// Configuration for polling check status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl WatchConfig {
    pub fn from_millis(interval_ms: u64, timeout_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOutcome {
    pub summary: ChecksSummary,
    pub timed_out: bool,
}

/// Re-fetch the summary until nothing is pending or the timeout passes.
///
/// `on_change` is called for the initial summary and then only when the
/// `(pass, fail, pending, total)` counts change. A failed poll keeps the
/// last known state. Timing out is not an error; the last summary is
/// returned with `timed_out` set.
pub async fn watch_until_settled<F, Fut>(
    initial: ChecksSummary,
    config: WatchConfig,
    mut fetch: F,
    mut on_change: impl FnMut(&ChecksSummary) -> Result<()>,
) -> Result<WatchOutcome>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<ChecksSummary>>,
{
    let started_at = Instant::now();
    let mut current = initial;
    let mut last_progress = current.progress();
    on_change(&current)?;

    while current.pending > 0 {
        let elapsed = started_at.elapsed();
        if elapsed >= config.timeout {
            return Ok(WatchOutcome {
                summary: current,
                timed_out: true,
            });
        }

        tokio::time::sleep(config.interval.min(config.timeout - elapsed)).await;

        match fetch().await {
            Ok(next) => current = next,
            Err(e) => {
                warn!(error = %e, "failed to refresh check status, keeping last state");
                continue;
            }
        }

        let progress = current.progress();
        if progress != last_progress {
            debug!(?progress, "check status changed");
            on_change(&current)?;
            last_progress = progress;
        }
    }

    Ok(WatchOutcome {
        summary: current,
        timed_out: false,
    })
}
