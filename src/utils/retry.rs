// Connectivity probing with Retry-After hint support
// Author: kelexine (https://github.com/kelexine)

use crate::config::SyncConfig;
use crate::models::{FetchResponse, InterceptedRequest};
use crate::platform::Network;
use backoff::{backoff::Backoff, ExponentialBackoff};
use http::header::RETRY_AFTER;
use std::time::Duration;
use tracing::debug;

/// Parse a `Retry-After` header given in delta-seconds (e.g. "40").
/// Returns the duration capped at 60 seconds. HTTP-date values are ignored.
pub fn parse_retry_after(response: &FetchResponse) -> Option<Duration> {
    let value = response.headers.get(RETRY_AFTER)?.to_str().ok()?;
    let seconds: u64 = value.trim().parse().ok()?;
    Some(Duration::from_secs(seconds.min(60)))
}

/// Create exponential backoff configuration for connectivity probes.
/// Probing never gives up on its own.
pub fn create_backoff(config: &SyncConfig) -> ExponentialBackoff {
    let initial = Duration::from_millis(config.initial_interval_ms);
    ExponentialBackoff {
        current_interval: initial,
        initial_interval: initial,
        randomization_factor: 0.3, // Add jitter
        multiplier: 2.0,
        max_interval: Duration::from_secs(config.max_interval_seconds),
        max_elapsed_time: None,
        ..Default::default()
    }
}

/// Statuses meaning the upstream answered but is not serving yet
pub fn is_retryable(status: u16) -> bool {
    matches!(status, 429 | 502 | 503 | 504)
}

/// Probe until the upstream answers with a non-retryable status.
/// - Honors `Retry-After` when the upstream sends one
/// - Falls back to exponential backoff
pub async fn wait_until_reachable(network: &dyn Network, probe: &InterceptedRequest, config: &SyncConfig) {
    let mut backoff = create_backoff(config);
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        let hinted = match network.fetch(probe).await {
            Ok(response) if !is_retryable(response.status.as_u16()) => {
                if attempt > 1 {
                    debug!("Upstream reachable again after {} probes", attempt);
                }
                return;
            }
            Ok(response) => {
                debug!("Probe {} answered {} (attempt {})", probe.url, response.status, attempt);
                parse_retry_after(&response)
            }
            Err(e) => {
                debug!("Probe {} failed (attempt {}): {}", probe.url, attempt, e);
                None
            }
        };

        let delay = hinted.unwrap_or_else(|| {
            backoff
                .next_backoff()
                .unwrap_or(Duration::from_secs(config.max_interval_seconds))
        });
        tokio::time::sleep(delay).await;
    }
}
