//! Bounded retry for single units of work
//!
//! Wraps exactly one fallible operation at a time; it never recurses into a
//! node's children. On exhaustion the last observed error is returned
//! unchanged so callers can match on the original failure.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Runs `op` up to `max_attempts` times with a fixed `backoff` between
/// failing attempts.
///
/// After any failing attempt except the last, sleeps `backoff` before
/// retrying. Each failure is logged with the attempt number; success stops
/// immediately.
pub async fn run_with_retry<T, E, Fut>(
    what: &str,
    max_attempts: u32,
    backoff: Duration,
    mut op: impl FnMut() -> Fut,
) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                tracing::warn!(
                    "Attempt {}/{} failed for {}: {}",
                    attempt,
                    max_attempts,
                    what,
                    error
                );

                if attempt >= max_attempts {
                    return Err(error);
                }
                attempt += 1;
                tokio::time::sleep(backoff).await;
            }
        }
    }
}
