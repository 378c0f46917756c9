//! Retrying install attempts with exponential backoff.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use ttsdk_backoff::{Backoff, BackoffConfig, NextDelay};
use ttsdk_installer::SdkError;

/// Runs `attempt` until it succeeds, fails permanently, or the policy is exhausted.
///
/// With no policy the operation runs exactly once. Only errors for which
/// [`SdkError::is_retryable`] holds are retried; the last error is returned
/// once the policy runs out of delays.
///
/// # Errors
///
/// Returns the first non-retryable error, the last retryable error after
/// exhaustion, or an error if the policy itself is invalid.
pub async fn with_retries<T, F, Fut>(policy: Option<&BackoffConfig>, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SdkError>>,
{
    let Some(config) = policy else {
        return Ok(attempt().await?);
    };
    let mut backoff = Backoff::new(config.clone())?;

    loop {
        let err = match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() => e,
            Err(e) => return Err(e.into()),
        };

        let NextDelay::Delay(delay) = backoff.next_delay() else {
            tracing::warn!(attempts = backoff.attempts(), "retries exhausted");
            return Err(err.into());
        };

        tracing::warn!(error = %err, attempt = backoff.attempts(), "retryable failure");
        println!("{err}");
        println!("Retrying in {}...", format_delay(delay));
        tokio::time::sleep(delay).await;
    }
}

fn format_delay(delay: Duration) -> String {
    format!("{:.1}s", delay.as_secs_f64())
}
