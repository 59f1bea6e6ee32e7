use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::error::{ProviderError, ProviderErrorKind};

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3, base_delay: Duration::from_millis(500) }
    }
}

/// Result of racing a backoff sleep against cancellation.
pub enum SleepOutcome {
    SleptFully,
    Cancelled,
}

/// Sleeps `base * 2^attempt + uniform(0, base)`, aborting immediately (in
/// favor of the current error, not a cancellation error) if `token` fires
/// first.
pub async fn backoff_sleep(policy: &RetryPolicy, attempt: u32, token: &CancellationToken) -> SleepOutcome {
    let exponential = policy.base_delay.saturating_mul(2u32.saturating_pow(attempt));
    let jitter_millis = rand::thread_rng().gen_range(0..=policy.base_delay.as_millis().max(1) as u64);
    let delay = exponential + Duration::from_millis(jitter_millis);

    tokio::select! {
        _ = tokio::time::sleep(delay) => SleepOutcome::SleptFully,
        _ = token.cancelled() => SleepOutcome::Cancelled,
    }
}

/// Runs `attempt_fn` up to `policy.max_retries + 1` total times. Retries only
/// on a retryable classified error; aborts immediately on cancellation
/// between attempts or during a backoff sleep, surfacing the last observed
/// error.
pub async fn run_with_retry<F, Fut, T>(policy: &RetryPolicy, token: &CancellationToken, mut attempt_fn: F) -> Result<T, ProviderError>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0u32;
    loop {
        if token.is_cancelled() {
            return Err(ProviderError::new(ProviderErrorKind::Unknown, "request cancelled before attempt"));
        }

        match attempt_fn(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => {
                let exhausted = attempt >= policy.max_retries;
                if !error.retryable() || exhausted {
                    return Err(error);
                }
                match backoff_sleep(policy, attempt, token).await {
                    SleepOutcome::SleptFully => {
                        attempt += 1;
                    }
                    SleepOutcome::Cancelled => return Err(error),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_on_first_attempt_without_retrying() {
        let policy = RetryPolicy { max_retries: 3, base_delay: Duration::from_millis(1) };
        let token = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let result: Result<u32, ProviderError> = run_with_retry(&policy, &token, |_attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(42) }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_up_to_max_retries_plus_one_total_attempts() {
        let policy = RetryPolicy { max_retries: 2, base_delay: Duration::from_millis(1) };
        let token = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let result: Result<u32, ProviderError> = run_with_retry(&policy, &token, |_attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::new(ProviderErrorKind::ServerError, "boom")) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_error_aborts_immediately() {
        let policy = RetryPolicy { max_retries: 5, base_delay: Duration::from_millis(1) };
        let token = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let result: Result<u32, ProviderError> = run_with_retry(&policy, &token, |_attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::new(ProviderErrorKind::Authentication, "bad key")) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rate_limited_twice_then_success_takes_exactly_three_attempts() {
        let policy = RetryPolicy { max_retries: 3, base_delay: Duration::from_millis(1) };
        let token = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let result: Result<u32, ProviderError> = run_with_retry(&policy, &token, |_attempt| {
            let call_number = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call_number < 2 {
                    Err(ProviderError::new(ProviderErrorKind::RateLimit, "rate limited"))
                } else {
                    Ok(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn cancellation_before_retry_surfaces_last_error() {
        let policy = RetryPolicy { max_retries: 5, base_delay: Duration::from_secs(30) };
        let token = CancellationToken::new();
        token.cancel();
        let result: Result<u32, ProviderError> = run_with_retry(&policy, &token, |_attempt| async {
            Err(ProviderError::new(ProviderErrorKind::Timeout, "slow"))
        })
        .await;
        assert!(result.is_err());
    }
}
