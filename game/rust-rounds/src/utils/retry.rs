use std::time::Duration;

/// Backoff schedule for idempotent backend reads.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub jitter_max: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(800),
            jitter_max: Some(Duration::from_millis(50)),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            jitter_max: None,
        }
    }

    fn delay_for(&self, backoff: Duration) -> Duration {
        match self.jitter_max {
            Some(jitter_max) if !jitter_max.is_zero() => {
                let jitter_ms = jitter_max.as_millis() as u64;
                backoff + Duration::from_millis(rand::random::<u64>() % (jitter_ms + 1))
            }
            _ => backoff,
        }
    }
}

/// Runs `f` until it succeeds, `should_retry` rejects the error, or attempts run out.
pub async fn retry_async<F, Fut, T, E, P>(policy: &RetryPolicy, should_retry: P, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut attempts_left = policy.max_attempts.max(1);
    let mut backoff = policy.base_backoff;

    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempts_left -= 1;
                if attempts_left == 0 || !should_retry(&err) {
                    return Err(err);
                }

                let wait = policy.delay_for(backoff);
                tracing::debug!(wait_ms = wait.as_millis() as u64, attempts_left, "retrying backend read");
                tokio::time::sleep(wait).await;

                backoff = std::cmp::min(backoff * 2, policy.max_backoff);
            }
        }
    }
}
