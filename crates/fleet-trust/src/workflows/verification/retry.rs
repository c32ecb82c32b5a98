use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Exponential backoff: attempt `n` waits `initial_delay * 2^n` before retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
        }
    }

    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub async fn run<T, E, Op, Fut>(&self, context: &str, mut operation: Op) -> Result<T, E>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= self.max_retries => return Err(err),
                Err(err) => {
                    let delay = self.initial_delay.saturating_mul(2u32.saturating_pow(attempt));
                    warn!(
                        context,
                        attempt = attempt + 1,
                        remaining = self.max_retries - attempt,
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "retrying after failure"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
