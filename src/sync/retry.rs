use anyhow::{anyhow, Result};
use std::time::Duration;
use tokio::time::sleep;
use tracing::trace;

/// Bounded retries with a constant pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub async fn retry<F, T, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;
        for attempt in 0..self.max_attempts {
            match op().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    trace!("Attempt {}/{} failed: {}", attempt + 1, self.max_attempts, e);
                    last_error = Some(e);
                    if attempt + 1 < self.max_attempts {
                        sleep(self.delay).await;
                    }
                }
            }
        }
        Err(last_error.unwrap_or_else(|| anyhow!("no attempts made")))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(500))
    }
}
