use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: usize,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 1000, 10000)
    }
}

impl RetryPolicy {
    pub fn new(max_retries: usize, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::from_millis(initial_backoff_ms),
            max_backoff: Duration::from_millis(max_backoff_ms),
        }
    }

    /// Run `request` until it succeeds or the retry budget is spent.
    ///
    /// The delay doubles after every failure, capped at `max_backoff`.
    /// `what` names the request in log lines.
    pub async fn retry<F, Fut, T, E>(&self, what: &str, mut request: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut delay = self.initial_backoff;
        let mut attempt = 1;

        loop {
            let error = match request().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if attempt > self.max_retries {
                warn!(request = what, attempts = attempt, %error, "Giving up on request");
                return Err(error);
            }

            debug!(
                request = what,
                attempt,
                delay_ms = delay.as_millis() as u64,
                %error,
                "Request failed, backing off"
            );
            sleep(delay).await;
            delay = (delay * 2).min(self.max_backoff);
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::new(3, 1, 2);

        let result: Result<u32, String> = policy
            .retry("flaky", || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { if n < 3 { Err(format!("attempt {n}")) } else { Ok(n) } }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::new(2, 1, 1);

        let result: Result<(), &str> = policy
            .retry("broken", || {
                calls.set(calls.get() + 1);
                async { Err("down") }
            })
            .await;

        assert_eq!(result, Err("down"));
        assert_eq!(calls.get(), 3);
    }
}
