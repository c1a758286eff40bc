use std::fmt;
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Bounded, sequential retry with a fixed pause between attempts.
///
/// The worst case wall time is `max_attempts * (operation time) + (max_attempts - 1) * delay`;
/// there is no pause after the final attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Every attempt failed
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Run `operation` until it succeeds or the attempts run out.
    ///
    /// The closure receives the 1-based attempt number. On success returns the value and the
    /// number of attempts it took. At least one attempt is always made.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<(T, u32), RetryExhausted<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok((value, attempt)),
                Err(err) if attempt >= max_attempts => {
                    tracing::warn!(attempt, max_attempts, error = %err, "final attempt failed");
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error: err,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        error = %err,
                        "attempt failed, retrying in {:?}",
                        self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts_without_trailing_sleep() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1));
        let start = Instant::now();
        let calls = AtomicU32::new(0);
        let calls = &calls;

        let result: Result<((), u32), _> = policy
            .run(move |_| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>("unreachable")
            })
            .await;

        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.attempts, 5);
        assert_eq!(exhausted.last_error, "unreachable");
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        // four pauses between five attempts
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_on_first_success() {
        let policy = RetryPolicy::default();
        let start = Instant::now();

        let (value, attempts) = policy
            .run(|attempt| async move {
                if attempt < 3 {
                    Err("not yet")
                } else {
                    Ok(attempt * 10)
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 30);
        assert_eq!(attempts, 3);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_tries_once() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        let exhausted = policy
            .run(|_| async { Err::<(), _>("nope") })
            .await
            .unwrap_err();
        assert_eq!(exhausted.attempts, 1);
    }
}
