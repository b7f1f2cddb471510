//! Retry policy
//!
//! Exponential backoff with jitter (base * 2^(n-1), capped) for transient
//! failures, a mandatory shared cool-down for rate-limit responses, an
//! attempt budget and a ceiling on total time spent waiting. Every network
//! call site goes through [`RetryPolicy::run`].

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::rate_limit::RateLimitGate;

/// How a failure should be handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// Endpoint asked us to back off, optionally saying for how long
    RateLimited(Option<Duration>),
    /// Worth trying again after backoff
    Transient,
    /// Retrying will not help
    Fatal,
}

/// Errors that can be classified for retry
pub trait Retryable {
    fn retry_class(&self) -> RetryClass;
}

/// Outcome of a call that did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// Non-retryable error, returned as-is
    Fatal(E),
    /// Attempt budget or wait ceiling spent
    Exhausted { attempts: u32, last: E },
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Cap on a single backoff delay
    pub max_delay: Duration,
    /// Ceiling on cumulative backoff and cool-down time per call
    pub max_total_wait: Duration,
    /// Random jitter applied to each backoff, in percent
    pub jitter_pct: u32,
    /// Cool-down after a rate-limit response without Retry-After
    pub rate_limit_cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            max_total_wait: Duration::from_secs(30),
            jitter_pct: 20,
            rate_limit_cooldown: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `retry` (1-based), with jitter applied
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        let base_ms = self.base_delay.as_millis() as u64;
        let capped_ms = base_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_delay.as_millis() as u64);

        let jitter_range = (capped_ms * self.jitter_pct.min(100) as u64 / 100) as i64;
        let jitter: i64 = if jitter_range > 0 {
            rand::thread_rng().gen_range(-jitter_range..=jitter_range)
        } else {
            0
        };
        Duration::from_millis((capped_ms as i64 + jitter).max(0) as u64)
    }

    /// Run `call` until it succeeds, fails fatally, or the budget is spent.
    ///
    /// `gate` is consulted before every attempt; rate-limit responses trip
    /// its cool-down so every task sharing it backs off together.
    pub async fn run<T, E, F, Fut>(
        &self,
        gate: &RateLimitGate,
        operation: &str,
        mut call: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut waited = Duration::ZERO;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            gate.acquire().await;

            let error = match call().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", operation, attempt);
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            let class = error.retry_class();
            let delay = match class {
                RetryClass::Fatal => return Err(RetryError::Fatal(error)),
                RetryClass::RateLimited(retry_after) => {
                    retry_after.unwrap_or(self.rate_limit_cooldown)
                }
                RetryClass::Transient => self.backoff_for(attempt),
            };

            if attempt >= max_attempts {
                warn!("{} failed after {} attempts: {}", operation, attempt, error);
                return Err(RetryError::Exhausted { attempts: attempt, last: error });
            }
            if waited + delay > self.max_total_wait {
                warn!(
                    "{} giving up after {} attempts: next wait {:?} exceeds ceiling {:?}",
                    operation, attempt, delay, self.max_total_wait
                );
                return Err(RetryError::Exhausted { attempts: attempt, last: error });
            }
            waited += delay;

            match class {
                RetryClass::RateLimited(_) => gate.trip(delay),
                _ => {
                    debug!(
                        "{} attempt {}/{} failed: {}; retrying in {:?}",
                        operation, attempt, max_attempts, error, delay
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    #[derive(Debug, Clone, PartialEq)]
    enum TestError {
        Transient,
        RateLimited,
        Fatal,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl Retryable for TestError {
        fn retry_class(&self) -> RetryClass {
            match self {
                TestError::Transient => RetryClass::Transient,
                TestError::RateLimited => RetryClass::RateLimited(None),
                TestError::Fatal => RetryClass::Fatal,
            }
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            max_total_wait: Duration::from_secs(1),
            jitter_pct: 0,
            rate_limit_cooldown: Duration::from_millis(20),
        }
    }

    #[test]
    fn test_backoff_is_exponential_and_capped() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1_000),
            jitter_pct: 0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff_for(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(400));
        assert_eq!(policy.backoff_for(5), Duration::from_millis(1_000));
        assert_eq!(policy.backoff_for(60), Duration::from_millis(1_000));
    }

    #[test]
    fn test_backoff_jitter_stays_in_range() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_secs(10),
            jitter_pct: 20,
            ..RetryPolicy::default()
        };
        for _ in 0..100 {
            let delay = policy.backoff_for(1);
            assert!(delay >= Duration::from_millis(800));
            assert!(delay <= Duration::from_millis(1_200));
        }
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let gate = RateLimitGate::unlimited();
        let calls = AtomicU32::new(0);

        let result = fast_policy()
            .run(&gate, "test", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(TestError::Transient)
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_after_max_attempts() {
        let gate = RateLimitGate::unlimited();
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = fast_policy()
            .run(&gate, "test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Transient)
            })
            .await;

        assert_eq!(
            result,
            Err(RetryError::Exhausted { attempts: 4, last: TestError::Transient })
        );
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_fatal_is_not_retried() {
        let gate = RateLimitGate::unlimited();
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = fast_policy()
            .run(&gate, "test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Fatal)
            })
            .await;

        assert_eq!(result, Err(RetryError::Fatal(TestError::Fatal)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_trips_shared_cooldown() {
        let gate = RateLimitGate::unlimited();
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result = fast_policy()
            .run(&gate, "test", || async {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(TestError::RateLimited)
                } else {
                    Ok(())
                }
            })
            .await;

        assert!(result.is_ok());
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[tokio::test]
    async fn test_total_wait_ceiling_stops_early() {
        let gate = RateLimitGate::unlimited();
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 10,
            rate_limit_cooldown: Duration::from_millis(30),
            max_total_wait: Duration::from_millis(50),
            ..fast_policy()
        };

        let result: Result<(), _> = policy
            .run(&gate, "test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError::RateLimited)
            })
            .await;

        // 30ms waited after the first failure; a second 30ms would exceed 50ms
        assert_eq!(
            result,
            Err(RetryError::Exhausted { attempts: 2, last: TestError::RateLimited })
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
