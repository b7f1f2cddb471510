//! Shared rate-limit gate
//!
//! Token bucket (`requests_per_second`, `burst`) plus a cool-down deadline
//! that any caller can trip when the endpoint answers "rate limited". Every
//! network call passes through [`RateLimitGate::acquire`] before dispatch.
//!
//! The mutex only guards bookkeeping; waits happen outside the lock so
//! unrelated tasks are never serialized behind a sleeping one.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Debug)]
struct GateState {
    tokens: f64,
    last_refill: Instant,
    cooldown_until: Option<Instant>,
}

/// Rate limiter shared by every task in a run
#[derive(Debug)]
pub struct RateLimitGate {
    /// Refill rate; zero disables the bucket
    requests_per_second: f64,
    /// Bucket capacity
    burst: f64,
    state: Mutex<GateState>,
}

impl RateLimitGate {
    /// Create a gate allowing `requests_per_second` with bursts up to `burst`.
    /// A rate of zero disables throttling but keeps the cool-down.
    pub fn new(requests_per_second: u32, burst: u32) -> Self {
        let burst = burst.max(1) as f64;
        Self {
            requests_per_second: requests_per_second as f64,
            burst,
            state: Mutex::new(GateState {
                tokens: burst,
                last_refill: Instant::now(),
                cooldown_until: None,
            }),
        }
    }

    /// Gate with no throttling, only cool-down
    pub fn unlimited() -> Self {
        Self::new(0, 1)
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait until a request may be dispatched
    pub async fn acquire(&self) {
        loop {
            let wait = self.try_acquire(Instant::now());
            match wait {
                Ok(()) => return,
                Err(wait) => {
                    debug!("Rate limit gate: waiting {:?}", wait);
                    sleep(wait).await;
                }
            }
        }
    }

    /// Take a token if allowed at `now`; otherwise report how long to wait
    fn try_acquire(&self, now: Instant) -> Result<(), Duration> {
        let mut state = self.lock();

        if let Some(until) = state.cooldown_until {
            if until > now {
                return Err(until - now);
            }
            state.cooldown_until = None;
        }

        if self.requests_per_second <= 0.0 {
            return Ok(());
        }

        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.requests_per_second).min(self.burst);
        state.last_refill = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            Ok(())
        } else {
            let deficit = 1.0 - state.tokens;
            Err(Duration::from_secs_f64(deficit / self.requests_per_second))
        }
    }

    /// Block all callers for `cooldown`. Extends, never shortens, an active
    /// cool-down.
    pub fn trip(&self, cooldown: Duration) {
        let until = Instant::now() + cooldown;
        let mut state = self.lock();
        if state.cooldown_until.map_or(true, |current| current < until) {
            warn!("Rate limited by endpoint, cooling down for {:?}", cooldown);
            state.cooldown_until = Some(until);
        }
    }

    /// Remaining cool-down, if any
    pub fn cooldown_remaining(&self) -> Option<Duration> {
        let now = Instant::now();
        self.lock()
            .cooldown_until
            .filter(|until| *until > now)
            .map(|until| until - now)
    }
}

impl Default for RateLimitGate {
    fn default() -> Self {
        Self::unlimited()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_then_throttle() {
        let gate = RateLimitGate::new(10, 2);
        let now = Instant::now();

        assert!(gate.try_acquire(now).is_ok());
        assert!(gate.try_acquire(now).is_ok());
        let wait = gate.try_acquire(now).unwrap_err();
        assert!(wait <= Duration::from_millis(100));
        assert!(wait > Duration::ZERO);

        // One token refills after 100ms
        assert!(gate.try_acquire(now + Duration::from_millis(100)).is_ok());
    }

    #[test]
    fn test_unlimited_never_waits() {
        let gate = RateLimitGate::unlimited();
        let now = Instant::now();
        for _ in 0..1_000 {
            assert!(gate.try_acquire(now).is_ok());
        }
    }

    #[test]
    fn test_trip_blocks_until_deadline() {
        let gate = RateLimitGate::unlimited();
        gate.trip(Duration::from_secs(5));

        let wait = gate.try_acquire(Instant::now()).unwrap_err();
        assert!(wait > Duration::from_secs(4));
        assert!(gate.cooldown_remaining().is_some());
    }

    #[test]
    fn test_shorter_trip_does_not_shorten_cooldown() {
        let gate = RateLimitGate::unlimited();
        gate.trip(Duration::from_secs(10));
        gate.trip(Duration::from_millis(1));
        assert!(gate.cooldown_remaining().unwrap() > Duration::from_secs(9));
    }

    #[tokio::test]
    async fn test_acquire_waits_out_cooldown() {
        let gate = RateLimitGate::unlimited();
        gate.trip(Duration::from_millis(30));

        let start = Instant::now();
        gate.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(25));
        assert!(gate.cooldown_remaining().is_none());
    }
}
