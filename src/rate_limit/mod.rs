//! Fixed-window rate limiting for outbound Azure DevOps calls.
//!
//! One [`RateLimiter`] is owned by each [`DevOpsClient`](crate::devops::DevOpsClient)
//! and consulted before every HTTP request leaves the process.
//!
//! The window is fixed, not sliding: the counter resets only when a call
//! arrives more than one window length after the window started. The
//! counter is incremented before it is compared, and rejected calls are
//! not rolled back, so a burst of rejected calls keeps the counter above
//! the ceiling until the next rollover.
//!
//! # Example
//!
//! ```
//! use azure_devops_mcp::rate_limit::RateLimiter;
//!
//! let limiter = RateLimiter::new(2, 60_000);
//! assert!(limiter.check().is_ok());
//! assert!(limiter.check().is_ok());
//! assert!(limiter.check().is_err());
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};

use crate::error::RateLimitExceeded;
use crate::traits::{RealTimeProvider, TimeProvider};

/// Window length in milliseconds.
pub const RATE_LIMIT_WINDOW_MS: u64 = 60_000;

/// Calls allowed per window.
pub const DEFAULT_MAX_REQUESTS_PER_WINDOW: u32 = 100;

/// Counter state for the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    /// Calls counted in this window, including rejected ones.
    pub count: u32,
    /// When the current window started.
    pub window_start: DateTime<Utc>,
}

/// Per-client fixed-window rate limiter.
///
/// The increment-and-compare runs under a mutex, so the ceiling holds when
/// tool invocations are processed in parallel.
pub struct RateLimiter {
    max_requests: u32,
    window_ms: u64,
    window: Mutex<RateWindow>,
    clock: Arc<dyn TimeProvider>,
}

impl RateLimiter {
    /// Creates a limiter driven by the system clock.
    #[must_use]
    pub fn new(max_requests: u32, window_ms: u64) -> Self {
        Self::with_clock(max_requests, window_ms, Arc::new(RealTimeProvider))
    }

    /// Creates a limiter driven by the given clock.
    #[must_use]
    pub fn with_clock(max_requests: u32, window_ms: u64, clock: Arc<dyn TimeProvider>) -> Self {
        let window = RateWindow {
            count: 0,
            window_start: clock.now(),
        };
        Self {
            max_requests,
            window_ms,
            window: Mutex::new(window),
            clock,
        }
    }

    /// Counts one outbound call against the current window.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitExceeded`] once more than `max_requests` calls
    /// have been counted in the current window.
    pub fn check(&self) -> Result<(), RateLimitExceeded> {
        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        let now = self.clock.now();

        if elapsed_ms(window.window_start, now) > self.window_ms {
            window.count = 0;
            window.window_start = now;
        }

        window.count = window.count.saturating_add(1);
        if window.count <= self.max_requests {
            return Ok(());
        }

        let retry_after_ms =
            (self.window_ms + 1).saturating_sub(elapsed_ms(window.window_start, now));
        tracing::warn!(
            count = window.count,
            limit = self.max_requests,
            retry_after_ms,
            "Outbound rate limit exceeded"
        );
        Err(RateLimitExceeded {
            limit: self.max_requests,
            window_ms: self.window_ms,
            retry_after_ms,
        })
    }

    /// Returns a snapshot of the current window.
    #[must_use]
    pub fn window(&self) -> RateWindow {
        *self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the per-window ceiling.
    #[must_use]
    pub const fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Returns the window length in milliseconds.
    #[must_use]
    pub const fn window_ms(&self) -> u64 {
        self.window_ms
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS_PER_WINDOW, RATE_LIMIT_WINDOW_MS)
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_requests", &self.max_requests)
            .field("window_ms", &self.window_ms)
            .field("window", &self.window())
            .finish_non_exhaustive()
    }
}

/// Milliseconds from `start` to `now`; zero if the clock went backwards.
fn elapsed_ms(start: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from((now - start).num_milliseconds()).unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::traits::MockTimeProvider;
    use chrono::{Duration, TimeZone};
    use static_assertions::assert_impl_all;

    assert_impl_all!(RateLimiter: Send, Sync);

    /// Clock that only moves when told to.
    struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                now: Mutex::new(Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()),
            })
        }

        fn advance_ms(&self, ms: i64) {
            let mut now = self.now.lock().unwrap();
            *now += Duration::milliseconds(ms);
        }
    }

    impl TimeProvider for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    fn limiter(clock: &Arc<ManualClock>) -> RateLimiter {
        RateLimiter::with_clock(
            DEFAULT_MAX_REQUESTS_PER_WINDOW,
            RATE_LIMIT_WINDOW_MS,
            Arc::clone(clock) as Arc<dyn TimeProvider>,
        )
    }

    #[test]
    fn test_default_limits() {
        let limiter = RateLimiter::default();
        assert_eq!(limiter.max_requests(), 100);
        assert_eq!(limiter.window_ms(), 60_000);
        assert_eq!(limiter.window().count, 0);
    }

    #[test]
    fn test_hundred_calls_pass_then_reject() {
        let clock = ManualClock::new();
        let limiter = limiter(&clock);

        for i in 1..=100 {
            assert!(limiter.check().is_ok(), "call {i} should pass");
        }
        for i in 101..=150 {
            assert!(limiter.check().is_err(), "call {i} should be rejected");
        }
    }

    #[test]
    fn test_rejections_keep_incrementing() {
        let clock = ManualClock::new();
        let limiter = limiter(&clock);

        for _ in 0..105 {
            let _ = limiter.check();
        }
        assert_eq!(limiter.window().count, 105);
    }

    #[test]
    fn test_window_rollover_resets_count() {
        let clock = ManualClock::new();
        let limiter = limiter(&clock);

        for _ in 0..120 {
            let _ = limiter.check();
        }
        clock.advance_ms(60_001);

        assert!(limiter.check().is_ok());
        let window = limiter.window();
        assert_eq!(window.count, 1);
        assert_eq!(window.window_start, clock.now());
    }

    #[test]
    fn test_exact_window_length_does_not_roll_over() {
        let clock = ManualClock::new();
        let limiter = limiter(&clock);

        for _ in 0..100 {
            limiter.check().unwrap();
        }
        clock.advance_ms(60_000);

        assert!(limiter.check().is_err());
    }

    #[test]
    fn test_long_idle_starts_fresh_window() {
        let clock = ManualClock::new();
        let limiter = limiter(&clock);

        limiter.check().unwrap();
        clock.advance_ms(10 * 60_000);

        limiter.check().unwrap();
        assert_eq!(limiter.window().count, 1);
        assert_eq!(limiter.window().window_start, clock.now());
    }

    #[test]
    fn test_retry_after_counts_down_to_rollover() {
        let clock = ManualClock::new();
        let limiter = RateLimiter::with_clock(1, 60_000, Arc::clone(&clock) as _);

        limiter.check().unwrap();
        clock.advance_ms(20_000);

        let err = limiter.check().unwrap_err();
        assert_eq!(err.limit, 1);
        assert_eq!(err.window_ms, 60_000);
        assert_eq!(err.retry_after_ms, 40_001);
    }

    #[test]
    fn test_clock_going_backwards_does_not_reset() {
        let clock = ManualClock::new();
        let limiter = RateLimiter::with_clock(1, 60_000, Arc::clone(&clock) as _);

        limiter.check().unwrap();
        clock.advance_ms(-5_000);

        assert!(limiter.check().is_err());
    }

    #[test]
    fn test_with_mock_clock() {
        let fixed = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let mut mock = MockTimeProvider::new();
        mock.expect_now().return_const(fixed);

        let limiter = RateLimiter::with_clock(3, 60_000, Arc::new(mock));
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
        assert_eq!(limiter.window().window_start, fixed);
    }

    #[test]
    fn test_parallel_callers_respect_ceiling() {
        let clock = ManualClock::new();
        let limiter = Arc::new(limiter(&clock));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || (0..20).filter(|_| limiter.check().is_ok()).count())
            })
            .collect();

        let passed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(passed, 100);
        assert_eq!(limiter.window().count, 160);
    }

    #[test]
    fn test_debug_shows_limits() {
        let limiter = RateLimiter::new(5, 1_000);
        let debug = format!("{limiter:?}");
        assert!(debug.contains("RateLimiter"));
        assert!(debug.contains("max_requests: 5"));
    }
}
