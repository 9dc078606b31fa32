//! Rolling-window rate limiting for upstream API calls.
//!
//! The upstream geocoding API enforces a per-second request quota. Workers
//! call [`RateLimiter::acquire`] before every request; once the budget for
//! the current window is spent, callers sleep until a slot frees up instead
//! of failing.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Permit gate capping how many calls may start within any rolling window.
///
/// Call-start timestamps are kept in a deque; a permit is granted when fewer
/// than `max_calls` timestamps fall inside the window ending now. Each
/// limiter instance is independent, so tests (or callers talking to several
/// upstreams) can run their own budgets side by side.
///
/// Shared across workers behind an `Arc`; the deque is only touched under
/// the mutex, and the lock is never held across a sleep.
///
/// # Example
///
/// ```rust,no_run
/// use geocode_lib::RateLimiter;
///
/// # async fn demo() {
/// let limiter = RateLimiter::per_second(50);
/// limiter.acquire().await; // returns immediately while budget remains
/// # }
/// ```
pub struct RateLimiter {
    max_calls: usize,
    window: Duration,
    starts: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a limiter allowing `max_calls` starts per rolling second.
    ///
    /// A budget of 0 is floored to 1 so `acquire` can always make progress.
    pub fn per_second(max_calls: usize) -> Self {
        Self::new(max_calls, Duration::from_secs(1))
    }

    /// Create a limiter with a custom window length.
    pub fn new(max_calls: usize, window: Duration) -> Self {
        let max_calls = max_calls.max(1);
        Self {
            max_calls,
            window,
            starts: Mutex::new(VecDeque::with_capacity(max_calls)),
        }
    }

    /// The configured per-window call budget.
    pub fn max_calls(&self) -> usize {
        self.max_calls
    }

    /// Block until a call may start, then consume one permit.
    ///
    /// Expired timestamps are pruned on every attempt; when the window is
    /// full the caller sleeps exactly until the oldest recorded start ages
    /// out, then re-checks (another worker may have taken the freed slot).
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut starts = self.starts.lock().await;
                let now = Instant::now();

                while starts
                    .front()
                    .is_some_and(|&t| now.duration_since(t) >= self.window)
                {
                    starts.pop_front();
                }

                if starts.len() < self.max_calls {
                    starts.push_back(now);
                    return;
                }

                // Window is full: the front entry is the next to expire.
                let oldest = starts[0];
                self.window.saturating_sub(now.duration_since(oldest))
            };

            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Every start timestamp pair N slots apart must span at least one
    /// full window, no matter how many workers contend for permits.
    fn assert_rolling_window_respected(mut starts: Vec<Instant>, max_calls: usize, window: Duration) {
        starts.sort();
        for pair in starts.windows(max_calls + 1) {
            let spread = pair[max_calls].duration_since(pair[0]);
            assert!(
                spread >= window,
                "{} calls started within {:?} (allowed {} per {:?})",
                max_calls + 1,
                spread,
                max_calls,
                window
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_under_budget_is_immediate() {
        let limiter = RateLimiter::per_second(3);
        let before = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;

        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_blocks_when_window_full() {
        let limiter = RateLimiter::per_second(2);
        let before = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await; // must wait out the window

        assert!(Instant::now().duration_since(before) >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rolling_window_property_sequential() {
        let max_calls = 5;
        let limiter = RateLimiter::per_second(max_calls);
        let mut starts = Vec::new();

        for _ in 0..17 {
            limiter.acquire().await;
            starts.push(Instant::now());
        }

        assert_rolling_window_respected(starts, max_calls, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rolling_window_property_concurrent() {
        let max_calls = 4;
        let limiter = Arc::new(RateLimiter::per_second(max_calls));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                Instant::now()
            }));
        }

        let mut starts = Vec::new();
        for handle in handles {
            starts.push(handle.await.unwrap());
        }

        assert_rolling_window_respected(starts, max_calls, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_budget_floored_to_one() {
        let limiter = RateLimiter::per_second(0);
        assert_eq!(limiter.max_calls(), 1);
        // Must still grant permits rather than deadlock.
        limiter.acquire().await;
        limiter.acquire().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_window_length() {
        let limiter = RateLimiter::new(1, Duration::from_millis(250));
        let before = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;

        let elapsed = Instant::now().duration_since(before);
        assert!(elapsed >= Duration::from_millis(250));
        assert!(elapsed < Duration::from_secs(1));
    }
}
