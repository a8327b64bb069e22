//! Minimum-spacing gate for outbound API requests.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Default spacing between requests: ~8-9 rps. Scryfall asks for
/// 50-100ms between requests and fewer than 10 rps.
pub const MIN_DELAY: Duration = Duration::from_millis(120);

/// A leaky-bucket-of-one-token rate gate.
///
/// Before each request the caller waits until at least `min_delay` has
/// passed since the previous request started, then the timestamp is
/// advanced. Back-to-back calls are spaced evenly; bursts are not
/// otherwise penalised.
///
/// The timestamp lives behind a `tokio::sync::Mutex` held across the
/// sleep, so spacing holds even if the host dispatches tool calls
/// concurrently.
#[derive(Debug)]
pub struct RateLimiter {
    min_delay: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter with the given minimum inter-request spacing.
    #[must_use]
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_call: Mutex::new(None),
        }
    }

    /// Waits until the next request is allowed, then claims the slot.
    pub async fn acquire(&self) {
        let mut last_call = self.last_call.lock().await;

        if let Some(last) = *last_call {
            let ready_at = last + self.min_delay;
            let now = Instant::now();
            if ready_at > now {
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *last_call = Some(Instant::now());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(MIN_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_acquire_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_millis(120));
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_acquires_are_spaced() {
        let limiter = RateLimiter::new(Duration::from_millis(120));

        limiter.acquire().await;
        let first = Instant::now();
        limiter.acquire().await;

        assert!(first.elapsed() >= Duration::from_millis(120));
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_delay_is_not_waited_again() {
        let limiter = RateLimiter::new(Duration::from_millis(120));

        limiter.acquire().await;
        tokio::time::sleep(Duration::from_millis(200)).await;

        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
