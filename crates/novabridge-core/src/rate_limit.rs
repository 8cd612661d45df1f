//! Fixed-window rate limiting for expensive operations.
//!
//! The window is checked lazily on each call; there is no background
//! timer. A single process-wide window guards actor spawns.

use std::time::{Duration, Instant};

/// A fixed-window counter.
#[derive(Debug, Clone)]
pub struct RateWindow {
    window: Duration,
    limit: u32,
    started: Option<Instant>,
    count: u32,
}

impl RateWindow {
    /// Allow `limit` operations per `window`.
    pub const fn new(limit: u32, window: Duration) -> Self {
        Self {
            window,
            limit,
            started: None,
            count: 0,
        }
    }

    /// Count one operation at `now`.
    ///
    /// The window resets once more than `window` has elapsed since it
    /// started. Returns the time left in the window when the operation
    /// exceeds the limit; a rejected operation still counts.
    pub fn check(&mut self, now: Instant) -> Result<(), Duration> {
        let started = match self.started {
            Some(started) if now.saturating_duration_since(started) <= self.window => started,
            _ => {
                self.started = Some(now);
                self.count = 0;
                now
            }
        };
        self.count = self.count.saturating_add(1);
        if self.count > self.limit {
            let elapsed = now.saturating_duration_since(started);
            return Err(self.window.saturating_sub(elapsed));
        }
        Ok(())
    }

    /// Operations counted in the current window.
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Configured limit per window.
    pub const fn limit(&self) -> u32 {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn hundred_and_first_call_is_rejected() {
        let mut window = RateWindow::new(100, MINUTE);
        let start = Instant::now();
        let rejected = (0..101)
            .map(|i| window.check(start + Duration::from_millis(i * 10)))
            .filter(Result::is_err)
            .count();
        assert_eq!(rejected, 1);
        assert!(window.check(start + Duration::from_secs(1)).is_err());
    }

    #[test]
    fn window_resets_after_it_elapses() {
        let mut window = RateWindow::new(100, MINUTE);
        let start = Instant::now();
        for _ in 0..100 {
            assert!(window.check(start).is_ok());
        }
        let later = start + MINUTE + Duration::from_millis(1);
        assert!(window.check(later).is_ok());
        assert_eq!(window.count(), 1);
    }

    #[test]
    fn boundary_instant_stays_in_window() {
        let mut window = RateWindow::new(1, MINUTE);
        let start = Instant::now();
        assert!(window.check(start).is_ok());
        assert!(window.check(start + MINUTE).is_err());
    }

    #[test]
    fn retry_after_is_time_left_in_window() {
        let mut window = RateWindow::new(1, MINUTE);
        let start = Instant::now();
        assert!(window.check(start).is_ok());
        let retry = window.check(start + Duration::from_secs(15));
        assert_eq!(retry, Err(Duration::from_secs(45)));
    }
}
