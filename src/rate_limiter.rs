// Fixed-window request counter.
//
// The window restarts when a call observes that `window` has elapsed since the last reset, so
// a burst straddling a reset can admit up to twice `max_requests` in quick succession.

use std::time::{Duration, Instant};

pub const DEFAULT_MAX_REQUESTS: u32 = 60;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    request_count: u32,
    remaining: u32,
    last_reset: Instant,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self::starting_at(max_requests, window, Instant::now())
    }

    pub fn starting_at(max_requests: u32, window: Duration, now: Instant) -> Self {
        Self {
            max_requests,
            window,
            request_count: 0,
            remaining: max_requests,
            last_reset: now,
        }
    }

    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_reset) >= self.window {
            self.request_count = 0;
            self.remaining = self.max_requests;
            self.last_reset = now;
        }

        if self.request_count >= self.max_requests || self.remaining == 0 {
            return false;
        }

        self.request_count += 1;
        self.remaining -= 1;
        true
    }

    /// Applies limit hints reported by a remote service and restarts the window.
    pub fn update_limits(&mut self, remaining: u32, reset_in: Duration) {
        self.remaining = remaining;
        self.window = reset_in;
        self.last_reset = Instant::now();
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn time_until_reset(&self) -> Duration {
        self.time_until_reset_at(Instant::now())
    }

    pub fn time_until_reset_at(&self, now: Instant) -> Duration {
        self.window
            .saturating_sub(now.saturating_duration_since(self.last_reset))
    }
}
