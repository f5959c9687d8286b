//! Fixed-window attempt limiter keyed by client IP.
//!
//! Guards the login route: each address gets `max_attempts` tries per
//! window, counted from its first attempt in that window.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::{Error, Result};

struct Window {
    started: Instant,
    attempts: u32,
}

pub struct RateLimiter {
    max_attempts: u32,
    window: Duration,
    windows: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    pub fn new(max_attempts: u32, window_secs: u64) -> Self {
        Self {
            max_attempts,
            window: Duration::from_secs(window_secs.max(1)),
            windows: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<IpAddr, Window>> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record an attempt from `ip`.
    ///
    /// Fails with [`Error::TooManyRequests`] once the window is used up,
    /// carrying the seconds until it resets.
    pub fn check(&self, ip: IpAddr) -> Result<()> {
        self.check_at(ip, Instant::now())
    }

    fn check_at(&self, ip: IpAddr, now: Instant) -> Result<()> {
        let mut windows = self.lock();
        let window = windows.entry(ip).or_insert(Window {
            started: now,
            attempts: 0,
        });

        let elapsed = now.saturating_duration_since(window.started);
        if elapsed >= self.window {
            window.started = now;
            window.attempts = 0;
        }

        if window.attempts >= self.max_attempts {
            let remaining = self.window.saturating_sub(elapsed);
            let retry_after = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
            tracing::warn!(%ip, retry_after, "Login rate limit exceeded");
            return Err(Error::TooManyRequests {
                retry_after: retry_after.max(1),
            });
        }
        window.attempts += 1;
        Ok(())
    }

    /// Drop windows that have expired.
    pub fn cleanup(&self) {
        let now = Instant::now();
        let window = self.window;
        self.lock()
            .retain(|_, w| now.saturating_duration_since(w.started) < window);
    }
}
