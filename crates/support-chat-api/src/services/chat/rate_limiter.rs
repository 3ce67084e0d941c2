use dashmap::{mapref::entry::Entry, DashMap};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::types::RateDecision;
use crate::config::ChatConfig;

#[derive(Debug, Clone, Copy)]
struct RateWindow {
    count: u32,
    reset_at: Instant,
}

/// Fixed-window request counter keyed by conversation id.
///
/// Increment-or-reset happens under the DashMap entry lock, so concurrent
/// checks on one key never lose a count.
pub struct RateLimiter {
    windows: DashMap<String, RateWindow>,
    max_requests: u32,
    window: Duration,
    idle_ttl: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration, idle_ttl: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests: max_requests.max(1),
            window,
            idle_ttl,
        }
    }

    pub fn from_config(cfg: &ChatConfig) -> Self {
        Self::new(
            cfg.rate_limit_max_requests,
            cfg.rate_limit_window(),
            Duration::from_secs(cfg.rate_limit_idle_ttl_seconds),
        )
    }

    pub fn check_limit(&self, key: &str) -> RateDecision {
        self.check_limit_at(key, Instant::now())
    }

    pub fn check_limit_at(&self, key: &str, now: Instant) -> RateDecision {
        let fresh = RateWindow {
            count: 1,
            reset_at: now + self.window,
        };

        match self.windows.entry(key.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(fresh);
                RateDecision::allow()
            }
            Entry::Occupied(mut slot) => {
                let w = slot.get_mut();
                if now > w.reset_at {
                    *w = fresh;
                    return RateDecision::allow();
                }

                if w.count < self.max_requests {
                    w.count += 1;
                    return RateDecision::allow();
                }

                let remaining = w.reset_at.saturating_duration_since(now);
                let reset_in = remaining.as_millis().div_ceil(1000).max(1) as u64;
                debug!("Rate limit hit for {} ({} requests), reset in {}s", key, w.count, reset_in);
                RateDecision::deny(reset_in)
            }
        }
    }

    /// Forget the window for `key`
    pub fn reset(&self, key: &str) {
        self.windows.remove(key);
    }

    /// Drop windows that ended more than `idle_ttl` ago. Returns count removed.
    pub fn evict_idle(&self) -> usize {
        self.evict_idle_at(Instant::now())
    }

    fn evict_idle_at(&self, now: Instant) -> usize {
        let start_len = self.windows.len();
        let idle_ttl = self.idle_ttl;
        self.windows.retain(|_, w| now <= w.reset_at + idle_ttl);
        let count = start_len.saturating_sub(self.windows.len());

        if count > 0 {
            info!("Evicted {} idle rate-limit windows", count);
        }

        count
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
