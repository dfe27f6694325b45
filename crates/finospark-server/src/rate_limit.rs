//! Per-user request rate limiting
//!
//! The router only sees the `RateLimiter` trait, so the in-process sliding
//! window below can be swapped for a shared store without touching handlers.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::warn;

/// Default maximum requests per window
pub const DEFAULT_MAX_REQUESTS: usize = 10;

/// Default window length in seconds
pub const DEFAULT_WINDOW_SECS: u64 = 60;

/// Decides whether a caller may make another request
pub trait RateLimiter: Send + Sync {
    /// Record an attempt by `user_id` and return whether it is allowed
    fn allow(&self, user_id: &str) -> bool;
}

/// Rate limit policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: Duration::from_secs(DEFAULT_WINDOW_SECS),
        }
    }
}

impl RateLimitConfig {
    /// Read `FINOSPARK_RATE_LIMIT_MAX` and `FINOSPARK_RATE_LIMIT_WINDOW_SECS`
    ///
    /// Unset or unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_requests = parse_env("FINOSPARK_RATE_LIMIT_MAX").unwrap_or(defaults.max_requests);
        let window = parse_env("FINOSPARK_RATE_LIMIT_WINDOW_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.window);

        Self {
            max_requests,
            window,
        }
    }

    /// Message returned to callers that hit the limit
    pub fn rejection_message(&self) -> String {
        format!(
            "Rate limit exceeded. Maximum {} requests per {} seconds.",
            self.max_requests,
            self.window.as_secs()
        )
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid {}={:?}", name, raw);
            None
        }
    }
}

/// Sliding-window limiter keeping recent request times per user
///
/// Entries older than the window are evicted on every call for that user.
/// Users with no request inside the window are dropped at most once per
/// window, so the map only holds recently active callers.
pub struct SlidingWindowLimiter {
    config: RateLimitConfig,
    state: Mutex<WindowState>,
}

struct WindowState {
    by_user: HashMap<String, VecDeque<Instant>>,
    last_sweep: Instant,
}

impl SlidingWindowLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: Mutex::new(WindowState {
                by_user: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    fn allow_at(&self, user_id: &str, now: Instant) -> bool {
        let window = self.config.window;

        // Every update leaves the deques sorted, so a poisoned map is still valid
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if now.saturating_duration_since(state.last_sweep) >= window {
            state.by_user.retain(|_, timestamps| {
                timestamps
                    .back()
                    .is_some_and(|&latest| now.saturating_duration_since(latest) < window)
            });
            state.last_sweep = now;
        }

        let timestamps = state.by_user.entry(user_id.to_string()).or_default();

        while let Some(&oldest) = timestamps.front() {
            if now.saturating_duration_since(oldest) >= window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() >= self.config.max_requests {
            if timestamps.is_empty() {
                state.by_user.remove(user_id);
            }
            return false;
        }

        timestamps.push_back(now);
        true
    }

    #[cfg(test)]
    fn tracked_users(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .by_user
            .len()
    }
}

impl RateLimiter for SlidingWindowLimiter {
    fn allow(&self, user_id: &str) -> bool {
        self.allow_at(user_id, Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: usize, window_secs: u64) -> SlidingWindowLimiter {
        SlidingWindowLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(window_secs),
        })
    }

    #[test]
    fn test_allows_up_to_max() {
        let limiter = limiter(3, 60);
        let now = Instant::now();

        assert!(limiter.allow_at("u1", now));
        assert!(limiter.allow_at("u1", now));
        assert!(limiter.allow_at("u1", now));
        assert!(!limiter.allow_at("u1", now));
    }

    #[test]
    fn test_users_are_independent() {
        let limiter = limiter(1, 60);
        let now = Instant::now();

        assert!(limiter.allow_at("u1", now));
        assert!(!limiter.allow_at("u1", now));
        assert!(limiter.allow_at("u2", now));
    }

    #[test]
    fn test_window_slides() {
        let limiter = limiter(2, 60);
        let start = Instant::now();

        assert!(limiter.allow_at("u1", start));
        assert!(limiter.allow_at("u1", start + Duration::from_secs(30)));
        assert!(!limiter.allow_at("u1", start + Duration::from_secs(59)));

        // The first request has aged out, the second has not
        assert!(limiter.allow_at("u1", start + Duration::from_secs(60)));
        assert!(!limiter.allow_at("u1", start + Duration::from_secs(61)));
    }

    #[test]
    fn test_rejected_attempts_do_not_extend_window() {
        let limiter = limiter(1, 10);
        let start = Instant::now();

        assert!(limiter.allow_at("u1", start));
        assert!(!limiter.allow_at("u1", start + Duration::from_secs(5)));
        assert!(limiter.allow_at("u1", start + Duration::from_secs(10)));
    }

    #[test]
    fn test_idle_users_are_dropped() {
        let limiter = limiter(2, 60);
        let start = Instant::now();

        for i in 0..100 {
            assert!(limiter.allow_at(&format!("user_{i}"), start));
        }
        assert_eq!(limiter.tracked_users(), 100);

        // Only the caller active in the latest window survives the sweep
        assert!(limiter.allow_at("u1", start + Duration::from_secs(61)));
        assert_eq!(limiter.tracked_users(), 1);

        // A dropped user starts from a clean window
        assert!(limiter.allow_at("user_0", start + Duration::from_secs(62)));
        assert!(limiter.allow_at("user_0", start + Duration::from_secs(62)));
        assert!(!limiter.allow_at("user_0", start + Duration::from_secs(62)));
    }

    #[test]
    fn test_zero_limit_keeps_no_state() {
        let limiter = limiter(0, 60);
        let now = Instant::now();

        assert!(!limiter.allow_at("u1", now));
        assert!(!limiter.allow_at("u2", now));
        assert_eq!(limiter.tracked_users(), 0);
    }

    #[test]
    fn test_rejection_message() {
        assert_eq!(
            RateLimitConfig::default().rejection_message(),
            "Rate limit exceeded. Maximum 10 requests per 60 seconds."
        );
    }
}
