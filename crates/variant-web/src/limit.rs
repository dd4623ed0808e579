//! Per-caller request ceiling.
//!
//! Fixed window per client IP: the first request from an address opens a
//! window, and up to `max_requests` are admitted until it expires.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use crate::error::ApiError;

/// Stale windows are swept once the table grows past this many callers.
const SWEEP_THRESHOLD: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests admitted per caller per window. Default: `100`.
    pub max_requests: u32,
    /// Window length. Default: 15 minutes.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(15 * 60),
        }
    }
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Record one request from `caller`. Returns `false` when over the ceiling.
    pub fn admit(&self, caller: IpAddr) -> bool {
        self.admit_at(caller, Instant::now())
    }

    fn admit_at(&self, caller: IpAddr, now: Instant) -> bool {
        let window_len = self.config.window;
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        if windows.len() > SWEEP_THRESHOLD {
            windows.retain(|_, w| now.duration_since(w.started) < window_len);
        }

        let window = windows.entry(caller).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(window.started) >= window_len {
            window.started = now;
            window.count = 0;
        }
        if window.count >= self.config.max_requests {
            return false;
        }
        window.count += 1;
        true
    }
}

/// Middleware rejecting callers over the ceiling with 429.
///
/// Requests without connection info (e.g. a router served without
/// `into_make_service_with_connect_info`) are admitted.
pub async fn enforce(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let caller = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    match caller {
        Some(ip) if !limiter.admit(ip) => {
            warn!("rate ceiling reached for {ip}");
            ApiError::RateLimited.into_response()
        }
        Some(_) => next.run(request).await,
        None => {
            debug!("no connection info, skipping rate ceiling");
            next.run(request).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(60),
        })
    }

    #[test]
    fn admits_up_to_ceiling() {
        let limiter = limiter(2);
        let ip: IpAddr = [10, 0, 0, 1].into();
        let now = Instant::now();
        assert!(limiter.admit_at(ip, now));
        assert!(limiter.admit_at(ip, now));
        assert!(!limiter.admit_at(ip, now));
    }

    #[test]
    fn callers_are_counted_separately() {
        let limiter = limiter(1);
        let now = Instant::now();
        assert!(limiter.admit_at([10, 0, 0, 1].into(), now));
        assert!(limiter.admit_at([10, 0, 0, 2].into(), now));
        assert!(!limiter.admit_at([10, 0, 0, 1].into(), now));
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = limiter(1);
        let ip: IpAddr = [10, 0, 0, 1].into();
        let start = Instant::now();
        assert!(limiter.admit_at(ip, start));
        assert!(!limiter.admit_at(ip, start + Duration::from_secs(59)));
        assert!(limiter.admit_at(ip, start + Duration::from_secs(60)));
    }

    #[test]
    fn defaults_match_fifteen_minute_window() {
        let config = RateLimitConfig::default();
        assert_eq!(config.max_requests, 100);
        assert_eq!(config.window, Duration::from_secs(900));
    }
}
