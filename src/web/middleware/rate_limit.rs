//! Rate limiting for credential checks.
//!
//! Login and thread unlock posts are limited per client IP. Other requests
//! pass through untouched.

use axum::{
    extract::{ConnectInfo, Request},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    num::NonZeroU32,
    sync::{Arc, Mutex, PoisonError, RwLock},
    time::{Duration, Instant},
};

use crate::config::RateLimitConfig;
use crate::web::error::ApiError;

/// Per-IP rate limiter using Governor.
pub type IpRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// A per-minute quota is fully replenished after this long without use.
const REPLENISH_PERIOD: Duration = Duration::from_secs(60);

/// A limiter with the time it was last consulted.
struct TrackedLimiter {
    limiter: IpRateLimiter,
    last_seen: Mutex<Instant>,
}

impl TrackedLimiter {
    fn new(per_minute: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN));
        Self {
            limiter: RateLimiter::direct(quota),
            last_seen: Mutex::new(Instant::now()),
        }
    }

    fn check(&self) -> bool {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
        self.limiter.check().is_ok()
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*self.last_seen.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

type LimiterMap = RwLock<HashMap<String, Arc<TrackedLimiter>>>;

/// Which credential check a request performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guarded {
    Login,
    Unlock,
}

/// State for rate limiting.
pub struct RateLimitState {
    login_limiters: LimiterMap,
    unlock_limiters: LimiterMap,
    /// Login attempts per minute.
    login_per_minute: u32,
    /// Unlock attempts per minute.
    unlock_per_minute: u32,
    /// Whether forwarding headers name the client.
    trust_proxy_headers: bool,
}

impl RateLimitState {
    /// Create a new rate limit state keyed by the socket peer address.
    pub fn new(login_per_minute: u32, unlock_per_minute: u32) -> Self {
        Self {
            login_limiters: RwLock::new(HashMap::new()),
            unlock_limiters: RwLock::new(HashMap::new()),
            login_per_minute,
            unlock_per_minute,
            trust_proxy_headers: false,
        }
    }

    /// Take the client IP from `X-Forwarded-For` / `X-Real-IP` when set.
    pub fn trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    /// Create a rate limit state from configuration.
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.login_per_minute, config.unlock_per_minute)
            .trust_proxy_headers(config.trust_proxy_headers)
    }

    fn limiter(limiters: &LimiterMap, ip: &str, per_minute: u32) -> Arc<TrackedLimiter> {
        if let Some(limiter) = limiters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(ip)
        {
            return limiter.clone();
        }

        let mut guard = limiters.write().unwrap_or_else(PoisonError::into_inner);
        guard
            .entry(ip.to_string())
            .or_insert_with(|| Arc::new(TrackedLimiter::new(per_minute)))
            .clone()
    }

    /// Check whether another attempt from `ip` is allowed.
    pub fn check(&self, guarded: Guarded, ip: &str) -> bool {
        let limiter = match guarded {
            Guarded::Login => Self::limiter(&self.login_limiters, ip, self.login_per_minute),
            Guarded::Unlock => Self::limiter(&self.unlock_limiters, ip, self.unlock_per_minute),
        };
        limiter.check()
    }

    /// Drop limiters whose budget has fully replenished.
    pub fn cleanup(&self) {
        self.cleanup_idle(REPLENISH_PERIOD);
    }

    /// Drop limiters unused for at least `idle`.
    fn cleanup_idle(&self, idle: Duration) {
        let now = Instant::now();
        for limiters in [&self.login_limiters, &self.unlock_limiters] {
            limiters
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|_, v| Arc::strong_count(v) > 1 || v.idle_for(now) < idle);
        }
    }

    /// Start a background task to periodically clean up old entries.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            interval.tick().await;
            loop {
                interval.tick().await;
                self.cleanup();
            }
        });
    }

    /// Extract the client IP from a request.
    fn client_ip(&self, req: &Request) -> String {
        if self.trust_proxy_headers {
            let forwarded = req
                .headers()
                .get("X-Forwarded-For")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(|ip| ip.trim().to_string());
            if let Some(ip) = forwarded {
                return ip;
            }

            if let Some(ip) = req.headers().get("X-Real-IP").and_then(|v| v.to_str().ok()) {
                return ip.to_string();
            }
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Rate limit POSTs to a guarded route.
pub async fn rate_limit(
    state: Arc<RateLimitState>,
    guarded: Guarded,
    req: Request,
    next: Next,
) -> Response {
    if req.method() != Method::POST {
        return next.run(req).await;
    }

    let ip = state.client_ip(&req);
    if !state.check(guarded, &ip) {
        tracing::warn!(ip = %ip, ?guarded, "Rate limit exceeded");
        return ApiError::too_many_requests("Too many attempts. Please try again later.")
            .into_response();
    }

    next.run(req).await
}
