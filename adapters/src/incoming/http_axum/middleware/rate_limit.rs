use axum::{
    extract::{ConnectInfo, Request},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{CONTENT_TYPE, RETRY_AFTER},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};
use tokio::time::{MissedTickBehavior, interval};

use credit_ledger_application::infrastructure_config::RateLimitConfig;

const WINDOW: Duration = Duration::from_secs(60);

fn header_value(value: u64) -> HeaderValue {
    HeaderValue::from_str(&value.to_string()).unwrap_or(HeaderValue::from_static("0"))
}

#[derive(Debug, Clone)]
pub struct RateLimitEntry {
    pub requests: u32,
    pub window_start: Instant,
}

#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    pub limit: u32,
    pub remaining: u32,
    pub reset_time: Instant,
    pub retry_after_seconds: Option<u64>,
}

impl RateLimitInfo {
    pub fn to_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert("RateLimit-Limit", header_value(u64::from(self.limit)));
        headers.insert("RateLimit-Remaining", header_value(u64::from(self.remaining)));

        let time_until_reset = self.reset_time.saturating_duration_since(Instant::now());
        let reset_timestamp = (SystemTime::now() + time_until_reset)
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_secs();
        headers.insert("RateLimit-Reset", header_value(reset_timestamp));

        if let Some(retry_after) = self.retry_after_seconds {
            headers.insert(RETRY_AFTER, header_value(retry_after));
        }

        headers
    }
}

#[derive(Debug)]
pub enum RateLimitResult {
    Allowed(RateLimitInfo),
    Denied(RateLimitInfo),
}

/// Fixed one-minute window per client IP.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    pub store: Arc<DashMap<IpAddr, RateLimitEntry>>,
    pub burst_size: u32,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32, burst_size_multiplier: u32) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            burst_size: requests_per_minute
                .saturating_mul(burst_size_multiplier)
                .max(1),
        }
    }

    /// Spawns the task that evicts idle windows. Requires a Tokio runtime.
    pub fn spawn_cleanup(&self) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let mut cleanup_interval = interval(WINDOW);
            cleanup_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                cleanup_interval.tick().await;
                let now = Instant::now();
                store.retain(|_, entry: &mut RateLimitEntry| {
                    now.duration_since(entry.window_start) < WINDOW
                });
            }
        });
    }

    pub fn check_rate_limit(&self, ip: IpAddr) -> RateLimitResult {
        self.check_rate_limit_at(ip, Instant::now())
    }

    pub fn check_rate_limit_at(&self, ip: IpAddr, now: Instant) -> RateLimitResult {
        let mut entry = self.store.entry(ip).or_insert_with(|| RateLimitEntry {
            requests: 0,
            window_start: now,
        });

        if now.saturating_duration_since(entry.window_start) >= WINDOW {
            entry.window_start = now;
            entry.requests = 0;
        }

        let reset_time = entry.window_start + WINDOW;

        if entry.requests < self.burst_size {
            entry.requests += 1;
            RateLimitResult::Allowed(RateLimitInfo {
                limit: self.burst_size,
                remaining: self.burst_size - entry.requests,
                reset_time,
                retry_after_seconds: None,
            })
        } else {
            RateLimitResult::Denied(RateLimitInfo {
                limit: self.burst_size,
                remaining: 0,
                reset_time,
                retry_after_seconds: Some(reset_time.saturating_duration_since(now).as_secs()),
            })
        }
    }
}

fn merge_headers_safe(target: &mut HeaderMap, source: &HeaderMap) {
    for (key, value) in source {
        if !target.contains_key(key) {
            target.insert(key, value.clone());
        }
    }
}

/// Peer address from the connection; requests without one share a single bucket.
fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |ConnectInfo(addr)| {
            addr.ip()
        })
}

pub async fn rate_limit_middleware(
    rate_limiter: Arc<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request);

    match rate_limiter.check_rate_limit(ip) {
        RateLimitResult::Allowed(rate_info) => {
            let mut response = next.run(request).await;
            merge_headers_safe(response.headers_mut(), &rate_info.to_headers());
            response
        }
        RateLimitResult::Denied(rate_info) => {
            tracing::warn!(
                client_ip = %ip,
                method = %request.method(),
                path = %request.uri().path(),
                "Rate limit exceeded"
            );

            let mut headers = rate_info.to_headers();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

            (StatusCode::TOO_MANY_REQUESTS, headers, "Rate limit exceeded").into_response()
        }
    }
}

fn spawn_limiter(requests_per_minute: u32, config: &RateLimitConfig) -> Arc<RateLimiter> {
    let limiter = RateLimiter::new(requests_per_minute, config.burst_size_multiplier);
    limiter.spawn_cleanup();
    Arc::new(limiter)
}

pub fn create_client_rate_limiter(config: &RateLimitConfig) -> Arc<RateLimiter> {
    spawn_limiter(config.client_requests_per_minute, config)
}

pub fn create_generation_rate_limiter(config: &RateLimitConfig) -> Arc<RateLimiter> {
    spawn_limiter(config.generation_requests_per_minute, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denies_after_burst_and_recovers_next_window() {
        let limiter = RateLimiter::new(2, 1);
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let start = Instant::now();

        assert!(matches!(
            limiter.check_rate_limit_at(ip, start),
            RateLimitResult::Allowed(RateLimitInfo { remaining: 1, .. })
        ));
        assert!(matches!(
            limiter.check_rate_limit_at(ip, start),
            RateLimitResult::Allowed(RateLimitInfo { remaining: 0, .. })
        ));
        assert!(matches!(
            limiter.check_rate_limit_at(ip, start),
            RateLimitResult::Denied(_)
        ));
        assert!(matches!(
            limiter.check_rate_limit_at(ip, start + WINDOW),
            RateLimitResult::Allowed(_)
        ));
    }

    #[test]
    fn buckets_are_per_ip() {
        let limiter = RateLimiter::new(1, 1);
        let start = Instant::now();

        limiter.check_rate_limit_at(IpAddr::V4(Ipv4Addr::LOCALHOST), start);
        assert!(matches!(
            limiter.check_rate_limit_at(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)), start),
            RateLimitResult::Allowed(_)
        ));
    }
}
