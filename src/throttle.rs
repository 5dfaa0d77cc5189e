// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-IP request throttling for the identity endpoints.
//!
//! Allows at most `THROTTLE_LIMIT` requests in any `THROTTLE_TTL` second
//! window per client IP. Once the burst is spent, one request is restored
//! per window.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter,
};
use tracing::warn;

use crate::config::ThrottleSettings;
use crate::error::ApiError;

/// Keyed limiter shared by every request on the throttled routes.
pub struct Throttle {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
    clock: DefaultClock,
}

impl Throttle {
    pub fn new(settings: &ThrottleSettings) -> Self {
        let limit = NonZeroU32::new(settings.limit).unwrap_or(NonZeroU32::MIN);
        let window = Duration::from_secs(settings.ttl_secs.max(1));

        // GCRA admits `burst + elapsed / period` cells, so a full-window period
        // caps any window at `limit`.
        let quota = Quota::with_period(window)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(limit);

        Self {
            limiter: RateLimiter::keyed(quota),
            clock: DefaultClock::default(),
        }
    }

    /// `Err(wait)` when `ip` is over its quota.
    pub fn check(&self, ip: IpAddr) -> Result<(), Duration> {
        self.limiter
            .check_key(&ip)
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }

    /// Drop state for keys that are back to a full quota.
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
    }
}

fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Middleware rejecting over-quota clients with `429`.
pub async fn throttle(
    State(throttle): State<Arc<Throttle>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request);
    match throttle.check(ip) {
        Ok(()) => next.run(request).await,
        Err(wait) => {
            warn!(client_ip = %ip, path = %request.uri().path(), "Request throttled");
            let retry_after = wait.as_secs().max(1);
            let mut response =
                ApiError::new(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests").into_response();
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::post, Router};
    use tower::ServiceExt;

    fn settings(ttl_secs: u64, limit: u32) -> ThrottleSettings {
        ThrottleSettings { ttl_secs, limit }
    }

    #[test]
    fn allows_limit_then_rejects() {
        let throttle = Throttle::new(&settings(60, 2));
        let ip: IpAddr = "10.0.0.1".parse().unwrap();

        assert!(throttle.check(ip).is_ok());
        assert!(throttle.check(ip).is_ok());
        let wait = throttle.check(ip).unwrap_err();
        assert!(wait > Duration::from_secs(59));
        assert!(wait <= Duration::from_secs(60));
    }

    #[test]
    fn window_never_admits_more_than_limit() {
        let throttle = Throttle::new(&settings(1, 2));
        let ip: IpAddr = "10.0.0.3".parse().unwrap();

        assert!(throttle.check(ip).is_ok());
        assert!(throttle.check(ip).is_ok());
        assert!(throttle.check(ip).is_err());

        // Past `ttl / limit` but still inside the window.
        std::thread::sleep(Duration::from_millis(600));
        assert!(throttle.check(ip).is_err());
    }

    #[test]
    fn clients_are_tracked_independently() {
        let throttle = Throttle::new(&settings(60, 1));
        let first: IpAddr = "10.0.0.1".parse().unwrap();
        let second: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(throttle.check(first).is_ok());
        assert!(throttle.check(first).is_err());
        assert!(throttle.check(second).is_ok());
        throttle.retain_recent();
    }

    #[tokio::test]
    async fn middleware_returns_429_over_limit() {
        let throttle = Arc::new(Throttle::new(&settings(60, 1)));
        let app = Router::new()
            .route("/authenticate", post(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(throttle, super::throttle));

        let request = || {
            Request::builder()
                .method("POST")
                .uri("/authenticate")
                .body(Body::empty())
                .unwrap()
        };

        let first = app.clone().oneshot(request()).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app.oneshot(request()).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().contains_key(RETRY_AFTER));
    }
}
