//! Per-IP sliding-window rate limiter middleware.
//!
//! Each limiter remembers the request instants of every client IP inside
//! its window. A request is allowed while fewer than `max` instants remain.
//! A periodic [`RateLimiter::cleanup`] drops IPs whose instants have all
//! expired.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

#[derive(Clone)]
pub struct RateLimiter {
    max: usize,
    window: Duration,
    message: Arc<str>,
    hits: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max", &self.max)
            .field("window", &self.window)
            .finish()
    }
}

impl RateLimiter {
    /// Allow `max` requests per `window` per IP; reject with `message`.
    pub fn new(max: usize, window: Duration, message: &str) -> Self {
        Self {
            max,
            window,
            message: Arc::from(message),
            hits: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Limiter for the public tool routes.
    pub fn for_tools(max: usize, window_secs: u64) -> Self {
        Self::new(
            max,
            Duration::from_secs(window_secs),
            &format!("Too many requests (max {}/minute)", max),
        )
    }

    /// Limiter for the contact form.
    pub fn for_contact(max: usize, window_secs: u64) -> Self {
        Self::new(
            max,
            Duration::from_secs(window_secs),
            "Too many messages sent. Please wait a few minutes before trying again.",
        )
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Lock the hit map, recovering it if a previous holder panicked.
    fn entries(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Instant>>> {
        self.hits.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a request from `ip` at `now`. Returns whether it is allowed.
    pub fn check_at(&self, ip: &str, now: Instant) -> bool {
        let mut hits = self.entries();
        let entry = hits.entry(ip.to_string()).or_default();
        while let Some(front) = entry.front() {
            if now.duration_since(*front) >= self.window {
                entry.pop_front();
            } else {
                break;
            }
        }
        if entry.len() >= self.max {
            return false;
        }
        entry.push_back(now);
        true
    }

    pub fn check(&self, ip: &str) -> bool {
        self.check_at(ip, Instant::now())
    }

    /// Forget IPs with no request inside the window. Returns how many were dropped.
    pub fn cleanup_at(&self, now: Instant) -> usize {
        let mut hits = self.entries();
        let before = hits.len();
        hits.retain(|_, instants| {
            instants
                .back()
                .is_some_and(|last| now.duration_since(*last) < self.window)
        });
        before - hits.len()
    }

    pub fn cleanup(&self) -> usize {
        self.cleanup_at(Instant::now())
    }

    pub fn tracked_ips(&self) -> usize {
        self.entries().len()
    }
}

/// Client IP: first `X-Forwarded-For` entry, then `X-Real-IP`, then the
/// peer address, then `"unknown"`.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(first) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first.to_string();
    }
    if let Some(real) = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return real.to_string();
    }
    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Client IP of an incoming request.
pub fn request_ip(req: &Request) -> String {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    client_ip(req.headers(), peer)
}

/// Axum middleware that enforces the limiter in the request's extensions.
pub async fn rate_limit_middleware(
    axum::extract::Extension(limiter): axum::extract::Extension<RateLimiter>,
    req: Request,
    next: Next,
) -> Response {
    let ip = request_ip(&req);
    if limiter.check(&ip) {
        next.run(req).await
    } else {
        tracing::debug!(ip = %ip, "Rate limit exceeded");
        ApiError::TooManyRequests(limiter.message().to_string()).into_response()
    }
}
