//! Per-client request quota with a fixed reset window
//!
//! Every client key (the peer IP address) gets `quota` requests per window.
//! The window starts on the first request from that key and resets once
//! `window_secs` have elapsed. Admitted responses carry
//! `X-RateLimit-Limit`, `X-RateLimit-Remaining` and `X-RateLimit-Reset`;
//! rejected requests get `429 Too Many Requests` with `Retry-After`.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use axum::{middleware::from_fn_with_state, Router};
//! use libris_server::config::RateLimitConfig;
//! use libris_server::middleware::rate_limit::{rate_limit, SlidingWindowRateLimiter};
//!
//! let limiter = Arc::new(SlidingWindowRateLimiter::new(RateLimitConfig::default()));
//! let app = Router::new()
//!     .nest("/publishing-houses", routes)
//!     .route_layer(from_fn_with_state(limiter, rate_limit));
//! ```

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::response::ErrorResponse;
use crate::config::RateLimitConfig;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Key used when the peer address is not available
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Table size below which expired entries are never swept.
const MIN_PRUNE_THRESHOLD: usize = 1024;

/// Outcome of a single [`SlidingWindowRateLimiter::check`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admit {
        limit: u32,
        /// Requests left in the current window after this one
        remaining: u32,
        /// Epoch seconds at which the window resets
        reset_at: i64,
    },
    Reject {
        limit: u32,
        reset_at: i64,
        /// Seconds until the window resets, never negative
        retry_after: u64,
    },
}

impl Decision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Decision::Admit { .. })
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    remaining: u32,
    window_reset_at: i64,
}

#[derive(Debug)]
struct Table {
    entries: HashMap<String, Entry>,
    prune_threshold: usize,
}

/// In-memory rate limiter keyed by client identifier
///
/// One mutex guards the whole table, so the check and the decrement for a key
/// happen atomically. The lock is never held across an `.await`.
#[derive(Debug)]
pub struct SlidingWindowRateLimiter {
    config: RateLimitConfig,
    table: Mutex<Table>,
}

impl SlidingWindowRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            table: Mutex::new(Table {
                entries: HashMap::new(),
                prune_threshold: MIN_PRUNE_THRESHOLD,
            }),
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Admit or reject one request from `key` at epoch second `now`
    pub fn check(&self, key: &str, now: i64) -> Decision {
        let limit = self.config.quota;
        let window = i64::try_from(self.config.window_secs).unwrap_or(i64::MAX);
        let fresh = Entry {
            remaining: limit,
            window_reset_at: now.saturating_add(window),
        };

        let mut table = self.lock();

        if !table.entries.contains_key(key) {
            table.maybe_prune(now);
        }

        let entry = table.entries.entry(key.to_string()).or_insert(fresh);
        if now >= entry.window_reset_at {
            *entry = fresh;
        }

        if entry.remaining == 0 {
            let retry_after = entry.window_reset_at.saturating_sub(now).max(0) as u64;
            return Decision::Reject {
                limit,
                reset_at: entry.window_reset_at,
                retry_after,
            };
        }

        entry.remaining -= 1;
        Decision::Admit {
            limit,
            remaining: entry.remaining,
            reset_at: entry.window_reset_at,
        }
    }

    /// [`check`](Self::check) against the wall clock
    pub fn check_now(&self, key: &str) -> Decision {
        self.check(key, chrono::Utc::now().timestamp())
    }

    /// Number of keys currently tracked
    pub fn tracked_keys(&self) -> usize {
        self.lock().entries.len()
    }

    /// Drop every entry whose window has expired
    pub fn prune_expired(&self, now: i64) -> usize {
        let mut table = self.lock();
        table.prune(now)
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Table {
    /// Sweep once the table has doubled since the last sweep
    fn maybe_prune(&mut self, now: i64) {
        if self.entries.len() >= self.prune_threshold {
            let kept = self.prune(now);
            self.prune_threshold = (kept * 2).max(MIN_PRUNE_THRESHOLD);
            tracing::debug!(kept, threshold = self.prune_threshold, "Pruned rate limit table");
        }
    }

    fn prune(&mut self, now: i64) -> usize {
        self.entries.retain(|_, entry| entry.window_reset_at > now);
        self.entries.len()
    }
}

/// Axum middleware applying the limiter to every request it wraps
///
/// Use with [`axum::middleware::from_fn_with_state`]. The client key is the
/// peer IP from [`ConnectInfo`]; requests without one share
/// [`UNKNOWN_CLIENT`].
pub async fn rate_limit(
    State(limiter): State<Arc<SlidingWindowRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);
    let decision = limiter.check_now(&key);

    match decision {
        Decision::Admit {
            limit,
            remaining,
            reset_at,
        } => {
            let mut response = next.run(request).await;
            set_limit_headers(response.headers_mut(), limit, remaining, reset_at);
            response
        },
        Decision::Reject {
            limit,
            reset_at,
            retry_after,
        } => {
            tracing::warn!(client = %key, retry_after, "Rate limit exceeded");
            rejection(limit, reset_at, retry_after)
        },
    }
}

fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn set_limit_headers(headers: &mut HeaderMap, limit: u32, remaining: u32, reset_at: i64) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(reset_at));
}

fn rejection(limit: u32, reset_at: i64, retry_after: u64) -> Response {
    let body = ErrorResponse::new(
        "RATE_LIMITED",
        format!("Too many requests, retry in {retry_after} seconds"),
    );

    let mut response = (StatusCode::TOO_MANY_REQUESTS, axum::Json(body)).into_response();
    let headers = response.headers_mut();
    set_limit_headers(headers, limit, 0, reset_at);
    headers.insert(axum::http::header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    const NOW: i64 = 1_700_000_000;

    fn limiter(quota: u32, window_secs: u64) -> SlidingWindowRateLimiter {
        SlidingWindowRateLimiter::new(RateLimitConfig { quota, window_secs })
    }

    #[test]
    fn test_quota_counts_down_then_rejects() {
        let limiter = limiter(3, 60);

        let remaining: Vec<u32> = (0..3)
            .map(|_| match limiter.check("10.0.0.1", NOW) {
                Decision::Admit { remaining, .. } => remaining,
                other => panic!("expected admit, got {other:?}"),
            })
            .collect();
        assert_eq!(remaining, vec![2, 1, 0]);

        match limiter.check("10.0.0.1", NOW + 1) {
            Decision::Reject { retry_after, reset_at, .. } => {
                assert_eq!(reset_at, NOW + 60);
                assert_eq!(retry_after, 59);
            },
            other => panic!("expected reject, got {other:?}"),
        }
    }

    #[test]
    fn test_reset_timestamp_is_fixed_for_the_window() {
        let limiter = limiter(5, 60);

        let first = limiter.check("client", NOW);
        let later = limiter.check("client", NOW + 30);

        assert!(matches!(first, Decision::Admit { reset_at, .. } if reset_at == NOW + 60));
        assert!(matches!(later, Decision::Admit { reset_at, .. } if reset_at == NOW + 60));
    }

    #[test]
    fn test_expired_window_resets_quota() {
        let limiter = limiter(2, 60);
        limiter.check("client", NOW);
        limiter.check("client", NOW);
        assert!(!limiter.check("client", NOW + 10).is_admitted());

        // Windows refill once they pass. A limiter that only counts down per
        // key would reject this client forever; that behaviour is a bug, not a
        // policy, and this test guards against it.
        match limiter.check("client", NOW + 60) {
            Decision::Admit { remaining, reset_at, .. } => {
                assert_eq!(remaining, 1);
                assert_eq!(reset_at, NOW + 120);
            },
            other => panic!("expected admit, got {other:?}"),
        }
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = limiter(1, 60);

        assert!(limiter.check("a", NOW).is_admitted());
        assert!(!limiter.check("a", NOW).is_admitted());
        assert!(limiter.check("b", NOW).is_admitted());
    }

    #[test]
    fn test_rejection_does_not_consume_or_extend() {
        let limiter = limiter(1, 60);
        limiter.check("a", NOW);

        for offset in 1..5 {
            match limiter.check("a", NOW + offset) {
                Decision::Reject { reset_at, retry_after, .. } => {
                    assert_eq!(reset_at, NOW + 60);
                    assert_eq!(retry_after, (60 - offset) as u64);
                },
                other => panic!("expected reject, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_zero_quota_rejects_everything() {
        let limiter = limiter(0, 60);
        match limiter.check("a", NOW) {
            Decision::Reject { retry_after, .. } => assert_eq!(retry_after, 60),
            other => panic!("expected reject, got {other:?}"),
        }
    }

    #[test]
    fn test_prune_drops_only_expired_entries() {
        let limiter = limiter(5, 60);
        limiter.check("old", NOW);
        limiter.check("new", NOW + 50);

        assert_eq!(limiter.prune_expired(NOW + 60), 1);
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[test]
    fn test_table_is_swept_when_it_doubles() {
        let limiter = limiter(5, 10);
        for i in 0..MIN_PRUNE_THRESHOLD {
            limiter.check(&format!("client-{i}"), NOW);
        }
        assert_eq!(limiter.tracked_keys(), MIN_PRUNE_THRESHOLD);

        // Every earlier window has expired by now; the next new key sweeps them.
        limiter.check("late-client", NOW + 10);
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[test]
    fn test_concurrent_checks_admit_exactly_quota() {
        const QUOTA: u32 = 8;
        const EXTRA: usize = 24;
        let limiter = Arc::new(limiter(QUOTA, 60));
        let threads = QUOTA as usize + EXTRA;
        let barrier = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    limiter.check("shared", NOW).is_admitted()
                })
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|admitted| *admitted)
            .count();

        assert_eq!(admitted, QUOTA as usize);
    }
}
