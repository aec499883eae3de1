// SPDX-License-Identifier: Apache-2.0

//! Per-route request metrics rendered as Prometheus text, plus the token
//! bucket backing the per-IP rate limiter.

use crate::config::RateLimitConfig;
use crate::AppState;
use axum::http::StatusCode;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

pub const METRIC_SUBSYSTEM: &str = "tutorhub";
pub const METRIC_VERSION: &str = env!("CARGO_PKG_VERSION");

const LATENCY_BOUNDS_SECONDS: [f64; 8] = [0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.5];

#[derive(Default)]
pub(crate) struct RequestMetrics {
    counts: Mutex<HashMap<(String, u16), u64>>,
    latency_ns: Mutex<HashMap<String, Vec<u64>>>,
}

impl RequestMetrics {
    pub(crate) async fn observe_request(&self, route: &str, status: StatusCode, latency: Duration) {
        let mut counts = self.counts.lock().await;
        *counts
            .entry((route.to_string(), status.as_u16()))
            .or_insert(0) += 1;
        drop(counts);
        let mut latency_map = self.latency_ns.lock().await;
        latency_map
            .entry(route.to_string())
            .or_default()
            .push(latency.as_nanos() as u64);
    }

    pub(crate) async fn render_prometheus(&self) -> String {
        let mut body = String::new();
        body.push_str(&format!(
            "# HELP {METRIC_SUBSYSTEM}_build_info build identity\n\
             # TYPE {METRIC_SUBSYSTEM}_build_info gauge\n\
             {METRIC_SUBSYSTEM}_build_info{{version=\"{METRIC_VERSION}\"}} 1\n"
        ));

        body.push_str(&format!(
            "# HELP {METRIC_SUBSYSTEM}_http_requests_total requests by route and status\n\
             # TYPE {METRIC_SUBSYSTEM}_http_requests_total counter\n"
        ));
        let counts = self.counts.lock().await;
        let mut rows: Vec<((String, u16), u64)> =
            counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
        drop(counts);
        rows.sort();
        for ((route, status), count) in rows {
            body.push_str(&format!(
                "{METRIC_SUBSYSTEM}_http_requests_total{{route=\"{route}\",status=\"{status}\"}} {count}\n"
            ));
        }

        body.push_str(&format!(
            "# HELP {METRIC_SUBSYSTEM}_http_request_duration_seconds request latency\n\
             # TYPE {METRIC_SUBSYSTEM}_http_request_duration_seconds histogram\n"
        ));
        let latency = self.latency_ns.lock().await;
        let mut routes: Vec<&String> = latency.keys().collect();
        routes.sort();
        for route in routes {
            let samples = &latency[route];
            push_histogram_from_samples(
                &mut body,
                &format!("{METRIC_SUBSYSTEM}_http_request_duration_seconds"),
                &format!("route=\"{route}\""),
                samples,
                &LATENCY_BOUNDS_SECONDS,
            );
        }
        body
    }
}

fn push_histogram_from_samples(
    body: &mut String,
    metric_name: &str,
    base_labels: &str,
    samples_ns: &[u64],
    bounds_seconds: &[f64],
) {
    let mut count_le = vec![0_u64; bounds_seconds.len()];
    let mut sum_seconds = 0.0_f64;
    for sample in samples_ns {
        let seconds = *sample as f64 / 1_000_000_000.0;
        sum_seconds += seconds;
        for (i, bound) in bounds_seconds.iter().enumerate() {
            if seconds <= *bound {
                count_le[i] += 1;
            }
        }
    }
    for (i, bound) in bounds_seconds.iter().enumerate() {
        body.push_str(&format!(
            "{metric_name}_bucket{{{base_labels},le=\"{bound}\"}} {}\n",
            count_le[i]
        ));
    }
    body.push_str(&format!(
        "{metric_name}_bucket{{{base_labels},le=\"+Inf\"}} {}\n",
        samples_ns.len()
    ));
    body.push_str(&format!(
        "{metric_name}_sum{{{base_labels}}} {sum_seconds:.9}\n"
    ));
    body.push_str(&format!(
        "{metric_name}_count{{{base_labels}}} {}\n",
        samples_ns.len()
    ));
}

pub(crate) fn make_request_id(state: &AppState) -> String {
    let id = state.request_id_seed.fetch_add(1, Ordering::Relaxed);
    format!("req-{id:016x}")
}

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Keys come from the client-controlled `x-forwarded-for` header, so the
/// map is capped; past the cap the longest-idle bucket is evicted.
const MAX_TRACKED_KEYS: usize = 4096;

#[derive(Default)]
pub(crate) struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    pub(crate) async fn allow(&self, key: &str, cfg: &RateLimitConfig) -> bool {
        let now = Instant::now();
        let mut lock = self.buckets.lock().await;
        if lock.len() >= MAX_TRACKED_KEYS && !lock.contains_key(key) {
            let stalest = lock
                .iter()
                .min_by_key(|(_, bucket)| bucket.last_refill)
                .map(|(key, _)| key.clone());
            if let Some(stalest) = stalest {
                lock.remove(&stalest);
            }
        }
        let bucket = lock.entry(key.to_string()).or_insert_with(|| Bucket {
            tokens: cfg.capacity,
            last_refill: now,
        });
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.last_refill = now;
        bucket.tokens = (bucket.tokens + (elapsed * cfg.refill_per_sec)).min(cfg.capacity);
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bucket_drains_and_refuses() {
        let limiter = RateLimiter::default();
        let cfg = RateLimitConfig {
            capacity: 2.0,
            refill_per_sec: 0.0,
        };
        assert!(limiter.allow("ip", &cfg).await);
        assert!(limiter.allow("ip", &cfg).await);
        assert!(!limiter.allow("ip", &cfg).await);
        // a different key has its own bucket
        assert!(limiter.allow("other", &cfg).await);
    }

    #[tokio::test]
    async fn spoofed_keys_cannot_grow_the_bucket_map_unbounded() {
        let limiter = RateLimiter::default();
        let cfg = RateLimitConfig {
            capacity: 1.0,
            refill_per_sec: 0.0,
        };
        for i in 0..(MAX_TRACKED_KEYS + 16) {
            limiter.allow(&format!("spoofed-{i}"), &cfg).await;
        }
        assert!(limiter.buckets.lock().await.len() <= MAX_TRACKED_KEYS);
        // known keys still rate-limit after churn
        assert!(limiter.allow("steady", &cfg).await);
        assert!(!limiter.allow("steady", &cfg).await);
    }

    #[tokio::test]
    async fn histogram_renders_counts() {
        let metrics = RequestMetrics::default();
        metrics
            .observe_request("/v1/sessions", StatusCode::OK, Duration::from_millis(2))
            .await;
        metrics
            .observe_request("/v1/sessions", StatusCode::CONFLICT, Duration::from_millis(1))
            .await;
        let body = metrics.render_prometheus().await;
        assert!(body.contains(
            "tutorhub_http_requests_total{route=\"/v1/sessions\",status=\"200\"} 1"
        ));
        assert!(body.contains(
            "tutorhub_http_requests_total{route=\"/v1/sessions\",status=\"409\"} 1"
        ));
        assert!(body.contains("le=\"+Inf\"} 2"));
    }
}
