// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitConfig {
    pub capacity: f64,
    pub refill_per_sec: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 50.0,
            refill_per_sec: 25.0,
        }
    }
}

/// Runtime knobs, populated from `TUTORHUB_*` env vars in `main`.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub max_body_bytes: usize,
    pub db_max_connections: u32,
    pub rate_limit_enabled: bool,
    pub rate_limit_per_ip: RateLimitConfig,
    pub shutdown_drain: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 64 * 1024,
            db_max_connections: 8,
            rate_limit_enabled: false,
            rate_limit_per_ip: RateLimitConfig::default(),
            shutdown_drain: Duration::from_millis(5000),
        }
    }
}
