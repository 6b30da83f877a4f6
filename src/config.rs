//! Environment-driven configuration
//!
//! Every tunable (upstream timeout, fan-out width, cache TTL/capacity,
//! shuffle flag) is read once at startup with a sensible default.

use std::env;
use std::str::FromStr;

use crate::constants::DEFAULT_PER_PAGE;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to
    pub port: u16,
    /// Per-request timeout for upstream page fetches (seconds)
    pub upstream_timeout_secs: u64,
    /// Number of upstream pages fetched concurrently per request
    pub fetch_pages: u32,
    /// Default per_page when the client does not send one
    pub default_per_page: u32,
    /// Freshness window for cached query results (seconds)
    pub cache_ttl_secs: u64,
    /// Maximum number of cached query entries
    pub cache_capacity: usize,
    /// Shuffle merged results so every refresh looks different
    pub shuffle_results: bool,
    /// Category used when a request carries no search term
    pub default_category: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env_parse("PORT", 8000),
            upstream_timeout_secs: env_parse("UPSTREAM_TIMEOUT_SECS", 10),
            fetch_pages: env_parse("FETCH_PAGES", 3),
            default_per_page: env_parse("DEFAULT_PER_PAGE", DEFAULT_PER_PAGE),
            cache_ttl_secs: env_parse("CACHE_TTL_SECS", 300),
            cache_capacity: env_parse("CACHE_CAPACITY", 128),
            shuffle_results: env_flag("SHUFFLE_RESULTS"),
            default_category: env::var("DEFAULT_CATEGORY").unwrap_or_else(|_| "korean".to_string()),
        }
    }
}

fn env_parse<T: FromStr + PartialOrd + Default>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|v| *v > T::default())
        .unwrap_or(default)
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|s| matches!(s.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
