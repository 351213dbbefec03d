//! HTTP module
//!
//! The page fetcher: one rate-limited, time-bounded GET per call.
//!
//! # Features
//!
//! - **Single attempt**: retries belong to the pagination driver, not here
//! - **Status passthrough**: non-2xx responses come back as data, not errors
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Pluggable**: the driver talks to the `PageSource` trait

mod client;
mod rate_limit;

pub use client::{FetchedPage, HttpClient, HttpClientConfig, HttpClientConfigBuilder, PageSource};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
