//! Per-route fixed-window rate limiting.
//!
//! Every route carries a scope name. Each (scope, client address, window
//! granularity) triple owns one counter. Windows are aligned to the clock:
//! a minute window always starts at second zero, an hour window at minute
//! zero, a day window at midnight UTC.

pub mod config;
pub mod error;
pub mod extractors;
pub mod limiter;
pub mod middleware;

pub use config::{scope, RateLimitConfig, RouteLimits, WindowGranularity, WindowLimit};
pub use error::RateLimitError;
pub use extractors::extract_client_ip;
pub use limiter::{RateLimitStatus, RateLimiter};
pub use middleware::RateLimitLayer;

// vim: ts=4
