//! Core infrastructure for MapMart.
//!
//! Holds the abuse-control subsystem (IP reputation, per-route rate limits,
//! the chat send limiter and chat room state) together with the shared app
//! state, session tokens and request extractors used by the feature crates.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod app;
pub mod chat_limit;
pub mod chat_room;
pub mod extract;
pub mod id_token;
pub mod ip_reputation;
pub mod middleware;
pub mod prelude;
pub mod rate_limit;
pub mod session;

pub use app::{App, AppOpts, AppState, ServerMode};
pub use extract::{Auth, OptionalAuth};
pub use session::SessionCtx;

// vim: ts=4
