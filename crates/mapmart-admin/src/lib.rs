//! Admin API handlers: IP and user moderation, dashboard statistics

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod ip;
pub mod perm;
pub mod user;

mod prelude;

// vim: ts=4
