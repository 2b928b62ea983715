//! Catalog subsystem: browsing, comments, admin catalog management.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod comment;
pub mod manage;
pub mod map;

mod prelude;

// vim: ts=4
