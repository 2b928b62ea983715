//! Profile subsystem: own profile data and the profile picture.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod handler;
pub mod picture;

mod prelude;

// vim: ts=4
