//! Authentication subsystem.
//!
//! Local accounts are checked against bcrypt hashes. Google accounts sign in
//! with an ID token and are linked to a local account by email. Either way a
//! successful login installs a signed session cookie.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod account;
pub mod google;
pub mod handler;
pub mod password;
pub mod reset;

mod prelude;

pub use password::{check_password, hash_password};

// vim: ts=4
