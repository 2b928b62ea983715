//! MapMart is a marketplace backend for digital maps.
//!
//! # Features
//!
//! - Local and Google accounts with signed session cookies
//! - Map catalog with comments and ratings
//! - Profile pictures, resized on upload
//! - Shared real-time chat room with history
//! - Abuse control
//!     - IP reputation: flooding clients get blocked
//!     - per-route fixed-window rate limits
//!     - per-user chat flood control
//!     - admin moderation endpoints
//! - Administration of maps, comments and users

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

// Re-export shared types and the adapter trait from mapmart-types
pub use mapmart_types::error;
pub use mapmart_types::meta_adapter;
pub use mapmart_types::types;
pub use mapmart_types::utils;
pub use mapmart_types::worker;

// Feature crate re-exports
pub use mapmart_admin as admin;
pub use mapmart_auth as auth;
pub use mapmart_catalog as catalog;
pub use mapmart_chat as chat;
pub use mapmart_file as file;
pub use mapmart_profile as profile;
pub use mapmart_core::{chat_limit, chat_room, id_token, ip_reputation, rate_limit};

// Local modules
pub mod app;
pub mod bootstrap;
pub mod health;
pub mod prelude;
pub mod routes;
pub mod webserver;

pub use crate::app::{App, AppBuilder, ServerMode};

// vim: ts=4
