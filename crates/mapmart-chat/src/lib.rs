//! Real-time chat room
//!
//! A single shared room. Authenticated users post messages over the
//! `/ws/chat` WebSocket; anyone connected receives them. Messages are kept
//! for a limited time and served by the history endpoint.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod handler;
mod prelude;
pub mod service;
pub mod websocket;

pub use service::spawn_retention_task;

// vim: ts=4
