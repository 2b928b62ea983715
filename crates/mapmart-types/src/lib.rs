//! Shared types, the store adapter trait, and core utilities for MapMart.
//!
//! This crate holds the foundational types shared between the server crates
//! and the store adapter implementations, so adapters can compile in parallel
//! with the feature crates.

pub mod error;
pub mod meta_adapter;
pub mod prelude;
pub mod types;
pub mod utils;
pub mod worker;

// vim: ts=4
