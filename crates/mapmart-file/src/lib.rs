//! File subsystem. Upload forms, image processing, upload storage.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod form;
pub mod image;
pub mod store;

mod prelude;

// vim: ts=4
