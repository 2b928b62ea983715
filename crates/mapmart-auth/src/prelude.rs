pub use mapmart_core::prelude::*;

// vim: ts=4
