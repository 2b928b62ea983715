//! IP reputation: a per-address suspicious-request counter feeding a block
//! list, consulted once per inbound HTTP request before any other handling.

pub mod middleware;
pub mod tracker;

pub use middleware::IpReputationLayer;
pub use tracker::{
	IpReputationTracker, ReputationConfig, ReputationDecision, ReputationSnapshot,
	SuspiciousInfo,
};

// vim: ts=4
