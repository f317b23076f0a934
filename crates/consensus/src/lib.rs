//! Per-candidate consensus state machines.
//!
//! This crate provides the deterministic core of the avalanche voting
//! engine:
//!
//! - [`VoteRecord`]: one candidate's sliding vote window, confidence counter,
//!   and terminal transition
//! - [`RequestRecord`]: one outstanding query's inventory and expiry
//! - [`ConsensusConfig`]: all engine tunables
//!
//! Everything here is synchronous and performs no I/O. Time is an injected
//! [`Duration`](std::time::Duration) since engine start, so the same code
//! drives production and simulation.

mod config;
mod request_record;
mod vote_record;

pub use config::{
    ConsensusConfig, AVALANCHE_FINALIZATION_SCORE, AVALANCHE_MAX_ELEMENT_POLL,
    AVALANCHE_MAX_INFLIGHT_POLL, AVALANCHE_REQUEST_TIMEOUT, AVALANCHE_TIME_STEP,
    DELETE_INVENTORY_AFTER,
};
pub use request_record::{QueryKey, RequestRecord};
pub use vote_record::VoteRecord;
