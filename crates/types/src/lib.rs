//! Core types for the snowfall consensus engine.
//!
//! This crate provides the foundational types used throughout the engine:
//!
//! - **Identifiers**: [`BlockId`], [`PeerId`]
//! - **Voting**: [`Vote`] (the wire-level poll result), [`Status`]
//! - **Validators**: [`ValidatorInfo`], [`ValidatorSet`] with stake-weighted
//!   sampling
//!
//! # Design Philosophy
//!
//! This crate is self-contained and does not depend on any other workspace
//! crates, making it the foundation layer. It performs no I/O.

mod block_id;
mod peer;
mod status;
mod validator;
mod vote;

pub use block_id::{BlockId, BlockIdError};
pub use peer::PeerId;
pub use status::Status;
pub use validator::{ValidatorInfo, ValidatorSet};
pub use vote::Vote;
