//! Light mirror proofs
//!
//! A light mirror binds a block header to its coinbase transaction through a pruned
//! Merkle branch, so a light client can check the coinbase without the block body.
//! The coinbase may also carry a tagged commitment (two addresses and an auxiliary
//! hash) that ties the block to a claim on another chain.
//!
//! The crate is split along the lifecycle of a proof:
//! - [`merkle`] builds the authentication path and folds it back into a root
//! - [`codec`] moves a proof to and from its binary wire format
//! - [`verify`] checks the folded root against the header
//! - [`commitment`] extracts the embedded commitment from coinbase outputs
//!
//! Header and transaction handling is delegated to a [`Chain`]; [`Bitcoin`] is the
//! binding used in production.

pub mod chain;
pub mod codec;
pub mod commitment;
pub mod error;
pub mod merkle;
pub mod proof;
pub mod verify;

pub use alloy_primitives::{Address, B256};
pub use chain::{Bitcoin, Chain};
pub use codec::{CodecConfig, MAX_TX_PER_BLOCK};
pub use commitment::{Commitment, COMMITMENT_MAGIC};
pub use error::{BuildError, DecodeError, VerifyError};
pub use merkle::compute_exponent;
pub use proof::LightMirror;
