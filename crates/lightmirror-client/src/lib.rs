//! Light mirror client library
//!
//! Fetches blocks from a Bitcoin node, turns them into light mirror proofs and
//! stores, verifies and displays those proofs.

pub mod fetch;
pub mod format;
pub mod inspect;
pub mod verify;

pub use fetch::{
    fetch_light_mirror, load_light_mirror, save_light_mirror, BlockRef, BlockSource,
};
