//! Error kinds for proof construction, decoding and verification.

use alloy_primitives::B256;
use bitcoin::consensus::encode;
use thiserror::Error;

/// Failure to read a proof from a byte stream
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Declared transaction count is above the configured per-block cap
    #[error("too many transactions to fit into a block [count {count}, max {max}]")]
    TooManyTransactions { count: u64, max: u64 },
    /// Declared transaction count is zero
    #[error("proof declares zero transactions")]
    ZeroTransactions,
    /// Stream ended before the proof was complete
    #[error("truncated stream")]
    Truncated,
    /// Bytes left over after a complete proof
    #[error("{0} trailing bytes after proof")]
    TrailingBytes(usize),
    /// Malformed header, transaction or transaction count
    #[error("failed to decode consensus data: {0}")]
    Consensus(encode::Error),
    /// Underlying stream failure
    #[error("I/O error: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for DecodeError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            DecodeError::Truncated
        } else {
            DecodeError::Io(err)
        }
    }
}

impl From<encode::Error> for DecodeError {
    fn from(err: encode::Error) -> Self {
        match err {
            encode::Error::Io(io_err) => std::io::Error::from(io_err).into(),
            other => DecodeError::Consensus(other),
        }
    }
}

/// Failure to verify a decoded proof
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// Both roots are printed in display (reversed) byte order
    #[error(
        "block merkle root is invalid - block header indicates {}, but calculated value is {}",
        display_order(.expected),
        display_order(.computed)
    )]
    MerkleRootMismatch { expected: B256, computed: B256 },
}

/// Hex of a hash in the reversed byte order used by block explorers
fn display_order(hash: &B256) -> String {
    let mut bytes = hash.0;
    bytes.reverse();
    hex::encode(bytes)
}

/// Failure to assemble a proof from its parts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Block has no transactions, hence no coinbase
    #[error("block has no transactions")]
    EmptyBlock,
    #[error("transaction count must be at least 1")]
    ZeroTransactions,
    #[error("too many transactions to fit into a block [count {count}, max {max}]")]
    TooManyTransactions { count: u64, max: u64 },
    /// Authentication path does not match the transaction count
    #[error("authentication path must have {expected} nodes, got {actual}")]
    InvalidPathLength { expected: usize, actual: usize },
}
