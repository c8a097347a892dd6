//! Binary wire format of a light mirror:
//!
//! | field          | encoding                                        |
//! |----------------|-------------------------------------------------|
//! | header         | chain header encoding                           |
//! | coinbase       | chain transaction encoding                      |
//! | tx count       | Bitcoin variable-length integer (1/3/5/9 bytes) |
//! | merkle nodes   | `compute_exponent(tx count)` raw 32-byte hashes |
//!
//! The path length is never stored; it is recomputed from the transaction count.

use std::io::{self, BufRead, Read, Write};

use alloy_primitives::B256;
use bitcoin::consensus::encode::VarInt;
use bitcoin::consensus::{self, Decodable};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chain::Chain;
use crate::error::DecodeError;
use crate::merkle::compute_exponent;
use crate::proof::LightMirror;

/// Maximum number of transactions a block can carry: the 4,000,000 byte block payload
/// divided by the 10 byte minimum transaction payload, plus one.
pub const MAX_TX_PER_BLOCK: u64 = 4_000_000 / 10 + 1;

/// Limits applied while decoding untrusted proofs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Largest transaction count accepted before any path allocation
    pub max_tx_per_block: u64,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_tx_per_block: MAX_TX_PER_BLOCK,
        }
    }
}

impl<C: Chain> LightMirror<C> {
    /// Decode a proof with the default [`CodecConfig`].
    pub fn decode<R: BufRead + ?Sized>(reader: &mut R) -> Result<Self, DecodeError> {
        Self::decode_with_config(reader, &CodecConfig::default())
    }

    /// Decode a proof, rejecting transaction counts above `config.max_tx_per_block`
    /// before reading or allocating the authentication path.
    pub fn decode_with_config<R: BufRead + ?Sized>(
        reader: &mut R,
        config: &CodecConfig,
    ) -> Result<Self, DecodeError> {
        let header = C::decode_header(reader)?;
        let coinbase_tx = C::decode_transaction(reader)?;

        let VarInt(tx_count) =
            VarInt::consensus_decode(&mut bitcoin::io::FromStd::new(&mut *reader))?;
        if tx_count > config.max_tx_per_block {
            return Err(DecodeError::TooManyTransactions {
                count: tx_count,
                max: config.max_tx_per_block,
            });
        }
        if tx_count == 0 {
            return Err(DecodeError::ZeroTransactions);
        }

        let path_len = compute_exponent(tx_count);
        debug!("Decoding {} merkle nodes for {} transactions", path_len, tx_count);

        let mut merkle_nodes = Vec::with_capacity(path_len);
        for _ in 0..path_len {
            let mut node = [0u8; 32];
            reader.read_exact(&mut node)?;
            merkle_nodes.push(B256::from(node));
        }

        Ok(Self {
            header,
            coinbase_tx,
            tx_count,
            merkle_nodes,
        })
    }

    /// Write the proof in wire format. Re-encoding a decoded proof is byte-identical.
    pub fn encode<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        C::encode_header(&self.header, writer)?;
        C::encode_transaction(&self.coinbase_tx, writer)?;
        writer.write_all(&consensus::serialize(&VarInt(self.tx_count)))?;
        for node in &self.merkle_nodes {
            writer.write_all(node.as_slice())?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.encode(&mut bytes).expect("writing to a Vec never fails");
        bytes
    }

    /// Decode a proof that must span all of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::from_bytes_with_config(bytes, &CodecConfig::default())
    }

    pub fn from_bytes_with_config(
        bytes: &[u8],
        config: &CodecConfig,
    ) -> Result<Self, DecodeError> {
        let mut cursor = bytes;
        let proof = Self::decode_with_config(&mut cursor, config)?;
        if !cursor.is_empty() {
            return Err(DecodeError::TrailingBytes(cursor.len()));
        }
        Ok(proof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Bitcoin;
    use bitcoin::blockdata::constants::genesis_block;
    use bitcoin::Network;

    fn genesis_mirror() -> LightMirror<Bitcoin> {
        LightMirror::from_block(&genesis_block(Network::Bitcoin)).unwrap()
    }

    #[test]
    fn test_max_tx_per_block() {
        assert_eq!(MAX_TX_PER_BLOCK, 400_001);
    }

    #[test]
    fn test_genesis_wire_layout() {
        let genesis = genesis_block(Network::Bitcoin);
        let bytes = genesis_mirror().to_bytes();

        let header = consensus::serialize(&genesis.header);
        let coinbase = consensus::serialize(&genesis.txdata[0]);
        assert_eq!(bytes.len(), header.len() + coinbase.len() + 1);
        assert_eq!(&bytes[..80], &header[..]);
        assert_eq!(&bytes[80..80 + coinbase.len()], &coinbase[..]);
        assert_eq!(bytes.last(), Some(&0x01));
    }

    #[test]
    fn test_trailing_bytes_are_rejected() {
        let mut bytes = genesis_mirror().to_bytes();
        bytes.push(0);
        let err = LightMirror::<Bitcoin>::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::TrailingBytes(1)), "got {err:?}");
    }

    #[test]
    fn test_zero_tx_count_is_rejected() {
        let mut bytes = genesis_mirror().to_bytes();
        *bytes.last_mut().unwrap() = 0x00;
        let err = LightMirror::<Bitcoin>::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::ZeroTransactions), "got {err:?}");
    }

    #[test]
    fn test_non_minimal_tx_count_is_rejected() {
        let mut bytes = genesis_mirror().to_bytes();
        bytes.pop();
        // 1 encoded with a 3-byte prefix
        bytes.extend_from_slice(&[0xfd, 0x01, 0x00]);
        let err = LightMirror::<Bitcoin>::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::Consensus(_)), "got {err:?}");
    }
}
