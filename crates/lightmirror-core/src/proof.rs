//! The light mirror proof structure and its construction.

use alloy_primitives::B256;
use bitcoin::Block;

use crate::chain::{Bitcoin, Chain};
use crate::codec::MAX_TX_PER_BLOCK;
use crate::error::BuildError;
use crate::merkle::{authentication_path, compute_exponent};

/// A block header, its coinbase transaction and the minimal Merkle branch linking them.
///
/// Immutable once built or decoded; all checks are read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightMirror<C: Chain = Bitcoin> {
    pub(crate) header: C::Header,
    pub(crate) coinbase_tx: C::Transaction,
    /// Number of transactions in the original block
    pub(crate) tx_count: u64,
    /// One sibling per tree level, bottom-up, `compute_exponent(tx_count)` long
    pub(crate) merkle_nodes: Vec<B256>,
}

impl<C: Chain> LightMirror<C> {
    /// Build a proof from the ordered hashes of every transaction in the block.
    ///
    /// `tx_hashes[0]` must be the hash of `coinbase_tx`; the rest follow in block order.
    ///
    /// # Panics
    ///
    /// Panics if `tx_hashes` is empty. Callers holding a block must reject a block
    /// without transactions before getting here.
    pub fn build(header: C::Header, coinbase_tx: C::Transaction, tx_hashes: &[B256]) -> Self {
        assert!(
            !tx_hashes.is_empty(),
            "light mirror requires at least the coinbase transaction hash"
        );
        Self {
            header,
            coinbase_tx,
            tx_count: tx_hashes.len() as u64,
            merkle_nodes: authentication_path::<C>(tx_hashes),
        }
    }

    /// Assemble a proof from already computed parts, checking the structural invariants.
    ///
    /// This does not check the Merkle root; use [`LightMirror::check_merkle`] for that.
    pub fn from_parts(
        header: C::Header,
        coinbase_tx: C::Transaction,
        tx_count: u64,
        merkle_nodes: Vec<B256>,
    ) -> Result<Self, BuildError> {
        if tx_count == 0 {
            return Err(BuildError::ZeroTransactions);
        }
        if tx_count > MAX_TX_PER_BLOCK {
            return Err(BuildError::TooManyTransactions {
                count: tx_count,
                max: MAX_TX_PER_BLOCK,
            });
        }
        let expected = compute_exponent(tx_count);
        if merkle_nodes.len() != expected {
            return Err(BuildError::InvalidPathLength {
                expected,
                actual: merkle_nodes.len(),
            });
        }
        Ok(Self {
            header,
            coinbase_tx,
            tx_count,
            merkle_nodes,
        })
    }

    pub fn header(&self) -> &C::Header {
        &self.header
    }

    pub fn coinbase_tx(&self) -> &C::Transaction {
        &self.coinbase_tx
    }

    /// Number of transactions in the block the proof was built from
    pub fn tx_count(&self) -> u64 {
        self.tx_count
    }

    /// Authentication path, bottom-up
    pub fn merkle_nodes(&self) -> &[B256] {
        &self.merkle_nodes
    }

    pub fn into_parts(self) -> (C::Header, C::Transaction, u64, Vec<B256>) {
        (
            self.header,
            self.coinbase_tx,
            self.tx_count,
            self.merkle_nodes,
        )
    }
}

impl LightMirror<Bitcoin> {
    /// Build a proof from a full Bitcoin block.
    pub fn from_block(block: &Block) -> Result<Self, BuildError> {
        let coinbase_tx = block.txdata.first().ok_or(BuildError::EmptyBlock)?;
        let tx_hashes: Vec<B256> = block.txdata.iter().map(Bitcoin::tx_hash).collect();
        Ok(Self::build(block.header, coinbase_tx.clone(), &tx_hashes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::blockdata::constants::genesis_block;
    use bitcoin::Network;

    #[test]
    fn test_genesis_mirror_has_empty_path() {
        let genesis = genesis_block(Network::Bitcoin);
        let mirror = LightMirror::from_block(&genesis).unwrap();
        assert_eq!(mirror.tx_count(), 1);
        assert!(mirror.merkle_nodes().is_empty());
        assert_eq!(mirror.header(), &genesis.header);
        assert_eq!(mirror.coinbase_tx(), &genesis.txdata[0]);
    }

    #[test]
    fn test_empty_block_is_rejected() {
        let mut block = genesis_block(Network::Bitcoin);
        block.txdata.clear();
        assert_eq!(
            LightMirror::from_block(&block).unwrap_err(),
            BuildError::EmptyBlock
        );
    }

    #[test]
    #[should_panic(expected = "at least the coinbase")]
    fn test_build_without_hashes_panics() {
        let genesis = genesis_block(Network::Bitcoin);
        let _ = LightMirror::<Bitcoin>::build(genesis.header, genesis.txdata[0].clone(), &[]);
    }

    #[test]
    fn test_from_parts_checks_path_length() {
        let genesis = genesis_block(Network::Bitcoin);
        let header = genesis.header;
        let coinbase = genesis.txdata[0].clone();

        let err = LightMirror::<Bitcoin>::from_parts(header, coinbase.clone(), 5, vec![B256::ZERO; 2])
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::InvalidPathLength {
                expected: 3,
                actual: 2
            }
        );

        let err = LightMirror::<Bitcoin>::from_parts(header, coinbase.clone(), 0, vec![]).unwrap_err();
        assert_eq!(err, BuildError::ZeroTransactions);

        let err = LightMirror::<Bitcoin>::from_parts(
            header,
            coinbase.clone(),
            MAX_TX_PER_BLOCK + 1,
            vec![B256::ZERO; 19],
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::TooManyTransactions { .. }));

        let mirror =
            LightMirror::<Bitcoin>::from_parts(header, coinbase, 4, vec![B256::ZERO; 2]).unwrap();
        assert_eq!(mirror.merkle_nodes().len(), 2);
    }
}
