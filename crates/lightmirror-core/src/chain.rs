//! Chain primitives consumed by the proof: header and transaction codecs, transaction
//! hashing and the pairwise Merkle combinator.

use std::fmt;
use std::io::{self, BufRead, Write};

use alloy_primitives::B256;
use bitcoin::block::Header;
use bitcoin::consensus::{self, Decodable};
use bitcoin::hashes::{sha256d, Hash};
use bitcoin::Transaction;

use crate::error::DecodeError;

/// Services a chain must provide for light mirror proofs over its blocks.
///
/// All 256-bit values cross this boundary as [`B256`] in internal byte order, i.e. the
/// order in which the chain hashes and serializes them (not the reversed display order
/// used by block explorers).
pub trait Chain {
    /// Block header committing to the transaction Merkle root
    type Header: Clone + fmt::Debug + PartialEq + Eq;
    /// Transaction type, of which the coinbase is one instance
    type Transaction: Clone + fmt::Debug + PartialEq + Eq;

    /// Decode a header from the front of `reader`
    fn decode_header<R: BufRead + ?Sized>(reader: &mut R) -> Result<Self::Header, DecodeError>;

    /// Write the canonical encoding of `header`
    fn encode_header<W: Write + ?Sized>(header: &Self::Header, writer: &mut W) -> io::Result<()>;

    /// Decode a transaction from the front of `reader`
    fn decode_transaction<R: BufRead + ?Sized>(
        reader: &mut R,
    ) -> Result<Self::Transaction, DecodeError>;

    /// Write the canonical encoding of `tx`
    fn encode_transaction<W: Write + ?Sized>(
        tx: &Self::Transaction,
        writer: &mut W,
    ) -> io::Result<()>;

    /// Merkle root committed in the header
    fn merkle_root(header: &Self::Header) -> B256;

    /// Hash of a transaction as it appears at the Merkle tree leaves
    fn tx_hash(tx: &Self::Transaction) -> B256;

    /// Combine two child nodes into their parent
    fn hash_branches(left: &B256, right: &B256) -> B256;

    /// Output scripts of `tx`, in output order
    fn output_scripts(tx: &Self::Transaction) -> Vec<&[u8]>;
}

/// Bitcoin consensus encoding and double-SHA256 Merkle trees
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bitcoin;

impl Chain for Bitcoin {
    type Header = Header;
    type Transaction = Transaction;

    fn decode_header<R: BufRead + ?Sized>(reader: &mut R) -> Result<Header, DecodeError> {
        Header::consensus_decode(&mut bitcoin::io::FromStd::new(reader)).map_err(Into::into)
    }

    fn encode_header<W: Write + ?Sized>(header: &Header, writer: &mut W) -> io::Result<()> {
        writer.write_all(&consensus::serialize(header))
    }

    fn decode_transaction<R: BufRead + ?Sized>(reader: &mut R) -> Result<Transaction, DecodeError> {
        Transaction::consensus_decode(&mut bitcoin::io::FromStd::new(reader)).map_err(Into::into)
    }

    fn encode_transaction<W: Write + ?Sized>(tx: &Transaction, writer: &mut W) -> io::Result<()> {
        writer.write_all(&consensus::serialize(tx))
    }

    fn merkle_root(header: &Header) -> B256 {
        B256::from(header.merkle_root.to_byte_array())
    }

    fn tx_hash(tx: &Transaction) -> B256 {
        B256::from(tx.compute_txid().to_byte_array())
    }

    fn hash_branches(left: &B256, right: &B256) -> B256 {
        let mut concatenated = [0u8; 64];
        concatenated[..32].copy_from_slice(left.as_slice());
        concatenated[32..].copy_from_slice(right.as_slice());
        B256::from(sha256d::Hash::hash(&concatenated).to_byte_array())
    }

    fn output_scripts(tx: &Transaction) -> Vec<&[u8]> {
        tx.output
            .iter()
            .map(|output| output.script_pubkey.as_bytes())
            .collect()
    }
}
