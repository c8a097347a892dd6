//! Synthetic Bitcoin blocks with consistent Merkle roots

#![allow(dead_code)]

use bitcoin::absolute::LockTime;
use bitcoin::block::{Header, Version};
use bitcoin::hashes::Hash;
use bitcoin::{
    transaction, Amount, Block, BlockHash, CompactTarget, OutPoint, ScriptBuf, Sequence,
    Transaction, TxIn, TxOut, Witness,
};

pub fn commitment_script(candidate: [u8; 20], reward: [u8; 20], aux: Option<[u8; 32]>) -> Vec<u8> {
    let mut script = vec![0x6a, 0x04];
    script.extend_from_slice(b"CORE");
    script.push(0x01);
    script.extend_from_slice(&candidate);
    script.extend_from_slice(&reward);
    if let Some(aux) = aux {
        script.extend_from_slice(&aux);
    }
    script
}

pub fn tx_with_outputs(tag: u32, scripts: Vec<Vec<u8>>) -> Transaction {
    Transaction {
        version: transaction::Version::ONE,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::null(),
            script_sig: ScriptBuf::from_bytes(tag.to_le_bytes().to_vec()),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }],
        output: scripts
            .into_iter()
            .map(|script| TxOut {
                value: Amount::from_sat(5_000_000_000),
                script_pubkey: ScriptBuf::from_bytes(script),
            })
            .collect(),
    }
}

/// Block with the given coinbase followed by `tx_count - 1` filler transactions
pub fn block_with_coinbase(coinbase: Transaction, tx_count: u32) -> Block {
    let mut txdata = vec![coinbase];
    for i in 1..tx_count {
        txdata.push(tx_with_outputs(i, vec![vec![0x51]]));
    }
    let mut block = Block {
        header: Header {
            version: Version::ONE,
            prev_blockhash: BlockHash::all_zeros(),
            merkle_root: bitcoin::TxMerkleNode::all_zeros(),
            time: 1_231_006_505,
            bits: CompactTarget::from_consensus(0x1d00ffff),
            nonce: 2_083_236_893,
        },
        txdata,
    };
    block.header.merkle_root = block.compute_merkle_root().unwrap();
    block
}

pub fn block(tx_count: u32) -> Block {
    block_with_coinbase(tx_with_outputs(0, vec![vec![0x51]]), tx_count)
}
