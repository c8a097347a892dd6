//! Commitment embedded in coinbase output scripts.
//!
//! Script layout, scanned from byte 0:
//!
//! ```text
//! OP_RETURN | push opcode | "CORE" | OP_PUSHBYTES_1 | candidate[20] | reward[20] | aux[32]?
//! 0           1             2..6     6                7..27           27..47       47..79
//! ```
//!
//! The push opcode at offset 1 must be present but its value is not checked.

use alloy_primitives::{Address, B256};
use bitcoin::opcodes::all::{OP_PUSHBYTES_1, OP_RETURN};
use serde::{Deserialize, Serialize};

use crate::chain::Chain;
use crate::proof::LightMirror;

/// Tag identifying a commitment script
pub const COMMITMENT_MAGIC: &[u8; 4] = b"CORE";

const TAG_RANGE: std::ops::Range<usize> = 2..6;
const LENGTH_OPCODE_OFFSET: usize = 6;
const CANDIDATE_RANGE: std::ops::Range<usize> = 7..27;
const REWARD_RANGE: std::ops::Range<usize> = 27..47;
const AUX_HASH_RANGE: std::ops::Range<usize> = 47..79;

/// Shortest script carrying both addresses
pub const MIN_COMMITMENT_LEN: usize = 1 + 1 + 4 + 1 + 20 + 20;

/// Addresses and auxiliary hash extracted from the coinbase.
///
/// All fields are zero when no output carries a commitment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub candidate: Address,
    pub reward: Address,
    /// Zero unless a matching script carried the trailing 32 bytes
    pub aux_hash: B256,
}

/// Parse a single output script, returning the addresses and the auxiliary hash if
/// the script is long enough to carry one.
pub fn parse_commitment_script(script: &[u8]) -> Option<(Address, Address, Option<B256>)> {
    if script.len() < MIN_COMMITMENT_LEN
        || script[0] != OP_RETURN.to_u8()
        || &script[TAG_RANGE] != COMMITMENT_MAGIC
        || script[LENGTH_OPCODE_OFFSET] != OP_PUSHBYTES_1.to_u8()
    {
        return None;
    }

    let candidate = Address::from_slice(&script[CANDIDATE_RANGE]);
    let reward = Address::from_slice(&script[REWARD_RANGE]);
    let aux_hash = script.get(AUX_HASH_RANGE).map(B256::from_slice);
    Some((candidate, reward, aux_hash))
}

impl<C: Chain> LightMirror<C> {
    /// Scan coinbase outputs after the first for a commitment.
    ///
    /// Every matching output overwrites the addresses found so far, and the auxiliary
    /// hash when it carries one, so the last match wins. Non-matching outputs are
    /// skipped.
    pub fn parse_commitment(&self) -> Commitment {
        let mut commitment = Commitment::default();
        for script in C::output_scripts(&self.coinbase_tx).into_iter().skip(1) {
            let Some((candidate, reward, aux_hash)) = parse_commitment_script(script) else {
                continue;
            };
            commitment.candidate = candidate;
            commitment.reward = reward;
            if let Some(aux_hash) = aux_hash {
                commitment.aux_hash = aux_hash;
            }
        }
        commitment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(candidate: u8, reward: u8, aux: Option<u8>) -> Vec<u8> {
        let mut script = vec![0x6a, 0x04];
        script.extend_from_slice(b"CORE");
        script.push(0x01);
        script.extend_from_slice(&[candidate; 20]);
        script.extend_from_slice(&[reward; 20]);
        if let Some(aux) = aux {
            script.extend_from_slice(&[aux; 32]);
        }
        script
    }

    #[test]
    fn test_parse_minimal_script() {
        let script = script(0xaa, 0xbb, None);
        assert_eq!(script.len(), MIN_COMMITMENT_LEN);
        let (candidate, reward, aux) = parse_commitment_script(&script).unwrap();
        assert_eq!(candidate, Address::repeat_byte(0xaa));
        assert_eq!(reward, Address::repeat_byte(0xbb));
        assert_eq!(aux, None);
    }

    #[test]
    fn test_parse_script_with_aux_hash() {
        let script = script(0xaa, 0xbb, Some(0xcc));
        assert_eq!(script.len(), 79);
        let (_, _, aux) = parse_commitment_script(&script).unwrap();
        assert_eq!(aux, Some(B256::repeat_byte(0xcc)));
    }

    #[test]
    fn test_partial_aux_hash_is_ignored() {
        let mut script = script(0xaa, 0xbb, None);
        script.extend_from_slice(&[0xcc; 31]);
        let (_, _, aux) = parse_commitment_script(&script).unwrap();
        assert_eq!(aux, None);
    }

    #[test]
    fn test_push_opcode_value_is_not_checked() {
        let mut script = script(0xaa, 0xbb, None);
        script[1] = 0x4c;
        assert!(parse_commitment_script(&script).is_some());
    }

    #[test]
    fn test_rejects_malformed_scripts() {
        let valid = script(0xaa, 0xbb, None);

        assert!(parse_commitment_script(&valid[..MIN_COMMITMENT_LEN - 1]).is_none());
        assert!(parse_commitment_script(&[]).is_none());

        let mut wrong_opcode = valid.clone();
        wrong_opcode[0] = 0x76;
        assert!(parse_commitment_script(&wrong_opcode).is_none());

        let mut wrong_tag = valid.clone();
        wrong_tag[2..6].copy_from_slice(b"CORF");
        assert!(parse_commitment_script(&wrong_tag).is_none());

        let mut wrong_length_opcode = valid;
        wrong_length_opcode[6] = 0x02;
        assert!(parse_commitment_script(&wrong_length_opcode).is_none());
    }
}
