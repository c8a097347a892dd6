//! Proof formatting utilities for terminal display.
//!
//! Renders a light mirror as an ASCII card (header, merkle path, coinbase outputs and
//! commitment) and as a serializable summary for machine consumption.

use bitcoin::hashes::Hash;
use bitcoin::{Address, Network, TxMerkleNode, TxOut};
use chrono::DateTime;
use lightmirror_core::commitment::parse_commitment_script;
use lightmirror_core::{Commitment, LightMirror};
use serde::Serialize;

/// Inner width of the card, excluding borders
const CARD_WIDTH: usize = 100;

/// Flattened view of a proof, shared by the terminal card and `inspect`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProofSummary {
    pub block_hash: String,
    pub merkle_root: String,
    pub block_time: String,
    pub tx_count: u64,
    /// Path nodes in internal byte order, leaf to root
    pub merkle_nodes: Vec<String>,
    pub coinbase_txid: String,
    pub commitment: Commitment,
    /// Whether the folded root matches the header
    pub verified: bool,
}

impl ProofSummary {
    pub fn new(proof: &LightMirror) -> Self {
        let header = proof.header();
        Self {
            block_hash: header.block_hash().to_string(),
            merkle_root: header.merkle_root.to_string(),
            block_time: format_unix_timestamp(header.time),
            tx_count: proof.tx_count(),
            merkle_nodes: proof.merkle_nodes().iter().map(hex::encode).collect(),
            coinbase_txid: proof.coinbase_tx().compute_txid().to_string(),
            commitment: proof.parse_commitment(),
            verified: proof.check_merkle().is_ok(),
        }
    }
}

/// Format a light mirror for terminal display
pub fn format_proof(proof: &LightMirror, network: Network) -> String {
    let summary = ProofSummary::new(proof);
    let computed_root = TxMerkleNode::from_byte_array(proof.merkle_root().0);

    let mut output = String::new();
    output.push('\n');
    output.push_str(&format!("┌─ Light Mirror {}┐\n", "─".repeat(CARD_WIDTH - 13)));

    let status = if summary.verified {
        "\x1b[32mverified\x1b[0m"
    } else {
        "\x1b[31mroot mismatch\x1b[0m"
    };
    push_line(&mut output, &format!("\x1b[33mBLOCK:\x1b[0m {}", summary.block_hash));
    push_line(&mut output, &format!("Header merkle root:   {}", summary.merkle_root));
    push_line(&mut output, &format!("Computed merkle root: {}", computed_root));
    push_line(&mut output, &format!("Block timestamp: {}", summary.block_time));
    push_line(&mut output, &format!("Transactions: {}", summary.tx_count));
    push_line(&mut output, &format!("Status: {}", status));
    push_separator(&mut output);

    push_line(&mut output, "\x1b[33mMERKLE PATH:\x1b[0m");
    if summary.merkle_nodes.is_empty() {
        push_line(&mut output, "  (coinbase is the only transaction)");
    }
    for (level, node) in summary.merkle_nodes.iter().enumerate() {
        push_line(&mut output, &format!("  {:>2}  {}", level, node));
    }
    push_separator(&mut output);

    push_line(&mut output, &format!("\x1b[33mCOINBASE:\x1b[0m {}", summary.coinbase_txid));
    for line in format_outputs(&proof.coinbase_tx().output, network).lines() {
        push_line(&mut output, line);
    }
    push_separator(&mut output);

    for line in format_commitment(&summary.commitment).lines() {
        push_line(&mut output, line);
    }

    output.push_str(&format!("└{}┘\n", "─".repeat(CARD_WIDTH + 2)));
    output
}

fn push_line(output: &mut String, content: &str) {
    output.push_str(&format!("│ {} │\n", format_column_content(content, CARD_WIDTH)));
}

fn push_separator(output: &mut String) {
    output.push_str(&format!("├{}┤\n", "─".repeat(CARD_WIDTH + 2)));
}

/// Format coinbase outputs, flagging the ones carrying a commitment
fn format_outputs(outputs: &[TxOut], network: Network) -> String {
    let mut output = String::new();

    for (vout, txout) in outputs.iter().enumerate() {
        let address = format_output_address(txout, network);
        let is_commitment = parse_commitment_script(txout.script_pubkey.as_bytes()).is_some();
        let marker = if vout > 0 && is_commitment {
            "  \x1b[36m[commitment]\x1b[0m"
        } else {
            ""
        };
        output.push_str(&format!(
            "  #{} {}        {:.8} BTC{}\n",
            vout,
            address,
            txout.value.to_btc(),
            marker
        ));
    }

    if outputs.is_empty() {
        output.push_str("  (no outputs)\n");
    }

    output
}

fn format_commitment(commitment: &Commitment) -> String {
    let mut output = String::new();
    output.push_str("\x1b[33mCOMMITMENT:\x1b[0m\n");

    if *commitment == Commitment::default() {
        output.push_str("  (none)\n");
        return output;
    }

    output.push_str(&format!("Candidate: {}\n", commitment.candidate));
    output.push_str(&format!("Reward:    {}\n", commitment.reward));
    output.push_str(&format!("Aux hash:  {}\n", commitment.aux_hash));
    output
}

/// Get address string for a transaction output
fn format_output_address(output: &TxOut, network: Network) -> String {
    match Address::from_script(&output.script_pubkey, network) {
        Ok(address) => address.to_string(),
        Err(_) => {
            let script = &output.script_pubkey;
            if script.is_p2pk() {
                "P2PK".to_string()
            } else if script.is_op_return() {
                "OP_RETURN".to_string()
            } else {
                "Unknown".to_string()
            }
        }
    }
}

/// Format content for a column with proper padding
fn format_column_content(content: &str, width: usize) -> String {
    let visible_len = strip_ansi_codes(content).chars().count();

    if visible_len <= width {
        format!("{}{}", content, " ".repeat(width - visible_len))
    } else {
        content.to_string()
    }
}

/// Remove ANSI color codes from a string for length calculation
fn strip_ansi_codes(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next_c in chars.by_ref() {
                if next_c == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Format Unix timestamp to human-readable string
fn format_unix_timestamp(timestamp: u32) -> String {
    match DateTime::from_timestamp(timestamp as i64, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => timestamp.to_string(),
    }
}
