//! CLI wrapper for the verify functionality

use clap::Args;
use std::path::PathBuf;

use bitcoin::Network;
use lightmirror_core::{CodecConfig, MAX_TX_PER_BLOCK};
use tracing::info;

use crate::fetch::load_light_mirror;
use crate::format::format_proof;

/// CLI arguments for the `verify` subcommand
#[derive(Clone, Debug, Args)]
pub struct VerifyArgs {
    /// Path to read the proof from
    #[arg(long)]
    proof_path: PathBuf,
    /// Read the proof as hex text instead of raw bytes
    #[arg(long, default_value = "false")]
    hex: bool,
    /// Reject proofs claiming more transactions than this
    #[arg(long, default_value_t = MAX_TX_PER_BLOCK)]
    max_tx_per_block: u64,
}

/// Run the `verify` subcommand: read a proof from disk and verify it
pub async fn run(args: VerifyArgs) -> Result<(), anyhow::Error> {
    let config = CodecConfig {
        max_tx_per_block: args.max_tx_per_block,
    };
    let proof = load_light_mirror(&args.proof_path, args.hex, &config)?;

    info!("Verifying merkle root ...");
    proof.check_merkle()?;
    info!("Verification successful!");

    println!("{}", format_proof(&proof, Network::Bitcoin));
    Ok(())
}
