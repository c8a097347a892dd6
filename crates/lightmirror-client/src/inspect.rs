//! Print a machine-readable summary of a stored proof

use clap::Args;
use std::path::PathBuf;

use lightmirror_core::CodecConfig;

use crate::fetch::load_light_mirror;
use crate::format::ProofSummary;

/// CLI arguments for the `inspect` subcommand
#[derive(Clone, Debug, Args)]
pub struct InspectArgs {
    /// Path to read the proof from
    #[arg(long)]
    proof_path: PathBuf,
    /// Read the proof as hex text instead of raw bytes
    #[arg(long, default_value = "false")]
    hex: bool,
}

/// Run the `inspect` subcommand: decode a proof and print it as JSON
///
/// A proof whose root does not match its header is still printed, with
/// `verified` set to false.
pub async fn run(args: InspectArgs) -> Result<(), anyhow::Error> {
    let proof = load_light_mirror(&args.proof_path, args.hex, &CodecConfig::default())?;
    let summary = ProofSummary::new(&proof);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
