//! Functions to fetch a block from a Bitcoin node, build its light mirror and store it
//! on disk.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bitcoin::{Block, BlockHash};
use lightmirror_bitcoin_client::BitcoinClient;
use lightmirror_core::{CodecConfig, LightMirror};
use tracing::info;

/// CLI arguments for the `fetch` subcommand
#[derive(Clone, Debug, clap::Args)]
pub struct FetchArgs {
    /// Hash of the block to mirror
    #[arg(long, conflicts_with = "block_height", required_unless_present = "block_height")]
    block_hash: Option<BlockHash>,
    /// Height of the block to mirror
    #[arg(long)]
    block_height: Option<u32>,
    /// Wait until this many blocks are built on top of the block (height lookups only)
    #[arg(long, default_value = "0")]
    confirmations: u32,
    /// Path to save the proof
    #[arg(long)]
    proof_path: PathBuf,
    /// Write the proof as hex text instead of raw bytes
    #[arg(long, default_value = "false")]
    hex: bool,
    /// Bitcoin RPC URL
    #[arg(long, env = "BITCOIN_RPC")]
    bitcoin_rpc_url: String,
    /// Bitcoin RPC user:password (optional)
    #[arg(long, env = "USERPWD")]
    bitcoin_rpc_userpwd: Option<String>,
    /// Verify the proof after fetching it
    #[arg(long, default_value = "false")]
    verify: bool,
}

/// Block to build a proof for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockRef {
    Hash(BlockHash),
    Height(u32),
}

/// Source of full blocks
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlockSource {
    /// Resolve a height to a block hash once `confirmations` blocks are built on top
    async fn block_hash(&self, height: u32, confirmations: u32) -> anyhow::Result<BlockHash>;
    /// Fetch the full block
    async fn block(&self, hash: &BlockHash) -> anyhow::Result<Block>;
}

#[async_trait]
impl BlockSource for BitcoinClient {
    async fn block_hash(&self, height: u32, confirmations: u32) -> anyhow::Result<BlockHash> {
        let hash = if confirmations == 0 {
            self.get_block_hash(height).await?
        } else {
            self.wait_block_hash(height, confirmations).await?
        };
        Ok(hash)
    }

    async fn block(&self, hash: &BlockHash) -> anyhow::Result<Block> {
        Ok(self.get_block(hash).await?)
    }
}

/// Run the `fetch` subcommand: build a light mirror and write it to disk
pub async fn run(args: FetchArgs) -> Result<(), anyhow::Error> {
    let block = match (args.block_hash, args.block_height) {
        (Some(hash), _) => BlockRef::Hash(hash),
        (None, Some(height)) => BlockRef::Height(height),
        (None, None) => anyhow::bail!("Either --block-hash or --block-height is required"),
    };

    let client = BitcoinClient::new(args.bitcoin_rpc_url, args.bitcoin_rpc_userpwd)?;
    let mirror = fetch_light_mirror(&client, block, args.confirmations).await?;

    save_light_mirror(&mirror, &args.proof_path, args.hex)?;

    if args.verify {
        info!("Verifying merkle root ...");
        mirror.check_merkle()?;
        info!("Verification successful!");
    }

    Ok(())
}

/// Fetch a block and build its light mirror
///
/// - `source`: Where blocks come from
/// - `block`: Hash or height of the block
/// - `confirmations`: Blocks required on top of the block when resolving a height
pub async fn fetch_light_mirror<S: BlockSource + ?Sized>(
    source: &S,
    block: BlockRef,
    confirmations: u32,
) -> Result<LightMirror, anyhow::Error> {
    let hash = match block {
        BlockRef::Hash(hash) => hash,
        BlockRef::Height(height) => {
            info!("Resolving block height {} ...", height);
            source.block_hash(height, confirmations).await?
        }
    };

    info!("Fetching block {} ...", hash);
    let block = source.block(&hash).await?;
    if block.block_hash() != hash {
        anyhow::bail!(
            "Block hash mismatch: requested {}, received {}",
            hash,
            block.block_hash()
        );
    }

    let mirror = LightMirror::from_block(&block)?;
    info!(
        "Built light mirror over {} transactions ({} merkle nodes)",
        mirror.tx_count(),
        mirror.merkle_nodes().len()
    );
    Ok(mirror)
}

/// Save a light mirror to disk in wire format, optionally hex encoded
pub fn save_light_mirror(
    proof: &LightMirror,
    proof_path: &Path,
    as_hex: bool,
) -> Result<(), anyhow::Error> {
    if let Some(proof_dir) = proof_path.parent() {
        std::fs::create_dir_all(proof_dir)?;
    }

    let mut writer = BufWriter::new(File::create(proof_path)?);
    if as_hex {
        writeln!(writer, "{}", hex::encode(proof.to_bytes()))?;
    } else {
        proof.encode(&mut writer)?;
    }
    writer.flush()?;

    info!("Light mirror written to {}", proof_path.display());
    Ok(())
}

/// Load a light mirror saved by [`save_light_mirror`]
///
/// The file must contain exactly one proof; transaction counts above
/// `config.max_tx_per_block` are rejected before the path is read.
pub fn load_light_mirror(
    proof_path: &Path,
    as_hex: bool,
    config: &CodecConfig,
) -> Result<LightMirror, anyhow::Error> {
    info!("Loading light mirror from {}", proof_path.display());

    if as_hex {
        let text = std::fs::read_to_string(proof_path)?;
        let bytes = hex::decode(text.trim())?;
        return Ok(LightMirror::from_bytes_with_config(&bytes, config)?);
    }

    let mut reader = BufReader::new(File::open(proof_path)?);
    let proof = LightMirror::decode_with_config(&mut reader, config)?;
    if !reader.fill_buf()?.is_empty() {
        anyhow::bail!("Unexpected trailing data after light mirror");
    }
    Ok(proof)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::blockdata::constants::genesis_block;
    use bitcoin::hashes::Hash;
    use bitcoin::Network;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_fetch_by_height() {
        let genesis = genesis_block(Network::Bitcoin);
        let genesis_hash = genesis.block_hash();

        let mut source = MockBlockSource::new();
        source
            .expect_block_hash()
            .with(eq(0), eq(6))
            .times(1)
            .returning(move |_, _| Ok(genesis_hash));
        source
            .expect_block()
            .withf(move |hash| *hash == genesis_hash)
            .times(1)
            .returning(move |_| Ok(genesis.clone()));

        let mirror = fetch_light_mirror(&source, BlockRef::Height(0), 6)
            .await
            .unwrap();
        assert_eq!(mirror.tx_count(), 1);
        assert!(mirror.check_merkle().is_ok());
    }

    #[tokio::test]
    async fn test_fetch_by_hash_skips_height_lookup() {
        let genesis = genesis_block(Network::Bitcoin);
        let genesis_hash = genesis.block_hash();

        let mut source = MockBlockSource::new();
        source.expect_block_hash().never();
        source
            .expect_block()
            .returning(move |_| Ok(genesis.clone()));

        let mirror = fetch_light_mirror(&source, BlockRef::Hash(genesis_hash), 0)
            .await
            .unwrap();
        assert_eq!(mirror.header().block_hash(), genesis_hash);
    }

    #[tokio::test]
    async fn test_fetch_rejects_wrong_block() {
        let genesis = genesis_block(Network::Bitcoin);

        let mut source = MockBlockSource::new();
        source
            .expect_block()
            .returning(move |_| Ok(genesis.clone()));

        let err = fetch_light_mirror(&source, BlockRef::Hash(BlockHash::all_zeros()), 0)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Block hash mismatch"));
    }

    #[tokio::test]
    async fn test_fetch_rejects_empty_block() {
        let mut block = genesis_block(Network::Bitcoin);
        block.txdata.clear();
        let hash = block.block_hash();

        let mut source = MockBlockSource::new();
        source.expect_block().returning(move |_| Ok(block.clone()));

        let err = fetch_light_mirror(&source, BlockRef::Hash(hash), 0)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no transactions"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mirror = LightMirror::from_block(&genesis_block(Network::Bitcoin)).unwrap();

        for as_hex in [false, true] {
            let path = dir.path().join(format!("nested/proof-{as_hex}.bin"));
            save_light_mirror(&mirror, &path, as_hex).unwrap();
            let loaded = load_light_mirror(&path, as_hex, &CodecConfig::default()).unwrap();
            assert_eq!(loaded, mirror);
        }
    }

    #[test]
    fn test_load_rejects_trailing_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proof.bin");
        let mirror = LightMirror::from_block(&genesis_block(Network::Bitcoin)).unwrap();

        let mut bytes = mirror.to_bytes();
        bytes.extend_from_slice(&[0xde, 0xad]);
        std::fs::write(&path, bytes).unwrap();

        let err = load_light_mirror(&path, false, &CodecConfig::default()).unwrap_err();
        assert!(err.to_string().contains("trailing"));
    }
}
