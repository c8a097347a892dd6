//! Root verification: replaying the authentication path from the coinbase hash.

use alloy_primitives::B256;
use tracing::debug;

use crate::chain::Chain;
use crate::error::VerifyError;
use crate::merkle::fold_root;
use crate::proof::LightMirror;

impl<C: Chain> LightMirror<C> {
    /// Merkle root recomputed from the coinbase hash and the authentication path.
    pub fn merkle_root(&self) -> B256 {
        fold_root::<C>(C::tx_hash(&self.coinbase_tx), &self.merkle_nodes)
    }

    /// Check that the recomputed root equals the root committed in the header.
    pub fn check_merkle(&self) -> Result<(), VerifyError> {
        let expected = C::merkle_root(&self.header);
        let computed = self.merkle_root();
        if expected != computed {
            return Err(VerifyError::MerkleRootMismatch { expected, computed });
        }
        debug!("Merkle root {} matches the header", computed);
        Ok(())
    }
}
