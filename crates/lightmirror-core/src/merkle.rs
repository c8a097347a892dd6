//! Merkle tree construction, authentication path extraction and root folding.
//!
//! Trees follow the Bitcoin convention: the leaf level is padded to the next power of
//! two, a node with a left child but no right child hashes the left child with itself,
//! and a node with no children is absent.

use alloy_primitives::B256;

use crate::chain::Chain;

/// Smallest `e` such that `count <= 2^e`.
///
/// This is the height of the padded tree over `count` leaves and hence the length of
/// the authentication path. `compute_exponent(1) == 0`; zero is mapped to zero as well.
pub fn compute_exponent(count: u64) -> usize {
    count
        .checked_next_power_of_two()
        .map_or(64, |padded| padded.trailing_zeros() as usize)
}

/// Build the full tree over `leaves` as a flat array.
///
/// The first `2^e` slots hold the padded leaf level, followed by each parent level in
/// turn; the last slot is the root. Absent nodes are `None`.
pub fn build_merkle_tree_store<C: Chain>(leaves: &[B256]) -> Vec<Option<B256>> {
    let leaf_slots = leaves.len().next_power_of_two();
    let array_size = leaf_slots * 2 - 1;
    let mut store: Vec<Option<B256>> = vec![None; array_size];
    for (slot, leaf) in store.iter_mut().zip(leaves) {
        *slot = Some(*leaf);
    }

    let mut offset = leaf_slots;
    for i in (0..array_size - 1).step_by(2) {
        store[offset] = match (store[i], store[i + 1]) {
            (None, _) => None,
            (Some(left), None) => Some(C::hash_branches(&left, &left)),
            (Some(left), Some(right)) => Some(C::hash_branches(&left, &right)),
        };
        offset += 1;
    }

    store
}

/// Sibling hashes on the path from the first leaf up to the root, bottom-up.
///
/// At every level the first leaf's ancestor is the leftmost node, so its sibling is the
/// second node of that level. Walking the flat store, that slot starts at index 1 and
/// each level begins `2^e`, `2^(e-1)`, ... slots after the previous one.
///
/// `leaves` must not be empty.
pub fn authentication_path<C: Chain>(leaves: &[B256]) -> Vec<B256> {
    let exponent = compute_exponent(leaves.len() as u64);
    let store = build_merkle_tree_store::<C>(leaves);

    let mut path = Vec::with_capacity(exponent);
    let mut offset = 1usize << exponent;
    let mut index = 1;
    for _ in 0..exponent {
        // The right subtree at every level of the first leaf's path is non-empty
        path.extend(store[index]);
        index += offset;
        offset >>= 1;
    }
    path
}

/// Fold `leaf` with each sibling in order, the running hash always on the left.
pub fn fold_root<C: Chain>(leaf: B256, path: &[B256]) -> B256 {
    path.iter()
        .fold(leaf, |node, sibling| C::hash_branches(&node, sibling))
}
