//! Leaf construction from claim records and raw bytes.

use cpop_core::{ClaimRecord, Node, NODE_LEN};

use crate::error::{MerkleError, Result};
use crate::hasher::Hasher;

/// Convert untrusted bytes into a node.
///
/// Anything other than exactly 32 bytes is rejected; nothing is truncated
/// or padded.
pub fn node_from_slice(bytes: &[u8]) -> Result<Node> {
    bytes.try_into().map_err(|_| MerkleError::InvalidLength {
        expected: NODE_LEN,
        actual: bytes.len(),
    })
}

/// Compute the leaf for a claim: `hash(event || claimer || token_id_le || claim_time_le)`.
///
/// This MUST match the on-chain `hash_token_data`; both hash the same
/// 80-byte preimage.
pub fn claim_leaf<H: Hasher + ?Sized>(hasher: &H, record: &ClaimRecord) -> Result<Node> {
    hasher.hash(&record.preimage())
}
