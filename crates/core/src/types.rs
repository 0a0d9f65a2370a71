use serde::{Deserialize, Serialize};

/// 32-byte tree node (leaves and internal nodes share this shape)
pub type Node = [u8; 32];

/// 32-byte public key
pub type PublicKey = [u8; 32];

/// Root of a tree with no leaves
pub const EMPTY_ROOT: Node = [0u8; 32];

/// Byte length of every leaf and node
pub const NODE_LEN: usize = 32;

/// Byte length of a serialized claim: event (32) + claimer (32) + token_id (8) + claim_time (8)
pub const CLAIM_PREIMAGE_LEN: usize = 80;

/// A single token claim, the domain record behind each leaf.
///
/// The field order matches the on-chain `TokenData` serialization and must
/// not change: `event || claimer || token_id_le || claim_time_le`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimRecord {
    /// Event account the token belongs to
    #[serde(with = "hex::serde")]
    pub event: PublicKey,
    /// Wallet that claimed the token
    #[serde(with = "hex::serde")]
    pub claimer: PublicKey,
    /// Token id within the event
    pub token_id: u64,
    /// Unix timestamp of the claim
    pub claim_time: u64,
}

impl ClaimRecord {
    pub fn new(event: PublicKey, claimer: PublicKey, token_id: u64, claim_time: u64) -> Self {
        Self {
            event,
            claimer,
            token_id,
            claim_time,
        }
    }

    /// Bytes that get hashed into the claim's leaf.
    ///
    /// Integers are little-endian; the on-chain program recomputes the leaf
    /// from the same layout.
    pub fn preimage(&self) -> [u8; CLAIM_PREIMAGE_LEN] {
        let mut out = [0u8; CLAIM_PREIMAGE_LEN];
        out[0..32].copy_from_slice(&self.event);
        out[32..64].copy_from_slice(&self.claimer);
        out[64..72].copy_from_slice(&self.token_id.to_le_bytes());
        out[72..80].copy_from_slice(&self.claim_time.to_le_bytes());
        out
    }
}
