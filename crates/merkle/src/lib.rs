//! cPOP Merkle commitment engine
//!
//! Append-only binary Merkle tree, inclusion proofs, and pluggable hashing.
//!
//! The `MerkleTree` is used by the claim service to commit every issued
//! token under a single root that is published on-chain, and by verifiers
//! to check that a claim leaf is included under a known root. The `Hasher`
//! trait keeps the tree independent of the hash: `Sha256Hasher` for local
//! development, `PoseidonHasher` (feature `poseidon`) for roots the on-chain
//! program must reproduce.

pub mod error;
pub mod hasher;
pub mod leaf;
pub mod merkle;
pub mod proof;
pub mod shared;

pub use error::{MerkleError, Result};
pub use hasher::{Hasher, Sha256Hasher};
pub use leaf::{claim_leaf, node_from_slice};
pub use merkle::MerkleTree;
pub use proof::{verify_positional, MerkleProof, ProofNode};
pub use shared::SharedMerkleTree;

#[cfg(feature = "poseidon")]
pub use hasher::PoseidonHasher;
