use cpop_core::ConfigError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MerkleError {
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Cannot hash an absent node")]
    NullNode,

    #[error("Leaf index {index} out of bounds (leaf count: {leaf_count})")]
    IndexOutOfBounds { index: i64, leaf_count: usize },

    #[error("Hash algorithm {0} cannot produce on-chain commitments")]
    UnsupportedHashAlgorithm(&'static str),

    #[error("Tree is full (capacity: {capacity})")]
    TreeFull { capacity: u64 },

    #[error("Invalid tree config: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("Node is not a canonical {0} field element")]
    NonCanonicalNode(&'static str),

    #[error("Hasher failure: {0}")]
    Hasher(String),
}

pub type Result<T> = std::result::Result<T, MerkleError>;
