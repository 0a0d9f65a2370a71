//! Thread-safe handle around a [`MerkleTree`].
//!
//! Leaves, layers and root are derived from each other, so one lock guards
//! all of them and every call holds it until it returns.

use std::sync::Arc;

use cpop_core::{ClaimRecord, Node};
use parking_lot::Mutex;

use crate::error::Result;
use crate::hasher::Hasher;
use crate::merkle::MerkleTree;
use crate::proof::MerkleProof;

/// Cloneable, lock-guarded tree shared between tasks.
pub struct SharedMerkleTree<H: Hasher> {
    inner: Arc<Mutex<MerkleTree<H>>>,
}

impl<H: Hasher> Clone for SharedMerkleTree<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H: Hasher> From<MerkleTree<H>> for SharedMerkleTree<H> {
    fn from(tree: MerkleTree<H>) -> Self {
        Self::new(tree)
    }
}

impl<H: Hasher> SharedMerkleTree<H> {
    pub fn new(tree: MerkleTree<H>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tree)),
        }
    }

    pub fn add_leaf(&self, leaf: &[u8]) -> Result<usize> {
        self.inner.lock().add_leaf(leaf)
    }

    pub fn append_claim(&self, record: &ClaimRecord) -> Result<(usize, Node)> {
        self.inner.lock().append_claim(record)
    }

    pub fn root(&self) -> Result<Node> {
        self.inner.lock().root()
    }

    pub fn get_proof(&self, index: i64) -> Result<Vec<Node>> {
        self.inner.lock().get_proof(index)
    }

    pub fn get_path(&self, index: i64) -> Result<MerkleProof> {
        self.inner.lock().get_path(index)
    }

    pub fn verify_proof<P: AsRef<[u8]>>(&self, leaf: &[u8], proof: &[P], root: &[u8]) -> Result<bool> {
        self.inner.lock().verify_proof(leaf, proof, root)
    }

    /// Root and proof taken under a single lock, so they always agree.
    pub fn snapshot_proof(&self, index: i64) -> Result<(Node, MerkleProof)> {
        let mut tree = self.inner.lock();
        let root = tree.root()?;
        let proof = tree.get_path(index)?;
        Ok((root, proof))
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
