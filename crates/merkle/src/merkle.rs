//! Append-only binary Merkle tree for claim commitments.
//!
//! Leaves: 32-byte claim hashes in insertion order.
//! Internal nodes: `hasher.hash_nodes(left, right)`.
//! If a layer has odd length, its last node is promoted unchanged to the
//! next layer (no self-pairing, no zero padding).
//! Empty tree root: `[0u8; 32]`.
//!
//! Layers are derived lazily. Appending a leaf drops the cached layers;
//! the next `root`/proof call rebuilds the whole tree.

use cpop_core::{ClaimRecord, Node, TreeConfig, EMPTY_ROOT};
use tracing::{debug, warn};

use crate::error::{MerkleError, Result};
use crate::hasher::{Hasher, Sha256Hasher};
use crate::leaf::{claim_leaf, node_from_slice};
use crate::proof::{verify_positional, MerkleProof, ProofNode};

/// A binary Merkle tree over 32-byte leaves.
#[derive(Debug, Clone)]
pub struct MerkleTree<H: Hasher = Sha256Hasher> {
    hasher: H,
    config: TreeConfig,
    leaves: Vec<Node>,
    /// All nodes level by level, bottom-up; `None` while stale. `layers[0]` = leaves.
    layers: Option<Vec<Vec<Node>>>,
}

impl<H: Hasher> MerkleTree<H> {
    /// Create an empty tree with the default configuration.
    pub fn new(hasher: H) -> Self {
        warn_if_placeholder(&hasher);
        Self {
            hasher,
            config: TreeConfig::default(),
            leaves: Vec::new(),
            layers: None,
        }
    }

    /// Create an empty tree with an explicit configuration.
    ///
    /// Fails with `UnsupportedHashAlgorithm` when the config demands a
    /// circuit-friendly hasher and `hasher` is not one.
    pub fn with_config(hasher: H, config: TreeConfig) -> Result<Self> {
        config.validate()?;
        if config.require_circuit_friendly && !hasher.is_circuit_friendly() {
            return Err(MerkleError::UnsupportedHashAlgorithm(hasher.name()));
        }
        warn_if_placeholder(&hasher);
        Ok(Self {
            hasher,
            config,
            leaves: Vec::new(),
            layers: None,
        })
    }

    /// Build a tree from pre-hashed leaves.
    pub fn from_leaves(hasher: H, leaves: impl IntoIterator<Item = Node>) -> Result<Self> {
        let mut tree = Self::new(hasher);
        for leaf in leaves {
            tree.push_leaf(leaf)?;
        }
        Ok(tree)
    }

    /// Build a tree whose leaves are the hashes of `records`, in order.
    pub fn from_claims(hasher: H, records: &[ClaimRecord]) -> Result<Self> {
        let mut tree = Self::new(hasher);
        for record in records {
            tree.append_claim(record)?;
        }
        Ok(tree)
    }

    /// Append a leaf given as untrusted bytes; returns its index.
    ///
    /// A rejected leaf leaves the tree untouched.
    pub fn add_leaf(&mut self, leaf: &[u8]) -> Result<usize> {
        let node = node_from_slice(leaf)?;
        self.push_leaf(node)
    }

    /// Append a 32-byte leaf; returns its index.
    ///
    /// Leaves the hasher cannot combine losslessly are refused.
    pub fn push_leaf(&mut self, leaf: Node) -> Result<usize> {
        let capacity = self.config.capacity();
        if self.leaves.len() as u64 >= capacity {
            return Err(MerkleError::TreeFull { capacity });
        }
        self.hasher.check_node(&leaf)?;
        self.leaves.push(leaf);
        self.layers = None;
        Ok(self.leaves.len() - 1)
    }

    /// Hash a claim with this tree's hasher and append it.
    ///
    /// Returns the leaf index and the leaf itself.
    pub fn append_claim(&mut self, record: &ClaimRecord) -> Result<(usize, Node)> {
        let leaf = claim_leaf(&self.hasher, record)?;
        let index = self.push_leaf(leaf)?;
        Ok((index, leaf))
    }

    /// Current root; `[0u8; 32]` for an empty tree.
    pub fn root(&mut self) -> Result<Node> {
        if self.leaves.is_empty() {
            return Ok(EMPTY_ROOT);
        }
        let layers = self.layers()?;
        Ok(layers
            .last()
            .and_then(|top| top.first())
            .copied()
            .unwrap_or(EMPTY_ROOT))
    }

    /// Sibling sequence for the leaf at `index`, bottom-up.
    pub fn get_proof(&mut self, index: i64) -> Result<Vec<Node>> {
        Ok(self.get_path(index)?.siblings())
    }

    /// Inclusion proof with explicit sides for the leaf at `index`.
    pub fn get_path(&mut self, index: i64) -> Result<MerkleProof> {
        let leaf_index = self.checked_index(index)?;
        let layers = self.layers()?;

        let mut path = Vec::with_capacity(layers.len().saturating_sub(1));
        let mut pos = leaf_index;

        for layer in &layers[..layers.len() - 1] {
            // Sibling is the other child of the same parent
            let sibling_pos = if pos % 2 == 1 { pos - 1 } else { pos + 1 };
            if let Some(sibling) = layer.get(sibling_pos) {
                path.push(ProofNode {
                    sibling: *sibling,
                    is_right: sibling_pos > pos,
                });
            }
            pos /= 2;
        }

        Ok(MerkleProof::new(leaf_index, path))
    }

    /// Verify a bare sibling list against `root` with the positional side rule.
    ///
    /// See [`verify_positional`] for the rule and its limits.
    pub fn verify_proof<P: AsRef<[u8]>>(&self, leaf: &[u8], proof: &[P], root: &[u8]) -> Result<bool> {
        verify_positional(&self.hasher, leaf, proof, root)
    }

    /// Verify a proof with explicit sides against `root`.
    pub fn verify_path(&self, leaf: &Node, proof: &MerkleProof, root: &Node) -> Result<bool> {
        proof.verify(&self.hasher, leaf, root)
    }

    /// All layers, leaves first, rebuilding them if stale.
    pub fn layers(&mut self) -> Result<&[Vec<Node>]> {
        if self.layers.is_none() {
            let layers = build_layers(&self.hasher, &self.leaves)?;
            debug!(
                "Rebuilt {} tree: {} leaves, {} layers",
                self.hasher.name(),
                self.leaves.len(),
                layers.len()
            );
            self.layers = Some(layers);
        }
        Ok(self.layers.as_deref().unwrap_or_default())
    }

    /// Whether cached layers are up to date with the leaf set.
    pub fn is_finalized(&self) -> bool {
        self.layers.is_some()
    }

    /// Number of layers above the leaves.
    pub fn depth(&self) -> usize {
        let mut width = self.leaves.len();
        let mut depth = 0;
        while width > 1 {
            width = width.div_ceil(2);
            depth += 1;
        }
        depth
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn leaves(&self) -> &[Node] {
        &self.leaves
    }

    pub fn leaf(&self, index: usize) -> Option<&Node> {
        self.leaves.get(index)
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    fn checked_index(&self, index: i64) -> Result<usize> {
        usize::try_from(index)
            .ok()
            .filter(|i| *i < self.leaves.len())
            .ok_or(MerkleError::IndexOutOfBounds {
                index,
                leaf_count: self.leaves.len(),
            })
    }
}

fn warn_if_placeholder<H: Hasher>(hasher: &H) {
    if !hasher.is_circuit_friendly() {
        warn!(
            "Using placeholder hasher {} - roots will not match the on-chain verifier",
            hasher.name()
        );
    }
}

/// Derive every layer bottom-up, promoting an unpaired last node unchanged.
fn build_layers<H: Hasher>(hasher: &H, leaves: &[Node]) -> Result<Vec<Vec<Node>>> {
    let mut layers = vec![leaves.to_vec()];

    while let Some(prev) = layers.last().filter(|layer| layer.len() > 1) {
        let mut next = Vec::with_capacity(prev.len().div_ceil(2));
        for pair in prev.chunks(2) {
            next.push(match pair {
                [left, right] => hasher.hash_nodes(left, right)?,
                _ => pair[0],
            });
        }
        layers.push(next);
    }

    Ok(layers)
}
