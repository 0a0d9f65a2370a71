//! Inclusion proofs and their verification.
//!
//! Two verification rules exist:
//!
//! - [`MerkleProof::verify`] uses the side flag stored with every sibling and
//!   is correct for any tree shape.
//! - [`verify_positional`] takes a bare sibling list and infers the side from
//!   the entry's position: even positions are right siblings, odd positions
//!   are left siblings. This is what existing clients transmit, but it only
//!   reconstructs the root when the leaf's path alternates left/right on the
//!   way up. Use [`MerkleProof::matches_positional_rule`] to find out whether
//!   a given proof can be checked this way.

use cpop_core::Node;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hasher::Hasher;
use crate::leaf::node_from_slice;

/// One step of an inclusion proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofNode {
    /// Sibling hash at this level
    #[serde(with = "hex::serde")]
    pub sibling: Node,
    /// True when the sibling sits to the right of the running hash
    pub is_right: bool,
}

/// An inclusion proof with explicit sides, ordered from leaf level upward.
///
/// Levels where the node was promoted without a partner contribute no entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Index of the proven leaf
    pub leaf_index: usize,
    /// Siblings from leaf level to just below the root
    pub path: Vec<ProofNode>,
}

impl MerkleProof {
    pub fn new(leaf_index: usize, path: Vec<ProofNode>) -> Self {
        Self { leaf_index, path }
    }

    /// Bare sibling sequence, as transmitted to positional verifiers.
    pub fn siblings(&self) -> Vec<Node> {
        self.path.iter().map(|step| step.sibling).collect()
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Fold the leaf up through the path and return the resulting root.
    pub fn compute_root<H: Hasher + ?Sized>(&self, hasher: &H, leaf: &Node) -> Result<Node> {
        let mut current = *leaf;
        for step in &self.path {
            current = if step.is_right {
                hasher.hash_nodes(&current, &step.sibling)?
            } else {
                hasher.hash_nodes(&step.sibling, &current)?
            };
        }
        Ok(current)
    }

    /// Check the proof against a root using the stored side flags.
    pub fn verify<H: Hasher + ?Sized>(&self, hasher: &H, leaf: &Node, root: &Node) -> Result<bool> {
        Ok(self.compute_root(hasher, leaf)? == *root)
    }

    /// Whether [`verify_positional`] would walk the same path as this proof.
    pub fn matches_positional_rule(&self) -> bool {
        self.path
            .iter()
            .enumerate()
            .all(|(i, step)| step.is_right == positional_is_right(i))
    }
}

/// Side assigned to proof entry `i` under the positional rule.
fn positional_is_right(i: usize) -> bool {
    ((i + 1) & 1) == 1
}

/// Verify a bare sibling list using the positional side rule.
///
/// Entry `i` is treated as the right sibling when `((i + 1) & 1) == 1` and as
/// the left sibling otherwise. All lengths are checked before any hashing;
/// a mismatch is an error, while a well-formed proof that does not reach
/// `root` is `Ok(false)`.
pub fn verify_positional<H, P>(hasher: &H, leaf: &[u8], proof: &[P], root: &[u8]) -> Result<bool>
where
    H: Hasher + ?Sized,
    P: AsRef<[u8]>,
{
    let leaf = node_from_slice(leaf)?;
    let root = node_from_slice(root)?;
    let siblings = proof
        .iter()
        .map(|element| node_from_slice(element.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    let mut computed = leaf;
    for (i, sibling) in siblings.iter().enumerate() {
        computed = if positional_is_right(i) {
            hasher.hash_nodes(&computed, sibling)?
        } else {
            hasher.hash_nodes(sibling, &computed)?
        };
    }

    Ok(computed == root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MerkleError;
    use crate::hasher::Sha256Hasher;

    fn node(b: u8) -> Node {
        [b; 32]
    }

    #[test]
    fn test_explicit_sides() {
        let hasher = Sha256Hasher::new();
        let (a, b) = (node(1), node(2));
        let root = hasher.hash_nodes(&a, &b).unwrap();

        let proof_a = MerkleProof::new(0, vec![ProofNode { sibling: b, is_right: true }]);
        let proof_b = MerkleProof::new(1, vec![ProofNode { sibling: a, is_right: false }]);

        assert!(proof_a.verify(&hasher, &a, &root).unwrap());
        assert!(proof_b.verify(&hasher, &b, &root).unwrap());
        assert!(!proof_b.verify(&hasher, &a, &root).unwrap());
    }

    #[test]
    fn test_empty_proof_is_identity() {
        let hasher = Sha256Hasher::new();
        let proof = MerkleProof::new(0, vec![]);
        assert!(proof.is_empty());
        assert!(proof.verify(&hasher, &node(5), &node(5)).unwrap());
        assert!(proof.matches_positional_rule());
    }

    #[test]
    fn test_positional_rule_alternates() {
        let hasher = Sha256Hasher::new();
        let (leaf, s0, s1) = (node(1), node(2), node(3));
        // Entry 0 on the right, entry 1 on the left
        let level1 = hasher.hash_nodes(&leaf, &s0).unwrap();
        let root = hasher.hash_nodes(&s1, &level1).unwrap();

        assert!(verify_positional(&hasher, &leaf, &[s0, s1], &root).unwrap());
        assert!(!verify_positional(&hasher, &leaf, &[s1, s0], &root).unwrap());
    }

    #[test]
    fn test_positional_rejects_bad_lengths() {
        let hasher = Sha256Hasher::new();
        let good = node(1);

        assert_eq!(
            verify_positional(&hasher, &[0u8; 31], &[good], &good),
            Err(MerkleError::InvalidLength { expected: 32, actual: 31 })
        );
        assert_eq!(
            verify_positional(&hasher, &good, &[good], &[0u8; 33]),
            Err(MerkleError::InvalidLength { expected: 32, actual: 33 })
        );
        let proof: Vec<Vec<u8>> = vec![good.to_vec(), vec![0u8; 16]];
        assert_eq!(
            verify_positional(&hasher, &good, &proof, &good),
            Err(MerkleError::InvalidLength { expected: 32, actual: 16 })
        );
    }

    #[test]
    fn test_matches_positional_rule() {
        let right = ProofNode { sibling: node(1), is_right: true };
        let left = ProofNode { sibling: node(2), is_right: false };

        assert!(MerkleProof::new(0, vec![right, left, right]).matches_positional_rule());
        assert!(!MerkleProof::new(1, vec![left]).matches_positional_rule());
        assert!(!MerkleProof::new(0, vec![right, right]).matches_positional_rule());
    }

    #[test]
    fn test_proof_serde() {
        let proof = MerkleProof::new(3, vec![ProofNode { sibling: node(0xCD), is_right: false }]);
        let json = serde_json::to_string(&proof).unwrap();
        assert!(json.contains(&"cd".repeat(32)));
        let parsed: MerkleProof = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, proof);
    }
}
