//! Pluggable 32-byte hash functions for the commitment tree.
//!
//! The tree only ever talks to the [`Hasher`] trait. [`Sha256Hasher`] is a
//! development placeholder; roots that will be checked by the on-chain
//! program must come from [`PoseidonHasher`], which reproduces the circuit
//! hash used there.

use cpop_core::Node;
use sha2::{Digest, Sha256};

use crate::error::{MerkleError, Result};
use crate::leaf::node_from_slice;

/// A 32-byte hash with a 2-to-1 node combiner.
pub trait Hasher: Send + Sync {
    /// Short identifier used in logs and errors.
    fn name(&self) -> &'static str;

    /// Whether the on-chain verifier can recompute this hash.
    fn is_circuit_friendly(&self) -> bool;

    /// Hash arbitrary bytes (empty input included) into a node.
    fn hash(&self, data: &[u8]) -> Result<Node>;

    /// Reject nodes this hasher cannot combine without losing information.
    ///
    /// Byte-oriented hashers accept every 32-byte value.
    fn check_node(&self, _node: &Node) -> Result<()> {
        Ok(())
    }

    /// Combine two children into their parent: `hash(left || right)`.
    ///
    /// The order is part of the commitment and must never be swapped.
    fn hash_nodes(&self, left: &Node, right: &Node) -> Result<Node> {
        let mut combined = [0u8; 64];
        combined[..32].copy_from_slice(left);
        combined[32..].copy_from_slice(right);
        self.hash(&combined)
    }

    /// `hash_nodes` over untrusted input.
    ///
    /// Fails with `NullNode` if either side is missing and `InvalidLength`
    /// if either side is not 32 bytes.
    fn hash_node_slices(&self, left: Option<&[u8]>, right: Option<&[u8]>) -> Result<Node> {
        let (Some(left), Some(right)) = (left, right) else {
            return Err(MerkleError::NullNode);
        };
        let left = node_from_slice(left)?;
        let right = node_from_slice(right)?;
        self.hash_nodes(&left, &right)
    }
}

impl<H: Hasher + ?Sized> Hasher for Box<H> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn is_circuit_friendly(&self) -> bool {
        (**self).is_circuit_friendly()
    }

    fn hash(&self, data: &[u8]) -> Result<Node> {
        (**self).hash(data)
    }

    fn check_node(&self, node: &Node) -> Result<()> {
        (**self).check_node(node)
    }

    fn hash_nodes(&self, left: &Node, right: &Node) -> Result<Node> {
        (**self).hash_nodes(left, right)
    }
}

/// SHA-256 placeholder hasher.
///
/// Deterministic and collision resistant, but not what the on-chain program
/// computes. Fine for tests and local tooling only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl Sha256Hasher {
    pub fn new() -> Self {
        Self
    }
}

impl Hasher for Sha256Hasher {
    fn name(&self) -> &'static str {
        "sha256"
    }

    fn is_circuit_friendly(&self) -> bool {
        false
    }

    fn hash(&self, data: &[u8]) -> Result<Node> {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let result = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&result);
        Ok(out)
    }
}

#[cfg(feature = "poseidon")]
pub use poseidon::PoseidonHasher;

#[cfg(feature = "poseidon")]
mod poseidon {
    use ark_bn254::Fr;
    use ark_ff::{BigInteger, PrimeField};
    use cpop_core::Node;
    use light_poseidon::{Poseidon, PoseidonHasher as _};

    use super::Hasher;
    use crate::error::{MerkleError, Result};

    /// Bytes absorbed per permutation; 31 bytes always fit below the BN254 modulus.
    const CHUNK_LEN: usize = 31;

    /// Circom-compatible Poseidon over the BN254 scalar field.
    ///
    /// Byte input is absorbed as `state = Poseidon(state, x)` from a zero
    /// state: first the input length, then each 31-byte big-endian chunk,
    /// so inputs that differ only by leading zero bytes never collide.
    /// Nodes must be canonical field elements (below the
    /// modulus) and are combined as a two-input Poseidon. Outputs are
    /// 32-byte big-endian field elements.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct PoseidonHasher;

    impl PoseidonHasher {
        pub fn new() -> Self {
            Self
        }
    }

    const NAME: &str = "poseidon-bn254";

    fn field_from_be(bytes: &[u8]) -> Fr {
        // Left-pad so every chunk is read as a fixed-width big-endian integer
        let mut padded = [0u8; 32];
        padded[32 - bytes.len()..].copy_from_slice(bytes);
        Fr::from_be_bytes_mod_order(&padded)
    }

    /// Read a node as a field element, refusing values at or above the modulus.
    fn field_from_node(node: &Node) -> Result<Fr> {
        let value = Fr::from_be_bytes_mod_order(node);
        if value.into_bigint().to_bytes_be() != node.to_vec() {
            return Err(MerkleError::NonCanonicalNode(NAME));
        }
        Ok(value)
    }

    fn poseidon2(left: Fr, right: Fr) -> Result<Fr> {
        let mut poseidon =
            Poseidon::<Fr>::new_circom(2).map_err(|e| MerkleError::Hasher(e.to_string()))?;
        poseidon
            .hash(&[left, right])
            .map_err(|e| MerkleError::Hasher(e.to_string()))
    }

    fn field_to_node(value: Fr) -> Result<Node> {
        let bytes = value.into_bigint().to_bytes_be();
        let actual = bytes.len();
        bytes
            .try_into()
            .map_err(|_| MerkleError::InvalidLength { expected: 32, actual })
    }

    impl Hasher for PoseidonHasher {
        fn name(&self) -> &'static str {
            NAME
        }

        fn is_circuit_friendly(&self) -> bool {
            true
        }

        fn hash(&self, data: &[u8]) -> Result<Node> {
            let mut state = poseidon2(Fr::from(0u64), Fr::from(data.len() as u64))?;
            for chunk in data.chunks(CHUNK_LEN) {
                state = poseidon2(state, field_from_be(chunk))?;
            }
            field_to_node(state)
        }

        fn check_node(&self, node: &Node) -> Result<()> {
            field_from_node(node).map(|_| ())
        }

        fn hash_nodes(&self, left: &Node, right: &Node) -> Result<Node> {
            field_to_node(poseidon2(field_from_node(left)?, field_from_node(right)?)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_deterministic() {
        let hasher = Sha256Hasher::new();
        let a = hasher.hash(b"claim").unwrap();
        let b = hasher.hash(b"claim").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, hasher.hash(b"claim!").unwrap());
    }

    #[test]
    fn test_sha256_empty_input() {
        let hasher = Sha256Hasher::new();
        let empty = hasher.hash(&[]).unwrap();
        assert_eq!(empty, hasher.hash(b"").unwrap());
        // Well-known SHA-256 of the empty string
        assert_eq!(
            hex::encode(empty),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash_nodes_is_concatenation() {
        let hasher = Sha256Hasher::new();
        let left = [1u8; 32];
        let right = [2u8; 32];

        let mut combined = Vec::new();
        combined.extend_from_slice(&left);
        combined.extend_from_slice(&right);

        assert_eq!(
            hasher.hash_nodes(&left, &right).unwrap(),
            hasher.hash(&combined).unwrap()
        );
    }

    #[test]
    fn test_hash_nodes_order_matters() {
        let hasher = Sha256Hasher::new();
        let a = [1u8; 32];
        let b = [2u8; 32];
        assert_ne!(
            hasher.hash_nodes(&a, &b).unwrap(),
            hasher.hash_nodes(&b, &a).unwrap()
        );
    }

    #[test]
    fn test_hash_node_slices_null() {
        let hasher = Sha256Hasher::new();
        let node = [7u8; 32];
        assert_eq!(
            hasher.hash_node_slices(None, Some(&node[..])),
            Err(MerkleError::NullNode)
        );
        assert_eq!(
            hasher.hash_node_slices(Some(&node[..]), None),
            Err(MerkleError::NullNode)
        );
    }

    #[test]
    fn test_hash_node_slices_length() {
        let hasher = Sha256Hasher::new();
        let node = [7u8; 32];
        let short = [7u8; 31];
        assert_eq!(
            hasher.hash_node_slices(Some(&short[..]), Some(&node[..])),
            Err(MerkleError::InvalidLength { expected: 32, actual: 31 })
        );
        assert_eq!(
            hasher.hash_node_slices(Some(&node[..]), Some(&[0u8; 33][..])),
            Err(MerkleError::InvalidLength { expected: 32, actual: 33 })
        );
        assert_eq!(
            hasher.hash_node_slices(Some(&node[..]), Some(&node[..])).unwrap(),
            hasher.hash_nodes(&node, &node).unwrap()
        );
    }

    #[test]
    fn test_boxed_hasher_delegates() {
        let boxed: Box<dyn Hasher> = Box::new(Sha256Hasher::new());
        assert_eq!(boxed.name(), "sha256");
        assert!(!boxed.is_circuit_friendly());
        assert_eq!(
            boxed.hash(b"x").unwrap(),
            Sha256Hasher::new().hash(b"x").unwrap()
        );
    }

    #[test]
    fn test_sha256_accepts_any_node() {
        assert_eq!(Sha256Hasher::new().check_node(&[0xFF; 32]), Ok(()));
    }

    #[cfg(feature = "poseidon")]
    mod poseidon {
        use super::*;
        use ark_bn254::Fr;
        use ark_ff::{BigInteger, PrimeField};

        #[test]
        fn test_poseidon_deterministic() {
            let hasher = PoseidonHasher::new();
            assert!(hasher.is_circuit_friendly());
            let a = hasher.hash(&[42u8; 80]).unwrap();
            assert_eq!(a, hasher.hash(&[42u8; 80]).unwrap());
            assert_ne!(a, hasher.hash(&[43u8; 80]).unwrap());
        }

        #[test]
        fn test_poseidon_empty_input() {
            let hasher = PoseidonHasher::new();
            let empty = hasher.hash(&[]).unwrap();
            assert_eq!(empty, hasher.hash(&[]).unwrap());
            assert_ne!(empty, [0u8; 32]);
        }

        #[test]
        fn test_poseidon_order_matters() {
            let hasher = PoseidonHasher::new();
            let a = hasher.hash(b"left").unwrap();
            let b = hasher.hash(b"right").unwrap();
            assert_ne!(
                hasher.hash_nodes(&a, &b).unwrap(),
                hasher.hash_nodes(&b, &a).unwrap()
            );
        }

        #[test]
        fn test_poseidon_leading_zeros_distinct() {
            let hasher = PoseidonHasher::new();
            assert_ne!(hasher.hash(&[]).unwrap(), hasher.hash(&[0u8; 31]).unwrap());
            assert_ne!(hasher.hash(&[0x01]).unwrap(), hasher.hash(&[0x00, 0x01]).unwrap());
            assert_ne!(
                hasher.hash(&[0u8; 31]).unwrap(),
                hasher.hash(&[0u8; 32]).unwrap()
            );
        }

        fn modulus() -> Node {
            <Fr as PrimeField>::MODULUS
                .to_bytes_be()
                .try_into()
                .unwrap()
        }

        #[test]
        fn test_poseidon_rejects_non_canonical_nodes() {
            let hasher = PoseidonHasher::new();
            let p = modulus();
            let mut below = p;
            below[31] -= 1;
            let canonical = hasher.hash(b"leaf").unwrap();

            assert_eq!(hasher.check_node(&below), Ok(()));
            assert_eq!(hasher.check_node(&canonical), Ok(()));
            assert_eq!(
                hasher.check_node(&p),
                Err(MerkleError::NonCanonicalNode("poseidon-bn254"))
            );
            assert_eq!(
                hasher.check_node(&[0xFF; 32]),
                Err(MerkleError::NonCanonicalNode("poseidon-bn254"))
            );
            assert_eq!(
                hasher.hash_nodes(&p, &canonical),
                Err(MerkleError::NonCanonicalNode("poseidon-bn254"))
            );
            assert_eq!(
                hasher.hash_nodes(&canonical, &[0xFF; 32]),
                Err(MerkleError::NonCanonicalNode("poseidon-bn254"))
            );
        }

        #[test]
        fn test_poseidon_differs_from_placeholder() {
            let data = b"same input";
            assert_ne!(
                PoseidonHasher::new().hash(data).unwrap(),
                Sha256Hasher::new().hash(data).unwrap()
            );
        }
    }
}
