use alloy::primitives::{keccak256, B256, U256};
use core::{fmt::Debug, hash::Hash};

/// Four field elements. The output width of a [`TreeHasher`], and the key
/// type of every node in a [`Db`].
///
/// [`Db`]: crate::tree::Db
pub type Digest<F> = [F; 4];

/// Twelve field elements. The stored contents of a tree node.
pub type Node<F> = [F; 12];

/// A hash function over a finite field, used by the [`Smt`] to hash its
/// nodes.
///
/// The shape follows a width-12 sponge permutation: 8 input elements and 4
/// capacity elements in, 4 elements out. The capacity is used for domain
/// separation between leaves and internal nodes.
///
/// [`Smt`]: crate::tree::Smt
pub trait TreeHasher {
    /// The field element type.
    type F: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    /// Map an integer into the field.
    fn from_u64(&self, value: u64) -> Self::F;

    /// Map a field element back to its canonical integer representation.
    fn to_u64(&self, element: Self::F) -> u64;

    /// Hash 8 input elements under the given capacity.
    fn hash(&self, inputs: [Self::F; 8], capacity: [Self::F; 4]) -> Digest<Self::F>;

    /// The all-zero digest, used for empty subtrees.
    fn zero_digest(&self) -> Digest<Self::F> {
        [self.from_u64(0); 4]
    }

    /// Pack a digest into a [`B256`], with the first element as the least
    /// significant limb.
    fn digest_to_b256(&self, digest: Digest<Self::F>) -> B256 {
        B256::from(U256::from_limbs(digest.map(|e| self.to_u64(e))).to_be_bytes::<32>())
    }

    /// Unpack a [`B256`] into a digest. Inverse of
    /// [`TreeHasher::digest_to_b256`] for canonical digests.
    fn b256_to_digest(&self, word: B256) -> Digest<Self::F> {
        U256::from_be_bytes(word.0).into_limbs().map(|limb| self.from_u64(limb))
    }
}

/// [`TreeHasher`] backed by keccak256 over 64-bit elements.
///
/// Elements are written big-endian, all twelve of them, and the 32-byte
/// output is read back as four big-endian words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeccakHasher;

impl TreeHasher for KeccakHasher {
    type F = u64;

    fn from_u64(&self, value: u64) -> u64 {
        value
    }

    fn to_u64(&self, element: u64) -> u64 {
        element
    }

    fn hash(&self, inputs: [u64; 8], capacity: [u64; 4]) -> Digest<u64> {
        let mut buf = [0u8; 96];
        for (chunk, element) in buf.chunks_exact_mut(8).zip(inputs.iter().chain(capacity.iter())) {
            chunk.copy_from_slice(&element.to_be_bytes());
        }
        let out = keccak256(buf);
        core::array::from_fn(|i| {
            let mut word = [0u8; 8];
            word.copy_from_slice(&out[i * 8..(i + 1) * 8]);
            u64::from_be_bytes(word)
        })
    }
}

#[cfg(feature = "poseidon")]
pub use poseidon::PoseidonHasher;

/// The hasher a [`BlobProcessorBuilder`] starts with. Poseidon with the
/// `poseidon` feature, keccak otherwise.
///
/// [`BlobProcessorBuilder`]: crate::BlobProcessorBuilder
#[cfg(feature = "poseidon")]
pub type DefaultHasher = PoseidonHasher;

/// The hasher a [`BlobProcessorBuilder`] starts with. Poseidon with the
/// `poseidon` feature, keccak otherwise.
///
/// [`BlobProcessorBuilder`]: crate::BlobProcessorBuilder
#[cfg(not(feature = "poseidon"))]
pub type DefaultHasher = KeccakHasher;

#[cfg(feature = "poseidon")]
mod poseidon {
    use super::{Digest, TreeHasher};
    use plonky2::{
        field::{
            goldilocks_field::GoldilocksField,
            types::{Field, PrimeField64},
        },
        hash::poseidon::Poseidon,
    };

    /// [`TreeHasher`] backed by Poseidon over the Goldilocks field.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct PoseidonHasher;

    impl TreeHasher for PoseidonHasher {
        type F = GoldilocksField;

        fn from_u64(&self, value: u64) -> GoldilocksField {
            GoldilocksField::from_noncanonical_u64(value)
        }

        fn to_u64(&self, element: GoldilocksField) -> u64 {
            element.to_canonical_u64()
        }

        fn hash(
            &self,
            inputs: [GoldilocksField; 8],
            capacity: [GoldilocksField; 4],
        ) -> Digest<GoldilocksField> {
            let state: [GoldilocksField; 12] =
                core::array::from_fn(|i| if i < 8 { inputs[i] } else { capacity[i - 8] });
            let out = GoldilocksField::poseidon(state);
            [out[0], out[1], out[2], out[3]]
        }
    }

}
