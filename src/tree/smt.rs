use crate::tree::{Db, Digest, Node, TreeHasher};
use alloy::primitives::{B256, U256};
use tracing::trace;

/// Depth of the tree. Keys are `u64`, one level per bit.
pub const SMT_DEPTH: usize = 64;

/// Errors raised by the [`Smt`] when its backing store is inconsistent with
/// its root.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    /// A node reachable from the root is absent from the store.
    #[error("node {digest} is missing from the store")]
    MissingNode {
        /// The digest of the missing node.
        digest: B256,
    },

    /// A leaf node does not carry the leaf marker, or stores a different key
    /// than its position in the tree.
    #[error("malformed leaf {digest} at key {key}")]
    MalformedLeaf {
        /// The digest of the leaf.
        digest: B256,
        /// The key being looked up.
        key: u64,
    },

    /// A leaf decodes to a value its owner does not accept.
    #[error("key {key} holds a malformed value")]
    MalformedValue {
        /// The key holding the value.
        key: u64,
    },

    /// Every account slot is assigned.
    #[error("no account slot left")]
    SlotsExhausted,
}

/// Sparse Merkle tree with `u64` keys and [`U256`] values.
///
/// The tree has a fixed depth of [`SMT_DEPTH`]. Bit `i` of the key (least
/// significant first) selects the child at level `i`. Empty subtrees hash to
/// the zero digest, so setting a key to zero removes it, and the root of an
/// empty tree is zero.
///
/// Node layout in the store:
/// - internal: `[left(4), right(4), 0, 0, 0, 0]`
/// - leaf: `[key_lo, key_hi, 0, 0, value_hash(4), 1, 0, 0, 0]`
/// - value: `[limbs(8), 0, 0, 0, 0]` with 32-bit little-endian limbs
///
/// Leaves are hashed with capacity `[1, 0, 0, 0]`, everything else with a
/// zero capacity.
#[derive(Debug, Clone)]
pub struct Smt<D, H>
where
    H: TreeHasher,
{
    db: D,
    hasher: H,
    root: Digest<H::F>,
}

impl<D, H> Smt<D, H>
where
    D: Db<H::F>,
    H: TreeHasher,
{
    /// Create an empty tree.
    pub fn new(db: D, hasher: H) -> Self {
        let root = hasher.zero_digest();
        Self { db, hasher, root }
    }

    /// Open a tree at an existing root. The root must be zero, or present in
    /// the store.
    pub fn with_root(db: D, hasher: H, root: B256) -> Result<Self, TreeError> {
        let root = hasher.b256_to_digest(root);
        let smt = Self { db, hasher, root };
        if !smt.is_zero(&smt.root) {
            smt.node(&smt.root)?;
        }
        Ok(smt)
    }

    /// The current root digest.
    pub const fn root(&self) -> Digest<H::F> {
        self.root
    }

    /// The current root packed into a [`B256`].
    pub fn root_b256(&self) -> B256 {
        self.hasher.digest_to_b256(self.root)
    }

    /// Get a reference to the hasher.
    pub const fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Get a reference to the backing store.
    pub const fn db(&self) -> &D {
        &self.db
    }

    /// Destructure the tree into its backing store.
    pub fn into_db(self) -> D {
        self.db
    }

    /// Get the value stored under the key. Absent keys read as zero.
    pub fn get(&self, key: u64) -> Result<U256, TreeError> {
        let mut cursor = self.root;
        for level in 0..SMT_DEPTH {
            if self.is_zero(&cursor) {
                return Ok(U256::ZERO);
            }
            let (left, right) = split(&self.node(&cursor)?);
            cursor = if bit(key, level) { right } else { left };
        }
        if self.is_zero(&cursor) {
            return Ok(U256::ZERO);
        }

        let leaf = self.node(&cursor)?;
        let one = self.hasher.from_u64(1);
        if leaf[8] != one || leaf[0..4] != self.key_elements(key) {
            return Err(TreeError::MalformedLeaf {
                digest: self.hasher.digest_to_b256(cursor),
                key,
            });
        }
        let value_hash = [leaf[4], leaf[5], leaf[6], leaf[7]];
        let value = self.node(&value_hash)?;
        Ok(self.limbs_to_value(&value))
    }

    /// Set the value stored under the key. Setting zero removes the key.
    pub fn set(&mut self, key: u64, value: U256) -> Result<(), TreeError> {
        let mut siblings = Vec::with_capacity(SMT_DEPTH);
        let mut cursor = self.root;
        for level in 0..SMT_DEPTH {
            let (left, right) = if self.is_zero(&cursor) {
                (self.hasher.zero_digest(), self.hasher.zero_digest())
            } else {
                split(&self.node(&cursor)?)
            };
            if bit(key, level) {
                siblings.push(left);
                cursor = right;
            } else {
                siblings.push(right);
                cursor = left;
            }
        }

        let mut digest =
            if value.is_zero() { self.hasher.zero_digest() } else { self.hash_leaf(key, value) };
        for (level, sibling) in siblings.into_iter().enumerate().rev() {
            digest = if bit(key, level) {
                self.hash_internal(sibling, digest)
            } else {
                self.hash_internal(digest, sibling)
            };
        }

        trace!(key, %value, root = %self.hasher.digest_to_b256(digest), "tree updated");
        self.root = digest;
        Ok(())
    }

    fn node(&self, digest: &Digest<H::F>) -> Result<Node<H::F>, TreeError> {
        self.db
            .get_node(digest)
            .ok_or_else(|| TreeError::MissingNode { digest: self.hasher.digest_to_b256(*digest) })
    }

    fn is_zero(&self, digest: &Digest<H::F>) -> bool {
        *digest == self.hasher.zero_digest()
    }

    fn key_elements(&self, key: u64) -> [H::F; 4] {
        let zero = self.hasher.from_u64(0);
        [self.hasher.from_u64(key & 0xffff_ffff), self.hasher.from_u64(key >> 32), zero, zero]
    }

    fn value_to_limbs(&self, value: U256) -> [H::F; 8] {
        let words = value.into_limbs();
        core::array::from_fn(|i| {
            let word = words[i / 2];
            self.hasher.from_u64(if i % 2 == 0 { word & 0xffff_ffff } else { word >> 32 })
        })
    }

    fn limbs_to_value(&self, node: &Node<H::F>) -> U256 {
        let words = core::array::from_fn(|i| {
            self.hasher.to_u64(node[2 * i]) | (self.hasher.to_u64(node[2 * i + 1]) << 32)
        });
        U256::from_limbs(words)
    }

    fn hash_internal(&mut self, left: Digest<H::F>, right: Digest<H::F>) -> Digest<H::F> {
        if self.is_zero(&left) && self.is_zero(&right) {
            return self.hasher.zero_digest();
        }
        let zero = self.hasher.from_u64(0);
        let inputs = [left[0], left[1], left[2], left[3], right[0], right[1], right[2], right[3]];
        let digest = self.hasher.hash(inputs, [zero; 4]);
        self.db.set_node(digest, pad(inputs, [zero; 4]));
        digest
    }

    fn hash_leaf(&mut self, key: u64, value: U256) -> Digest<H::F> {
        let zero = self.hasher.from_u64(0);
        let one = self.hasher.from_u64(1);

        let limbs = self.value_to_limbs(value);
        let value_hash = self.hasher.hash(limbs, [zero; 4]);
        self.db.set_node(value_hash, pad(limbs, [zero; 4]));

        let k = self.key_elements(key);
        let inputs =
            [k[0], k[1], k[2], k[3], value_hash[0], value_hash[1], value_hash[2], value_hash[3]];
        let capacity = [one, zero, zero, zero];
        let digest = self.hasher.hash(inputs, capacity);
        self.db.set_node(digest, pad(inputs, capacity));
        digest
    }
}

const fn bit(key: u64, level: usize) -> bool {
    (key >> level) & 1 == 1
}

fn split<F: Copy>(node: &Node<F>) -> (Digest<F>, Digest<F>) {
    ([node[0], node[1], node[2], node[3]], [node[4], node[5], node[6], node[7]])
}

fn pad<F: Copy>(inputs: [F; 8], tail: [F; 4]) -> Node<F> {
    core::array::from_fn(|i| if i < 8 { inputs[i] } else { tail[i - 8] })
}
