use crate::tree::{Digest, Node};
use std::{collections::HashMap, hash::Hash};

/// Key-value store for tree nodes, keyed by node digest.
///
/// Implementations are opaque to the processor. They are handed to the
/// builder, wrapped in a [`BufferedDb`], and only written to when the caller
/// commits the buffer after a successful build.
pub trait Db<F> {
    /// Get the node stored under the digest, if any.
    fn get_node(&self, key: &Digest<F>) -> Option<Node<F>>;

    /// Store a node under its digest, overwriting any existing node.
    fn set_node(&mut self, key: Digest<F>, node: Node<F>);
}

/// A [`Db`] backed by a [`HashMap`].
#[derive(Debug, Clone)]
pub struct MemoryDb<F> {
    nodes: HashMap<Digest<F>, Node<F>>,
}

impl<F> Default for MemoryDb<F> {
    fn default() -> Self {
        Self { nodes: HashMap::new() }
    }
}

impl<F> MemoryDb<F> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if no nodes are stored.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<F> Db<F> for MemoryDb<F>
where
    F: Copy + Eq + Hash,
{
    fn get_node(&self, key: &Digest<F>) -> Option<Node<F>> {
        self.nodes.get(key).copied()
    }

    fn set_node(&mut self, key: Digest<F>, node: Node<F>) {
        self.nodes.insert(key, node);
    }
}

/// A transient write buffer layered over a [`Db`].
///
/// Reads check the buffer first, then the backing store. Writes only touch
/// the buffer. The backing store is unchanged until [`BufferedDb::commit`]
/// is called.
#[derive(Debug, Clone)]
pub struct BufferedDb<D, F> {
    inner: D,
    pending: HashMap<Digest<F>, Node<F>>,
}

impl<D, F> BufferedDb<D, F> {
    /// Wrap a backing store with an empty buffer.
    pub fn new(inner: D) -> Self {
        Self { inner, pending: HashMap::new() }
    }

    /// Get a reference to the backing store.
    pub const fn inner(&self) -> &D {
        &self.inner
    }

    /// Number of buffered writes.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop all buffered writes and return the backing store untouched.
    pub fn discard(self) -> D {
        self.inner
    }
}

impl<D, F> BufferedDb<D, F>
where
    D: Db<F>,
{
    /// Flush all buffered writes into the backing store and return it.
    pub fn commit(self) -> D {
        let Self { mut inner, pending } = self;
        for (key, node) in pending {
            inner.set_node(key, node);
        }
        inner
    }
}

impl<D, F> Db<F> for BufferedDb<D, F>
where
    D: Db<F>,
    F: Copy + Eq + Hash,
{
    fn get_node(&self, key: &Digest<F>) -> Option<Node<F>> {
        self.pending.get(key).copied().or_else(|| self.inner.get_node(key))
    }

    fn set_node(&mut self, key: Digest<F>, node: Node<F>) {
        self.pending.insert(key, node);
    }
}
