use crate::tree::{Db, Digest, Node};
use dashmap::DashMap;
use std::{hash::Hash, sync::Arc};

/// A [`Db`] backed by a shared [`DashMap`].
///
/// Clones share the same map. Several processors may read from one backing
/// store at once, each buffering its own writes, and commit independently
/// once their blobs are builded.
#[derive(Debug)]
pub struct ConcurrentMemoryDb<F>
where
    F: Eq + Hash,
{
    nodes: Arc<DashMap<Digest<F>, Node<F>>>,
}

impl<F> Clone for ConcurrentMemoryDb<F>
where
    F: Eq + Hash,
{
    fn clone(&self) -> Self {
        Self { nodes: Arc::clone(&self.nodes) }
    }
}

impl<F> Default for ConcurrentMemoryDb<F>
where
    F: Eq + Hash,
{
    fn default() -> Self {
        Self { nodes: Arc::new(DashMap::new()) }
    }
}

impl<F> ConcurrentMemoryDb<F>
where
    F: Eq + Hash,
{
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

    /// Number of handles sharing this store.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.nodes)
    }
}

impl<F> Db<F> for ConcurrentMemoryDb<F>
where
    F: Copy + Eq + Hash,
{
    fn get_node(&self, key: &Digest<F>) -> Option<Node<F>> {
        self.nodes.get(key).map(|node| *node.value())
    }

    fn set_node(&mut self, key: Digest<F>, node: Node<F>) {
        self.nodes.insert(key, node);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        test_utils::{
            batch_start, signed_tx, test_global_inputs, test_private_inputs, test_signer, transfer,
        },
        tree::{DefaultHasher, Smt},
        tx::SenderRef,
        AccountIndex, BlobProcessorBuilder, Executed, GlobalInputs,
    };

    #[test]
    fn clones_share_nodes() {
        let mut a = ConcurrentMemoryDb::<u64>::new();
        let b = a.clone();
        assert_eq!(a.handle_count(), 2);

        a.set_node([7; 4], [7; 12]);
        assert_eq!(b.get_node(&[7; 4]), Some([7; 12]));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn commit_is_visible_to_other_handles() {
        let shared = ConcurrentMemoryDb::new();
        let alice = test_signer(1);

        let mut processor = BlobProcessorBuilder::new()
            .with_db(shared.clone())
            .with_global_inputs(test_global_inputs())
            .with_private_inputs(test_private_inputs())
            .build()
            .unwrap();
        processor.add_tx_to_blob(batch_start());
        let tx = transfer(SenderRef::Address(alice.address()), 0);
        processor.add_tx_to_blob(signed_tx(&alice, &tx));
        let Executed::Valid(blob) = processor.execute_txs().unwrap() else {
            panic!("expected a valid blob")
        };
        let builded = blob.build();
        let root = builded.outputs().new_blob_root;

        assert!(shared.is_empty());
        builded.into_db().unwrap().commit();
        assert!(!shared.is_empty());

        // the next blob starts from the committed root
        let next = BlobProcessorBuilder::new()
            .with_db(shared.clone())
            .with_global_inputs(GlobalInputs { old_blob_root: root, ..test_global_inputs() })
            .with_private_inputs(test_private_inputs())
            .build()
            .unwrap();
        assert_eq!(next.pending_accounts().slot_of(&alice.address()), Some(0));

        let tree = Smt::with_root(shared, DefaultHasher::default(), root).unwrap();
        assert_eq!(AccountIndex::load(tree).unwrap().len(), 1);
    }
}
