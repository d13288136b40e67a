use crate::{
    tree::{Db, TreeHasher},
    BlobBuilded, BlobInvalid, BlobOutputs, BlobProcessor, BlobValid, Builded, InvalidBlob,
};
use tracing::info;

/// The result of executing a blob's records.
#[derive(Debug)]
pub enum Executed<D, H>
where
    H: TreeHasher,
{
    /// Every record executed successfully.
    Valid(BlobValid<D, H>),
    /// A record invalidated the blob.
    Invalid(BlobInvalid<D, H>),
}

impl<D, H> Executed<D, H>
where
    D: Db<H::F>,
    H: TreeHasher,
{
    /// True if the blob is invalid.
    pub const fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    /// Get the invalidity reason, if the blob is invalid.
    pub const fn reason(&self) -> Option<&InvalidBlob> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid(blob) => Some(blob.reason()),
        }
    }

    /// Build the blob, whichever way execution went.
    pub fn build(self) -> BlobBuilded<D, H> {
        match self {
            Self::Valid(blob) => blob.build(),
            Self::Invalid(blob) => blob.build(),
        }
    }
}

impl<D, H> BlobValid<D, H>
where
    D: Db<H::F>,
    H: TreeHasher,
{
    /// Build the blob, computing its outputs from the final tree root and
    /// accumulator.
    pub fn build(self) -> BlobBuilded<D, H> {
        let outputs = BlobOutputs {
            is_invalid: false,
            new_blob_root: self.inner.accounts.root(),
            acc_batch_hash_data: self.inner.batches.acc(),
            num_batches: self.inner.batches.len() as u64,
            new_num_blob: self.inner.global.old_num_blob.saturating_add(1),
        };
        info!(
            root = %outputs.new_blob_root,
            acc = %outputs.acc_batch_hash_data,
            num_batches = outputs.num_batches,
            num_blob = outputs.new_num_blob,
            "blob builded"
        );
        BlobProcessor { inner: self.inner, state: Builded { outputs, reason: None } }
    }
}

impl<D, H> BlobInvalid<D, H>
where
    D: Db<H::F>,
    H: TreeHasher,
{
    /// Get a reference to the first failure.
    pub const fn reason(&self) -> &InvalidBlob {
        &self.state.reason
    }

    /// Build the blob. The outputs carry the previous root and accumulator,
    /// and no batches.
    pub fn build(self) -> BlobBuilded<D, H> {
        let global = &self.inner.global;
        let outputs = BlobOutputs {
            is_invalid: true,
            new_blob_root: global.old_blob_root,
            acc_batch_hash_data: global.old_acc_blob_hash,
            num_batches: 0,
            new_num_blob: global.old_num_blob.saturating_add(1),
        };
        info!(
            index = self.state.reason.index,
            num_blob = outputs.new_num_blob,
            "invalid blob builded"
        );
        let Self { inner, state } = self;
        BlobProcessor { inner, state: Builded { outputs, reason: Some(state.reason) } }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        test_utils::{
            batch_start, signed_tx, test_global_inputs, test_processor, test_signer, transfer,
        },
        tx::{CompressedTx, SenderRef},
        InvalidityCause,
    };
    use alloy::primitives::Bytes;

    #[test]
    fn invalid_blob_reports_only_old_values() {
        let alice = test_signer(1);
        let tx = transfer(SenderRef::Address(alice.address()), 0);

        let mut processor = test_processor();
        processor.add_tx_to_blob(batch_start());
        processor.add_tx_to_blob(signed_tx(&alice, &tx));
        processor.add_tx_to_blob(batch_start());
        processor.add_tx_to_blob(CompressedTx::unsigned(Bytes::from_static(&[0xff])));

        let executed = processor.execute_txs().unwrap();
        assert!(executed.is_invalid());
        let reason = executed.reason().unwrap();
        assert_eq!(reason.index, 3);
        assert!(matches!(reason.cause, InvalidityCause::Decode(_)));

        // the valid prefix did change the working state
        let Executed::Invalid(blob) = executed else { panic!("expected an invalid blob") };
        assert_eq!(blob.inner.accounts.len(), 1);
        assert_eq!(blob.inner.batches.len(), 2);

        let builded = blob.build();
        let global = test_global_inputs();
        let outputs = builded.outputs();
        assert!(outputs.is_invalid);
        assert_eq!(outputs.new_blob_root, global.old_blob_root);
        assert_eq!(outputs.acc_batch_hash_data, global.old_acc_blob_hash);
        assert_eq!(outputs.num_batches, 0);
        assert_eq!(outputs.new_num_blob, global.old_num_blob + 1);
        assert_eq!(builded.reason().map(|r| r.index), Some(3));

        assert!(builded.into_db().is_err());
    }

    #[test]
    fn valid_blob_outputs_match_pending_values() {
        let alice = test_signer(1);
        let tx = transfer(SenderRef::Address(alice.address()), 0);

        let mut processor = test_processor();
        processor.add_tx_to_blob(batch_start());
        processor.add_tx_to_blob(signed_tx(&alice, &tx));
        let Executed::Valid(blob) = processor.execute_txs().unwrap() else {
            panic!("expected a valid blob")
        };
        let root = blob.pending_tree_root();
        let acc = blob.pending_acc_batch_hash_data();
        let batches = blob.pending_batches().len() as u64;

        let builded = Executed::Valid(blob).build();
        assert!(builded.reason().is_none());
        assert_eq!(builded.outputs().new_blob_root, root);
        assert_eq!(builded.outputs().acc_batch_hash_data, acc);
        assert_eq!(builded.outputs().num_batches, batches);
    }
}
