use crate::{
    processor::{BlobContext, Executed},
    sig,
    tree::{Db, TreeError, TreeHasher},
    tx::{batch_bytes, decode_record, BlobRecord, CompressedTx, DecodedTx, SenderRef},
    BlobBuilding, BlobError, BlobInvalid, BlobProcessor, BlobValid, Invalid, InvalidBlob,
    InvalidityCause, Valid,
};
use alloy::primitives::keccak256;
use tracing::{debug, debug_span, trace};

/// Why execution stopped early.
#[derive(Debug)]
enum Halt {
    /// The blob is invalid.
    Invalid(InvalidBlob),
    /// The tree store failed.
    Fatal(TreeError),
}

impl Halt {
    fn invalid(index: usize, cause: impl Into<InvalidityCause>) -> Self {
        Self::Invalid(InvalidBlob::new(index, cause))
    }
}

impl<D, H> BlobBuilding<D, H>
where
    D: Db<H::F>,
    H: TreeHasher,
{
    /// Append a record to the queue. Records are executed in the order they
    /// are added.
    pub fn add_tx_to_blob(&mut self, tx: CompressedTx) {
        trace!(index = self.inner.queue.len(), len = tx.compressed.len(), "record queued");
        self.inner.queue.push(tx);
    }

    /// The records queued so far.
    pub fn queued(&self) -> &[CompressedTx] {
        &self.inner.queue
    }

    /// Execute every queued record in order.
    ///
    /// Stops at the first decode failure, bad signature, or structural
    /// problem, and returns a [`BlobInvalid`]. The failing record leaves no
    /// trace in the account index or the batches. Otherwise returns a
    /// [`BlobValid`].
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::Tree`] if the tree store is inconsistent. The
    /// processor is consumed.
    pub fn execute_txs(mut self) -> Result<Executed<D, H>, BlobError> {
        let span = debug_span!(
            "execute_txs",
            records = self.inner.queue.len(),
            chain_id = self.inner.global.chain_id,
            old_num_blob = self.inner.global.old_num_blob,
        );
        let _enter = span.enter();

        let queue = core::mem::take(&mut self.inner.queue);
        let outcome = queue
            .iter()
            .enumerate()
            .try_for_each(|(index, tx)| self.inner.process(index, tx))
            .and_then(|()| self.inner.finish(queue.len()));
        self.inner.queue = queue;

        match outcome {
            Ok(()) => {
                debug!(
                    batches = self.inner.batches.len(),
                    accounts = self.inner.accounts.len(),
                    acc = %self.inner.batches.acc(),
                    "blob executed"
                );
                Ok(Executed::Valid(BlobValid { inner: self.inner, state: Valid::new() }))
            }
            Err(Halt::Invalid(reason)) => Ok(Executed::Invalid(self.invalidate(reason))),
            Err(Halt::Fatal(err)) => Err(err.into()),
        }
    }

    fn invalidate(self, reason: InvalidBlob) -> BlobInvalid<D, H> {
        debug!(index = reason.index, cause = %reason.cause, "blob invalid");
        BlobProcessor { inner: self.inner, state: Invalid { reason } }
    }
}

impl<D, H> BlobContext<D, H>
where
    D: Db<H::F>,
    H: TreeHasher,
{
    fn process(&mut self, index: usize, tx: &CompressedTx) -> Result<(), Halt> {
        match decode_record(&tx.compressed).map_err(|err| Halt::invalid(index, err))? {
            BlobRecord::BatchStart => {
                self.batches
                    .close(self.config.empty_batches)
                    .map_err(|cause| Halt::invalid(index, cause))?;
                let sequence_number = self.batches.open_batch();
                trace!(index, sequence_number, "batch opened");
                Ok(())
            }
            BlobRecord::Transaction(decoded) => self.apply_tx(index, tx, &decoded),
        }
    }

    fn apply_tx(
        &mut self,
        index: usize,
        tx: &CompressedTx,
        decoded: &DecodedTx,
    ) -> Result<(), Halt> {
        let sender = match decoded.sender {
            SenderRef::Address(address) => address,
            SenderRef::Index(slot) => self
                .accounts
                .address_at(slot)
                .ok_or_else(|| Halt::invalid(index, InvalidityCause::UnknownAccount(slot)))?,
        };
        if !self.batches.is_open() {
            return Err(Halt::invalid(index, InvalidityCause::OutsideBatch));
        }

        // nothing is written until the signature checks out
        let assignment = self.accounts.plan(sender).map_err(Halt::Fatal)?;
        let payload = decoded.signing_payload(self.global.chain_id);
        let signature =
            sig::signature(tx.v, tx.r, tx.s).map_err(|err| Halt::invalid(index, err))?;
        sig::check(&keccak256(&payload), &signature, sender)
            .map_err(|err| Halt::invalid(index, err))?;

        let slot = self.accounts.resolve(sender).map_err(Halt::Fatal)?;
        debug_assert_eq!(slot, assignment.slot());
        let length = self
            .batches
            .append(&batch_bytes(&payload, &signature))
            .ok_or_else(|| Halt::invalid(index, InvalidityCause::OutsideBatch))?;

        trace!(
            index,
            %sender,
            slot,
            new_account = assignment.is_new(),
            length,
            "transaction accumulated"
        );
        Ok(())
    }

    fn finish(&mut self, end: usize) -> Result<(), Halt> {
        self.batches
            .close(self.config.empty_batches)
            .map(|_| ())
            .map_err(|cause| Halt::invalid(end, cause))
    }
}

#[cfg(test)]
mod test {
    use crate::{
        test_utils::{
            batch_start, signed_tx, test_processor, test_processor_with_config, test_signer,
            transfer, TEST_CHAIN_ID,
        },
        tree::{KeccakHasher, MemoryDb},
        tx::{encode_record, BlobRecord, CompressedTx, SenderRef},
        BatchAccumulator, BlobConfig, EmptyBatchPolicy, Executed, InvalidityCause,
    };
    use alloy::primitives::{keccak256, Bytes, B256};

    fn execute(records: Vec<CompressedTx>) -> Executed<MemoryDb<u64>, KeccakHasher> {
        let mut processor = test_processor();
        for record in records {
            processor.add_tx_to_blob(record);
        }
        processor.execute_txs().unwrap()
    }

    #[test]
    fn single_transaction() {
        let alice = test_signer(1);
        let tx = transfer(SenderRef::Address(alice.address()), 0);

        let Executed::Valid(blob) = execute(vec![batch_start(), signed_tx(&alice, &tx)]) else {
            panic!("expected a valid blob")
        };
        assert_eq!(blob.pending_batches().len(), 1);
        assert_eq!(blob.pending_batches()[0].length(), 1);
        assert_eq!(blob.pending_accounts().slot_of(&alice.address()), Some(0));

        let payload = tx.signing_payload(TEST_CHAIN_ID);
        let expected_hash = keccak256(&blob.pending_batches()[0].data()[..]);
        assert_eq!(&blob.pending_batches()[0].data()[..payload.len()], &payload[..]);
        assert_eq!(blob.pending_batches()[0].data().len(), payload.len() + 65);
        assert_eq!(blob.pending_batches()[0].batch_hash(), Some(expected_hash));
        assert_eq!(
            blob.pending_acc_batch_hash_data(),
            BatchAccumulator::fold_into_acc(expected_hash, blob.global_inputs().old_acc_blob_hash)
        );
    }

    #[test]
    fn signature_mismatch() {
        let alice = test_signer(1);
        let mallory = test_signer(2);
        let tx = transfer(SenderRef::Address(alice.address()), 0);

        let Executed::Invalid(blob) = execute(vec![batch_start(), signed_tx(&mallory, &tx)])
        else {
            panic!("expected an invalid blob")
        };
        assert_eq!(blob.reason().index, 1);
        assert!(matches!(blob.reason().cause, InvalidityCause::Signature(_)));
        // the failing record left no trace
        assert!(blob.inner.accounts.is_empty());
        assert_eq!(blob.inner.accounts.root(), B256::ZERO);
        assert_eq!(blob.inner.batches.batches()[0].length(), 0);
    }

    #[test]
    fn same_sender_reuses_slot() {
        let alice = test_signer(1);
        let first = transfer(SenderRef::Address(alice.address()), 0);
        let second = transfer(SenderRef::Address(alice.address()), 1);
        let third = transfer(SenderRef::Index(0), 2);

        let Executed::Valid(blob) = execute(vec![
            batch_start(),
            signed_tx(&alice, &first),
            signed_tx(&alice, &second),
            signed_tx(&alice, &third),
        ]) else {
            panic!("expected a valid blob")
        };
        assert_eq!(blob.pending_accounts().len(), 1);
        assert_eq!(blob.pending_accounts().slot_of(&alice.address()), Some(0));
        assert_eq!(blob.pending_batches()[0].length(), 3);
    }

    #[test]
    fn consecutive_boundaries() {
        let Executed::Valid(blob) = execute(vec![batch_start(), batch_start()]) else {
            panic!("expected a valid blob")
        };
        assert_eq!(blob.pending_batches().len(), 2);
        assert!(blob.pending_batches().iter().all(|b| b.is_empty() && b.batch_hash().is_none()));
        assert_eq!(blob.pending_acc_batch_hash_data(), blob.global_inputs().old_acc_blob_hash);

        let mut processor = test_processor_with_config(
            BlobConfig::default().with_empty_batches(EmptyBatchPolicy::Reject),
        );
        processor.add_tx_to_blob(batch_start());
        processor.add_tx_to_blob(batch_start());
        let Executed::Invalid(blob) = processor.execute_txs().unwrap() else {
            panic!("expected an invalid blob")
        };
        assert_eq!(blob.reason().index, 1);
        assert!(matches!(
            blob.reason().cause,
            InvalidityCause::EmptyBatch { sequence_number: 0 }
        ));
    }

    #[test]
    fn trailing_empty_batch_is_rejected_at_end() {
        let alice = test_signer(1);
        let tx = transfer(SenderRef::Address(alice.address()), 0);

        let mut processor = test_processor_with_config(
            BlobConfig::default().with_empty_batches(EmptyBatchPolicy::Reject),
        );
        processor.add_tx_to_blob(batch_start());
        processor.add_tx_to_blob(signed_tx(&alice, &tx));
        processor.add_tx_to_blob(batch_start());
        let Executed::Invalid(blob) = processor.execute_txs().unwrap() else {
            panic!("expected an invalid blob")
        };
        assert_eq!(blob.reason().index, 3);
        assert!(matches!(
            blob.reason().cause,
            InvalidityCause::EmptyBatch { sequence_number: 1 }
        ));
    }

    #[test]
    fn transaction_before_first_boundary() {
        let alice = test_signer(1);
        let tx = transfer(SenderRef::Address(alice.address()), 0);

        let Executed::Invalid(blob) = execute(vec![signed_tx(&alice, &tx), batch_start()]) else {
            panic!("expected an invalid blob")
        };
        assert_eq!(blob.reason().index, 0);
        assert!(matches!(blob.reason().cause, InvalidityCause::OutsideBatch));
        assert!(blob.inner.batches.is_empty());
    }

    #[test]
    fn unknown_slot_reference() {
        let alice = test_signer(1);
        let tx = transfer(SenderRef::Index(0), 0);

        let Executed::Invalid(blob) = execute(vec![batch_start(), signed_tx(&alice, &tx)]) else {
            panic!("expected an invalid blob")
        };
        assert!(matches!(blob.reason().cause, InvalidityCause::UnknownAccount(0)));
    }

    #[test]
    fn malformed_record_stops_execution() {
        let alice = test_signer(1);
        let bob = test_signer(2);
        let good = transfer(SenderRef::Address(alice.address()), 0);
        let later = transfer(SenderRef::Address(bob.address()), 0);

        let garbage = CompressedTx::unsigned(Bytes::from_static(&[0x09, 0x01]));
        let Executed::Invalid(blob) = execute(vec![
            batch_start(),
            signed_tx(&alice, &good),
            garbage,
            signed_tx(&bob, &later),
        ]) else {
            panic!("expected an invalid blob")
        };
        assert_eq!(blob.reason().index, 2);
        assert!(matches!(blob.reason().cause, InvalidityCause::Decode(_)));
        assert_eq!(blob.inner.accounts.len(), 1);
        assert_eq!(blob.inner.accounts.slot_of(&bob.address()), None);
        assert_eq!(blob.records().len(), 4);
    }

    #[test]
    fn order_matters_across_batches() {
        let alice = test_signer(1);
        let bob = test_signer(2);
        let a = signed_tx(&alice, &transfer(SenderRef::Address(alice.address()), 0));
        let b = signed_tx(&bob, &transfer(SenderRef::Address(bob.address()), 0));

        let run = |records: Vec<CompressedTx>| match execute(records) {
            Executed::Valid(blob) => (
                blob.pending_acc_batch_hash_data(),
                blob.pending_accounts().iter().collect::<Vec<_>>(),
                blob.pending_tree_root(),
            ),
            Executed::Invalid(blob) => panic!("unexpected invalid blob: {}", blob.reason()),
        };

        let forward = run(vec![batch_start(), a.clone(), batch_start(), b.clone()]);
        let again = run(vec![batch_start(), a.clone(), batch_start(), b.clone()]);
        let backward = run(vec![batch_start(), b, batch_start(), a]);

        assert_eq!(forward, again);
        assert_ne!(forward.0, backward.0);
        assert_eq!(forward.1, vec![(0, alice.address()), (1, bob.address())]);
        assert_eq!(backward.1, vec![(0, bob.address()), (1, alice.address())]);
    }

    #[test]
    fn empty_queue_is_valid() {
        let Executed::Valid(blob) = execute(vec![]) else { panic!("expected a valid blob") };
        assert!(blob.pending_batches().is_empty());
        assert_eq!(blob.pending_acc_batch_hash_data(), blob.global_inputs().old_acc_blob_hash);
    }

    #[test]
    fn boundary_ignores_signature_fields() {
        let mut boundary = batch_start();
        boundary.v = 99;
        let Executed::Valid(blob) = execute(vec![boundary]) else {
            panic!("expected a valid blob")
        };
        assert_eq!(blob.pending_batches().len(), 1);
        assert_eq!(encode_record(&BlobRecord::BatchStart), batch_start().compressed);
    }
}
