use crate::{
    accounts::AccountIndex,
    batch::{Batch, BatchAccumulator},
    config::BlobConfig,
    inputs::{GlobalInputs, PrivateInputs},
    tree::{BufferedDb, Db, TreeHasher},
    tx::CompressedTx,
    Building, InProgress,
};
use alloy::primitives::B256;
use core::fmt;

/// The account index as seen by a processor: every tree write is buffered.
pub type BlobAccounts<D, H> = AccountIndex<BufferedDb<D, <H as TreeHasher>::F>, H>;

/// Processes the records of one blob, using the typestate pattern.
///
/// See the [crate-level documentation](crate) for more information.
pub struct BlobProcessor<D, H, State = Building>
where
    H: TreeHasher,
{
    pub(crate) inner: Box<BlobContext<D, H>>,
    pub(crate) state: State,
}

impl<D, H, State> fmt::Debug for BlobProcessor<D, H, State>
where
    H: TreeHasher,
    State: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobProcessor").field("state", &self.state).finish_non_exhaustive()
    }
}

/// Everything a processor owns, in every state.
pub(crate) struct BlobContext<D, H>
where
    H: TreeHasher,
{
    pub(crate) global: GlobalInputs,
    pub(crate) private: PrivateInputs,
    pub(crate) config: BlobConfig,
    pub(crate) queue: Vec<CompressedTx>,
    pub(crate) accounts: BlobAccounts<D, H>,
    pub(crate) batches: BatchAccumulator,
}

impl<D, H, State> BlobProcessor<D, H, State>
where
    D: Db<H::F>,
    H: TreeHasher,
{
    /// Get a reference to the global inputs.
    pub fn global_inputs(&self) -> &GlobalInputs {
        &self.inner.global
    }

    /// Get a reference to the private inputs.
    pub fn private_inputs(&self) -> &PrivateInputs {
        &self.inner.private
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &BlobConfig {
        &self.inner.config
    }

    /// The records submitted so far, in submission order.
    pub fn records(&self) -> &[CompressedTx] {
        &self.inner.queue
    }
}

impl<D, H, State> BlobProcessor<D, H, State>
where
    D: Db<H::F>,
    H: TreeHasher,
    State: InProgress,
{
    /// Get a reference to the account index, including slots assigned by
    /// this blob. Nothing here is final until the blob is builded.
    pub fn pending_accounts(&self) -> &BlobAccounts<D, H> {
        &self.inner.accounts
    }

    /// The batches assembled so far, in order.
    pub fn pending_batches(&self) -> &[Batch] {
        self.inner.batches.batches()
    }

    /// The accumulator hash after the batches closed so far.
    pub fn pending_acc_batch_hash_data(&self) -> B256 {
        self.inner.batches.acc()
    }

    /// The root of the account tree, including buffered writes.
    pub fn pending_tree_root(&self) -> B256 {
        self.inner.accounts.root()
    }
}
