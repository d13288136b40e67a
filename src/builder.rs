use crate::{
    accounts::AccountIndex,
    batch::BatchAccumulator,
    config::BlobConfig,
    inputs::{GlobalInputs, PrivateInputs},
    processor::{BlobContext, BlobProcessor},
    tree::{BufferedDb, Db, DefaultHasher, Smt, TreeError, TreeHasher},
    BlobBuilding, Building, EmptyBatchPolicy,
};
use tracing::debug;

/// Error that can occur when building a [`BlobProcessor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum BuilderError {
    /// Global inputs not set.
    #[error("global inputs not set")]
    GlobalInputsNotSet,
    /// Private inputs not set.
    #[error("private inputs not set")]
    PrivateInputsNotSet,
    /// The account tree could not be opened at the old blob root.
    #[error("failed to open account tree: {0}")]
    Tree(#[from] TreeError),
}

#[allow(unnameable_types)]
#[derive(Debug, Copy, Clone)]
pub struct BuilderNeedsDb {
    _private: (),
}

#[allow(unnameable_types)]
#[derive(Debug, Copy, Clone)]
pub struct BuilderReady<D> {
    db: D,
}

/// A builder for [`BlobProcessor`].
#[derive(Debug, Clone)]
pub struct BlobProcessorBuilder<H = DefaultHasher, State = BuilderNeedsDb> {
    pub(crate) hasher: H,
    pub(crate) global: Option<GlobalInputs>,
    pub(crate) private: Option<PrivateInputs>,
    pub(crate) config: BlobConfig,
    pub(crate) state: State,
}

impl BlobProcessorBuilder {
    /// Create a new builder with the [`DefaultHasher`] and the default
    /// configuration.
    #[allow(clippy::new_without_default)] // default would make bad devex :(
    pub const fn new() -> Self {
        Self {
            #[cfg(feature = "poseidon")]
            hasher: crate::tree::PoseidonHasher,
            #[cfg(not(feature = "poseidon"))]
            hasher: crate::tree::KeccakHasher,
            global: None,
            private: None,
            config: BlobConfig { empty_batches: EmptyBatchPolicy::Allow },
            state: BuilderNeedsDb { _private: () },
        }
    }
}

impl<H, State> BlobProcessorBuilder<H, State> {
    /// Set the tree node store. The processor buffers every write, so the
    /// store is only read until the caller commits.
    pub fn with_db<D>(self, db: D) -> BlobProcessorBuilder<H, BuilderReady<D>> {
        BlobProcessorBuilder {
            hasher: self.hasher,
            global: self.global,
            private: self.private,
            config: self.config,
            state: BuilderReady { db },
        }
    }

    /// Set the tree hasher.
    pub fn with_hasher<OH>(self, hasher: OH) -> BlobProcessorBuilder<OH, State> {
        BlobProcessorBuilder {
            hasher,
            global: self.global,
            private: self.private,
            config: self.config,
            state: self.state,
        }
    }

    /// Set the global inputs.
    pub const fn with_global_inputs(mut self, global: GlobalInputs) -> Self {
        self.global = Some(global);
        self
    }

    /// Set the private inputs.
    pub const fn with_private_inputs(mut self, private: PrivateInputs) -> Self {
        self.private = Some(private);
        self
    }

    /// Set the configuration.
    pub const fn with_config(mut self, config: BlobConfig) -> Self {
        self.config = config;
        self
    }
}

impl<H, D> BlobProcessorBuilder<H, BuilderReady<D>>
where
    H: TreeHasher,
    D: Db<H::F>,
{
    /// Build the processor. Opens the account tree at the old blob root and
    /// loads the account index from it.
    pub fn build(self) -> Result<BlobBuilding<D, H>, BuilderError> {
        let global = self.global.ok_or(BuilderError::GlobalInputsNotSet)?;
        let private = self.private.ok_or(BuilderError::PrivateInputsNotSet)?;

        let db = BufferedDb::new(self.state.db);
        let tree = Smt::with_root(db, self.hasher, global.old_blob_root)?;
        let accounts = AccountIndex::load(tree)?;
        debug!(root = %global.old_blob_root, accounts = accounts.len(), "blob processor ready");

        let inner = BlobContext {
            global,
            private,
            config: self.config,
            queue: Vec::new(),
            accounts,
            batches: BatchAccumulator::new(global.old_acc_blob_hash),
        };
        Ok(BlobProcessor { inner: Box::new(inner), state: Building::new() })
    }
}
