use crate::{
    tree::{BufferedDb, Db, TreeHasher},
    BlobBuilded, BlobBuilding, BlobError, BlobInvalid, BlobOutputs, BlobValid, CompressedTx,
    Executed, Operation, StateViolation,
};
use core::mem;
use tracing::debug;

/// A blob processor whose state is checked at runtime.
///
/// This wraps the typestate [`BlobProcessor`] for callers that hold a single
/// long-lived handle and drive it by method calls, e.g. behind a service
/// boundary. Every operation checks the current state first and fails with
/// [`BlobError::InvalidState`] naming the violated precondition.
///
/// A [`BlobError::Tree`] during execution moves the blob to
/// [`Blob::Aborted`], where every operation fails.
///
/// [`BlobProcessor`]: crate::BlobProcessor
#[derive(Debug)]
pub enum Blob<D, H>
where
    H: TreeHasher,
{
    /// Accepting records.
    Building(BlobBuilding<D, H>),
    /// Executed, every record valid.
    Valid(BlobValid<D, H>),
    /// Executed, a record invalidated the blob.
    Invalid(BlobInvalid<D, H>),
    /// Builded. Terminal.
    Builded(BlobBuilded<D, H>),
    /// Execution hit a storage error. Terminal.
    Aborted,
}

impl<D, H> From<BlobBuilding<D, H>> for Blob<D, H>
where
    H: TreeHasher,
{
    fn from(processor: BlobBuilding<D, H>) -> Self {
        Self::Building(processor)
    }
}

impl<D, H> From<Executed<D, H>> for Blob<D, H>
where
    H: TreeHasher,
{
    fn from(executed: Executed<D, H>) -> Self {
        match executed {
            Executed::Valid(processor) => Self::Valid(processor),
            Executed::Invalid(processor) => Self::Invalid(processor),
        }
    }
}

impl<D, H> Blob<D, H>
where
    D: Db<H::F>,
    H: TreeHasher,
{
    /// The name of the current state.
    pub const fn state_name(&self) -> &'static str {
        match self {
            Self::Building(_) => "building",
            Self::Valid(_) => "valid",
            Self::Invalid(_) => "invalid",
            Self::Builded(_) => "builded",
            Self::Aborted => "aborted",
        }
    }

    /// True if execution found an invalid record. Never cleared once set.
    pub const fn is_invalid(&self) -> bool {
        match self {
            Self::Invalid(_) => true,
            Self::Builded(processor) => processor.is_invalid(),
            _ => false,
        }
    }

    /// True once the blob is builded.
    pub const fn is_builded(&self) -> bool {
        matches!(self, Self::Builded(_))
    }

    /// Fail if the blob is already builded.
    pub const fn ensure_not_builded(&self, op: Operation) -> Result<(), BlobError> {
        match self {
            Self::Builded(_) => Err(BlobError::InvalidState(StateViolation::AlreadyBuilded(op))),
            Self::Aborted => Err(BlobError::InvalidState(StateViolation::Aborted(op))),
            _ => Ok(()),
        }
    }

    /// Fail if the blob is not builded yet.
    pub const fn ensure_builded(&self, op: Operation) -> Result<(), BlobError> {
        match self.builded(op) {
            Ok(_) => Ok(()),
            Err(err) => Err(err),
        }
    }

    const fn builded(&self, op: Operation) -> Result<&BlobBuilded<D, H>, BlobError> {
        match self {
            Self::Builded(processor) => Ok(processor),
            Self::Aborted => Err(BlobError::InvalidState(StateViolation::Aborted(op))),
            _ => Err(BlobError::InvalidState(StateViolation::NotBuilded(op))),
        }
    }

    /// Append a record to the queue.
    pub fn add_tx_to_blob(&mut self, tx: CompressedTx) -> Result<(), BlobError> {
        self.ensure_not_builded(Operation::AddTx)?;
        match self {
            Self::Building(processor) => {
                processor.add_tx_to_blob(tx);
                Ok(())
            }
            _ => Err(StateViolation::AlreadyExecuted(Operation::AddTx).into()),
        }
    }

    /// Execute the queued records. See [`BlobBuilding::execute_txs`].
    pub fn execute_txs(&mut self) -> Result<(), BlobError> {
        self.ensure_not_builded(Operation::ExecuteTxs)?;
        match mem::replace(self, Self::Aborted) {
            Self::Building(processor) => {
                // stays aborted if this fails
                *self = processor.execute_txs()?.into();
                Ok(())
            }
            other => {
                *self = other;
                Err(StateViolation::AlreadyExecuted(Operation::ExecuteTxs).into())
            }
        }
    }

    /// Build the blob and return its outputs.
    pub fn build(&mut self) -> Result<&BlobOutputs, BlobError> {
        self.ensure_not_builded(Operation::Build)?;
        let builded = match mem::replace(self, Self::Aborted) {
            Self::Valid(processor) => processor.build(),
            Self::Invalid(processor) => processor.build(),
            other => {
                *self = other;
                return Err(StateViolation::NotExecuted(Operation::Build).into());
            }
        };
        debug!(invalid = builded.is_invalid(), "blob builded");
        *self = Self::Builded(builded);
        self.outputs()
    }

    /// Get the final outputs.
    pub fn outputs(&self) -> Result<&BlobOutputs, BlobError> {
        self.builded(Operation::ReadOutputs).map(BlobBuilded::outputs)
    }

    /// Release the buffered tree writes of a valid, builded blob. See
    /// [`BlobBuilded::into_db`].
    pub fn into_db(self) -> Result<BufferedDb<D, H::F>, BlobError> {
        self.builded(Operation::ReleaseWrites)?;
        match self {
            Self::Builded(processor) => processor.into_db(),
            _ => Err(StateViolation::NotBuilded(Operation::ReleaseWrites).into()),
        }
    }

    /// Get the builded processor.
    pub fn into_builded(self) -> Result<BlobBuilded<D, H>, BlobError> {
        self.builded(Operation::ReadOutputs)?;
        match self {
            Self::Builded(processor) => Ok(processor),
            _ => Err(StateViolation::NotBuilded(Operation::ReadOutputs).into()),
        }
    }
}
