use crate::{sig::SignatureError, tree::TreeError, tx::TxDecodeError};
use core::fmt;

/// An operation on a blob processor, named in state errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Appending a record to the queue.
    AddTx,
    /// Executing the queue.
    ExecuteTxs,
    /// Building the blob.
    Build,
    /// Reading the final outputs.
    ReadOutputs,
    /// Releasing the buffered tree writes.
    ReleaseWrites,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AddTx => "addTxToBlob",
            Self::ExecuteTxs => "executeTxs",
            Self::Build => "build",
            Self::ReadOutputs => "read outputs",
            Self::ReleaseWrites => "release writes",
        };
        f.write_str(name)
    }
}

/// The precondition an operation violated.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateViolation {
    /// The blob is already builded.
    #[error("cannot {0}: blob is already builded")]
    AlreadyBuilded(Operation),
    /// The blob is not builded yet.
    #[error("cannot {0}: blob is not builded")]
    NotBuilded(Operation),
    /// The queue was already executed.
    #[error("cannot {0}: transactions were already executed")]
    AlreadyExecuted(Operation),
    /// The queue was not executed yet.
    #[error("cannot {0}: transactions were not executed")]
    NotExecuted(Operation),
    /// The blob is invalid.
    #[error("cannot {0}: blob is invalid")]
    InvalidBlob(Operation),
    /// A previous operation failed with a storage error.
    #[error("cannot {0}: processing was aborted")]
    Aborted(Operation),
}

impl StateViolation {
    /// The operation that was attempted.
    pub const fn operation(&self) -> Operation {
        match self {
            Self::AlreadyBuilded(op)
            | Self::NotBuilded(op)
            | Self::AlreadyExecuted(op)
            | Self::NotExecuted(op)
            | Self::InvalidBlob(op)
            | Self::Aborted(op) => *op,
        }
    }
}

/// Errors returned by blob processing operations.
///
/// Protocol invalidity is not an error. It is reported through
/// [`BlobInvalid`] and [`BlobOutputs::is_invalid`].
///
/// [`BlobInvalid`]: crate::BlobInvalid
/// [`BlobOutputs::is_invalid`]: crate::BlobOutputs::is_invalid
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobError {
    /// The operation is not allowed in the current state.
    #[error(transparent)]
    InvalidState(#[from] StateViolation),
    /// The account tree's store is inconsistent.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl BlobError {
    /// True if this is a state violation.
    pub const fn is_state_violation(&self) -> bool {
        matches!(self, Self::InvalidState(_))
    }

    /// Get the state violation, if this is one.
    pub const fn as_state_violation(&self) -> Option<&StateViolation> {
        match self {
            Self::InvalidState(violation) => Some(violation),
            Self::Tree(_) => None,
        }
    }
}

/// Why a blob is invalid.
#[derive(thiserror::Error, Debug)]
pub enum InvalidityCause {
    /// The record could not be decoded.
    #[error(transparent)]
    Decode(#[from] TxDecodeError),
    /// The signature is malformed or was not produced by the claimed sender.
    #[error(transparent)]
    Signature(#[from] SignatureError),
    /// The sender refers to a slot that has not been assigned.
    #[error("sender refers to unassigned slot {0}")]
    UnknownAccount(u32),
    /// A transaction appeared before the first boundary record.
    #[error("transaction outside of a batch")]
    OutsideBatch,
    /// A batch closed without transactions while empty batches are rejected.
    #[error("batch {sequence_number} is empty")]
    EmptyBatch {
        /// The sequence number of the empty batch.
        sequence_number: u64,
    },
}

/// The first failure in a blob.
#[derive(thiserror::Error, Debug)]
#[error("record {index} invalidated the blob: {cause}")]
pub struct InvalidBlob {
    /// Position of the failing record in the queue. Equal to the queue length
    /// if the failure was found after the last record.
    pub index: usize,
    /// What went wrong.
    pub cause: InvalidityCause,
}

impl InvalidBlob {
    /// Create a new invalidity record.
    pub fn new(index: usize, cause: impl Into<InvalidityCause>) -> Self {
        Self { index, cause: cause.into() }
    }
}
