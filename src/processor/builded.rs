use crate::{
    tree::{BufferedDb, Db, TreeHasher},
    BlobBuilded, BlobError, BlobOutputs, InvalidBlob, Operation, StateViolation,
};
use tracing::debug;

impl<D, H> BlobBuilded<D, H>
where
    D: Db<H::F>,
    H: TreeHasher,
{
    /// Get a reference to the final outputs.
    pub const fn outputs(&self) -> &BlobOutputs {
        &self.state.outputs
    }

    /// True if the blob is invalid.
    pub const fn is_invalid(&self) -> bool {
        self.state.outputs.is_invalid
    }

    /// Get the first failure, if the blob is invalid.
    pub const fn reason(&self) -> Option<&InvalidBlob> {
        self.state.reason.as_ref()
    }

    /// Release the buffered tree writes. The caller decides whether to
    /// [`commit`] them into the backing store.
    ///
    /// # Errors
    ///
    /// Fails with [`StateViolation::InvalidBlob`] if the blob is invalid. The
    /// writes of an invalid blob must never reach the backing store. Use
    /// [`Self::discard`] instead.
    ///
    /// [`commit`]: BufferedDb::commit
    pub fn into_db(self) -> Result<BufferedDb<D, H::F>, BlobError> {
        if self.is_invalid() {
            return Err(StateViolation::InvalidBlob(Operation::ReleaseWrites).into());
        }
        Ok(self.inner.accounts.into_tree().into_db())
    }

    /// Drop the buffered tree writes and return the untouched backing store.
    pub fn discard(self) -> D {
        let writes = self.inner.accounts.tree().db().pending_len();
        debug!(writes, "discarding buffered writes");
        self.inner.accounts.into_tree().into_db().discard()
    }
}
