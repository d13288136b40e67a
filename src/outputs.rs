use alloy::primitives::B256;
use serde::{Deserialize, Serialize};

/// The values a builded blob hands to the proof-input assembler.
///
/// An invalid blob reports the previous root and accumulator, and zero
/// batches, so none of the work done before the blob was found invalid is
/// exposed as final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobOutputs {
    /// True if the blob is invalid.
    pub is_invalid: bool,
    /// Root of the account tree after the blob.
    pub new_blob_root: B256,
    /// Accumulator hash after the blob.
    pub acc_batch_hash_data: B256,
    /// Number of batches in the blob.
    pub num_batches: u64,
    /// Number of blobs processed, including this one.
    pub new_num_blob: u64,
}
