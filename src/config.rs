use serde::{Deserialize, Serialize};

/// How the processor treats a batch that closes without transactions, i.e.
/// two consecutive boundary records, or a boundary record at the end of the
/// blob.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EmptyBatchPolicy {
    /// Keep the empty batch. It counts towards the batch total but has no
    /// hash and is not folded into the accumulator.
    #[default]
    Allow,
    /// Mark the blob invalid.
    Reject,
}

/// Processor configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlobConfig {
    /// Treatment of empty batches.
    pub empty_batches: EmptyBatchPolicy,
}

impl BlobConfig {
    /// Set the empty batch policy.
    pub const fn with_empty_batches(mut self, policy: EmptyBatchPolicy) -> Self {
        self.empty_batches = policy;
        self
    }
}
