use crate::{config::EmptyBatchPolicy, InvalidityCause};
use alloy::primitives::{keccak256, B256};
use tracing::debug;

/// A contiguous run of transactions within a blob, opened by a boundary
/// record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    sequence_number: u64,
    data: Vec<u8>,
    length: u64,
    batch_hash: Option<B256>,
}

impl Batch {
    const fn new(sequence_number: u64) -> Self {
        Self { sequence_number, data: Vec::new(), length: 0, batch_hash: None }
    }

    /// The position of the batch in the blob, starting at 0.
    pub const fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    /// The concatenated canonical bytes of the batch's transactions.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The number of transactions in the batch.
    pub const fn length(&self) -> u64 {
        self.length
    }

    /// True if the batch holds no transactions.
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The batch hash. `None` while the batch is open, and for empty
    /// batches.
    pub const fn batch_hash(&self) -> Option<B256> {
        self.batch_hash
    }
}

/// Owns the blob's batches and the running accumulator hash.
///
/// Batches are opened by [`BatchAccumulator::open_batch`] and filled with
/// [`BatchAccumulator::append`]. Completing a non-empty batch hashes its data
/// and folds that hash into the accumulator:
///
/// ```text
/// batchHash = keccak256(data)
/// acc       = keccak256(acc ++ batchHash)
/// ```
#[derive(Debug, Clone)]
pub struct BatchAccumulator {
    batches: Vec<Batch>,
    open: bool,
    acc: B256,
}

impl BatchAccumulator {
    /// Create an accumulator seeded with the previous blob's accumulator
    /// hash.
    pub const fn new(seed: B256) -> Self {
        Self { batches: Vec::new(), open: false, acc: seed }
    }

    /// Fold a batch hash into a previous accumulator value.
    pub fn fold_into_acc(batch_hash: B256, previous: B256) -> B256 {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(previous.as_slice());
        buf[32..].copy_from_slice(batch_hash.as_slice());
        keccak256(buf)
    }

    /// The current accumulator value.
    pub const fn acc(&self) -> B256 {
        self.acc
    }

    /// All batches, including the open one.
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Number of batches, including the open one.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// True if no batch was ever opened.
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// True if a batch is open.
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// The open batch, if any.
    pub fn current(&self) -> Option<&Batch> {
        self.batches.last().filter(|_| self.open)
    }

    /// Open the next batch and return its sequence number. The previous
    /// batch must have been closed.
    pub fn open_batch(&mut self) -> u64 {
        debug_assert!(!self.open, "previous batch was not closed");
        let sequence_number = self.batches.len() as u64;
        self.batches.push(Batch::new(sequence_number));
        self.open = true;
        sequence_number
    }

    /// Append a transaction's bytes to the open batch. Returns the new batch
    /// length, or `None` if no batch is open.
    pub fn append(&mut self, bytes: &[u8]) -> Option<u64> {
        let batch = self.batches.last_mut().filter(|_| self.open)?;
        batch.data.extend_from_slice(bytes);
        batch.length += 1;
        Some(batch.length)
    }

    /// Complete the open batch: hash it, fold the hash into the accumulator,
    /// and close it. Returns the batch hash.
    ///
    /// Returns `None` and changes nothing if no batch is open or the open
    /// batch is empty.
    pub fn rollover(&mut self) -> Option<B256> {
        let acc = self.acc;
        let batch = self.batches.last_mut().filter(|b| self.open && !b.is_empty())?;

        let batch_hash = keccak256(&batch.data);
        batch.batch_hash = Some(batch_hash);
        self.acc = Self::fold_into_acc(batch_hash, acc);
        self.open = false;

        debug!(
            sequence_number = batch.sequence_number,
            length = batch.length,
            %batch_hash,
            acc = %self.acc,
            "batch closed"
        );
        Some(batch_hash)
    }

    /// Close the open batch, if any. Non-empty batches roll over. An empty
    /// batch is closed without touching the accumulator, or rejected,
    /// depending on the policy.
    pub fn close(&mut self, policy: EmptyBatchPolicy) -> Result<Option<B256>, InvalidityCause> {
        let Some(batch) = self.current() else { return Ok(None) };
        let (sequence_number, empty) = (batch.sequence_number, batch.is_empty());
        if !empty {
            return Ok(self.rollover());
        }

        match policy {
            EmptyBatchPolicy::Allow => {
                debug!(sequence_number, "empty batch closed");
                self.open = false;
                Ok(None)
            }
            EmptyBatchPolicy::Reject => Err(InvalidityCause::EmptyBatch { sequence_number }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fold_is_keccak_of_concatenation() {
        let prev = B256::repeat_byte(1);
        let hash = B256::repeat_byte(2);
        let mut concat = prev.to_vec();
        concat.extend_from_slice(hash.as_slice());
        assert_eq!(BatchAccumulator::fold_into_acc(hash, prev), keccak256(concat));
        assert_ne!(
            BatchAccumulator::fold_into_acc(hash, prev),
            BatchAccumulator::fold_into_acc(prev, hash)
        );
    }

    #[test]
    fn append_needs_an_open_batch() {
        let mut acc = BatchAccumulator::new(B256::ZERO);
        assert_eq!(acc.append(b"tx"), None);

        assert_eq!(acc.open_batch(), 0);
        assert_eq!(acc.append(b"tx"), Some(1));
        assert_eq!(acc.append(b"tx"), Some(2));
        assert_eq!(acc.current().unwrap().data(), b"txtx");
    }

    #[test]
    fn rollover_chains_batches() {
        let seed = B256::repeat_byte(0xee);
        let mut acc = BatchAccumulator::new(seed);

        acc.open_batch();
        acc.append(b"one");
        let first = acc.rollover().unwrap();
        assert_eq!(first, keccak256(b"one"));
        assert!(!acc.is_open());

        acc.open_batch();
        acc.append(b"two");
        let second = acc.close(EmptyBatchPolicy::Reject).unwrap().unwrap();

        let expected = BatchAccumulator::fold_into_acc(
            second,
            BatchAccumulator::fold_into_acc(first, seed),
        );
        assert_eq!(acc.acc(), expected);
        assert_eq!(acc.len(), 2);
        assert_eq!(acc.batches()[1].sequence_number(), 1);
        assert_eq!(acc.batches()[1].batch_hash(), Some(second));
    }

    #[test]
    fn rollover_of_empty_batch_is_refused() {
        let mut acc = BatchAccumulator::new(B256::ZERO);
        assert_eq!(acc.rollover(), None);

        acc.open_batch();
        assert_eq!(acc.rollover(), None);
        assert!(acc.is_open());
        assert_eq!(acc.acc(), B256::ZERO);
    }

    #[test]
    fn empty_batch_policy() {
        let mut acc = BatchAccumulator::new(B256::ZERO);
        acc.open_batch();
        assert!(matches!(
            acc.close(EmptyBatchPolicy::Reject),
            Err(InvalidityCause::EmptyBatch { sequence_number: 0 })
        ));
        assert_eq!(acc.close(EmptyBatchPolicy::Allow).unwrap(), None);
        assert!(!acc.is_open());
        assert_eq!(acc.acc(), B256::ZERO);
        assert_eq!(acc.batches()[0].batch_hash(), None);
    }
}
