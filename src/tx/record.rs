use alloy::{
    consensus::{SignableTransaction, TxLegacy},
    primitives::{Address, Bytes, ChainId, Signature, TxKind, B256, U256},
};
use serde::{Deserialize, Serialize};

/// A compressed, signed record as submitted to a blob.
///
/// The signature travels next to the compressed body rather than inside it.
/// For a batch-boundary record the signature fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressedTx {
    /// The compressed record body.
    pub compressed: Bytes,
    /// The recovery parameter. Either `0`/`1` or `27`/`28`.
    pub v: u64,
    /// The `r` signature scalar.
    pub r: U256,
    /// The `s` signature scalar.
    pub s: U256,
}

impl CompressedTx {
    /// Create a record with no signature. Used for batch boundaries.
    pub const fn unsigned(compressed: Bytes) -> Self {
        Self { compressed, v: 0, r: U256::ZERO, s: U256::ZERO }
    }

    /// Create a record carrying the given signature.
    pub fn signed(compressed: Bytes, signature: &Signature) -> Self {
        Self {
            compressed,
            v: signature.v() as u64,
            r: signature.r(),
            s: signature.s(),
        }
    }
}

/// How a compressed transaction names its sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderRef {
    /// The full sender address. Senders appearing for the first time must use
    /// this form.
    Address(Address),
    /// The slot previously assigned to the sender in the account index.
    Index(u32),
}

/// The classification of a decoded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobRecord {
    /// Closes the open batch, if any, and opens the next one.
    BatchStart,
    /// An ordinary transaction.
    Transaction(DecodedTx),
}

/// The canonical fields of a transaction, expanded from its compressed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTx {
    /// The claimed sender.
    pub sender: SenderRef,
    /// The sender nonce.
    pub nonce: u64,
    /// The gas price.
    pub gas_price: u128,
    /// The gas limit.
    pub gas_limit: u64,
    /// The recipient, or create.
    pub to: TxKind,
    /// The value transferred.
    pub value: U256,
    /// The calldata.
    pub input: Bytes,
}

impl DecodedTx {
    /// Build the EIP-155 legacy transaction that the sender signed.
    pub fn to_legacy(&self, chain_id: ChainId) -> TxLegacy {
        TxLegacy {
            chain_id: Some(chain_id),
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            to: self.to,
            value: self.value,
            input: self.input.clone(),
        }
    }

    /// The bytes that were signed, i.e. the EIP-155 signing payload.
    pub fn signing_payload(&self, chain_id: ChainId) -> Vec<u8> {
        let mut out = Vec::new();
        self.to_legacy(chain_id).encode_for_signing(&mut out);
        out
    }

    /// The hash that was signed.
    pub fn signature_hash(&self, chain_id: ChainId) -> B256 {
        self.to_legacy(chain_id).signature_hash()
    }
}

/// Append the signature to a signing payload, producing the bytes that are
/// accumulated into a batch: `payload ++ r ++ s ++ v`, with `v` as `27`/`28`.
pub fn batch_bytes(payload: &[u8], signature: &Signature) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 65);
    out.extend_from_slice(payload);
    out.extend_from_slice(&signature.as_bytes());
    out
}
