use crate::{
    tree::{KeccakHasher, MemoryDb},
    tx::{encode_batch_start, encode_tx, CompressedTx, DecodedTx, SenderRef},
    BlobBuilding, BlobConfig, BlobHashType, BlobProcessorBuilder, GlobalInputs, PrivateInputs,
};
use alloy::{
    primitives::{keccak256, Address, Bytes, TxKind, B256, U256},
    signers::{local::PrivateKeySigner, SignerSync},
};

/// Chain id of the test inputs.
pub const TEST_CHAIN_ID: u64 = 1001;

/// Make a deterministic signer from a seed.
///
/// # Panics
///
/// Panics if the derived key is not a valid secp256k1 scalar, which does not
/// happen for any `u8` seed.
pub fn test_signer(seed: u8) -> PrivateKeySigner {
    PrivateKeySigner::from_bytes(&keccak256([seed])).expect("valid signing key")
}

/// Global inputs for a blob over an empty account tree.
pub fn test_global_inputs() -> GlobalInputs {
    GlobalInputs {
        old_blob_root: B256::ZERO,
        chain_id: TEST_CHAIN_ID,
        fork_id: 1,
        old_acc_blob_hash: B256::repeat_byte(0xac),
        old_num_blob: 7,
    }
}

/// Private inputs for a test blob.
pub fn test_private_inputs() -> PrivateInputs {
    PrivateInputs {
        historic_ger_root: B256::repeat_byte(0x6e),
        timestamp_limit: 1_944_498_031,
        sequencer_address: Address::repeat_byte(0x5e),
        blob_hash_type: BlobHashType::Calldata,
        zk_gas_limit: 100_000_000,
    }
}

/// Make a new processor over an empty in-memory tree.
pub fn test_processor() -> BlobBuilding<MemoryDb<u64>, KeccakHasher> {
    test_processor_with_config(BlobConfig::default())
}

/// Make a new processor over an empty in-memory tree, with the given
/// configuration.
///
/// # Panics
///
/// Never, the test inputs are complete.
pub fn test_processor_with_config(
    config: BlobConfig,
) -> BlobBuilding<MemoryDb<u64>, KeccakHasher> {
    BlobProcessorBuilder::new()
        .with_hasher(KeccakHasher)
        .with_db(MemoryDb::new())
        .with_global_inputs(test_global_inputs())
        .with_private_inputs(test_private_inputs())
        .with_config(config)
        .build()
        .expect("complete test inputs")
}

/// A batch-boundary record.
pub fn batch_start() -> CompressedTx {
    let mut out = Vec::new();
    encode_batch_start(&mut out);
    CompressedTx::unsigned(out.into())
}

/// A plain value transfer from the given sender.
pub fn transfer(sender: SenderRef, nonce: u64) -> DecodedTx {
    DecodedTx {
        sender,
        nonce,
        gas_price: 1_000_000_000,
        gas_limit: 21_000,
        to: TxKind::Call(Address::repeat_byte(0x70)),
        value: U256::from(1_000_000_000_000_000u64),
        input: Bytes::new(),
    }
}

/// Compress a transaction and sign it for [`TEST_CHAIN_ID`].
///
/// # Panics
///
/// Panics if the local signer fails, which it does not for a valid key.
pub fn signed_tx(signer: &PrivateKeySigner, tx: &DecodedTx) -> CompressedTx {
    let signature =
        signer.sign_hash_sync(&tx.signature_hash(TEST_CHAIN_ID)).expect("local signing");
    let mut out = Vec::new();
    encode_tx(tx, &mut out);
    CompressedTx::signed(out.into(), &signature)
}
