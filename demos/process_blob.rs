//! This example builds a small blob from JSON inputs, runs it through the
//! runtime-checked [`Blob`] wrapper, and commits the resulting tree writes.

use blobproc::{
    test_utils::{batch_start, signed_tx, test_signer, transfer, TEST_CHAIN_ID},
    tree::{DefaultHasher, MemoryDb, Smt},
    tx::SenderRef,
    AccountIndex, Blob, BlobProcessorBuilder, CompressedTx, GlobalInputs, PrivateInputs,
};

const GLOBAL_INPUTS: &str = r#"{
    "oldBlobRoot": "0x0000000000000000000000000000000000000000000000000000000000000000",
    "chainId": 1001,
    "forkId": 1,
    "oldAccBlobHash": "0x0000000000000000000000000000000000000000000000000000000000000000",
    "oldNumBlob": 0
}"#;

const PRIVATE_INPUTS: &str = r#"{
    "historicGERRoot": "0x0000000000000000000000000000000000000000000000000000000000000000",
    "timestampLimit": 1944498031,
    "sequencerAddress": "0x617b3a3528F9cDd6630fd3301B9c8911F7Bf063D",
    "blobHashType": 0,
    "zkGasLimit": 100000000
}"#;

fn main() -> eyre::Result<()> {
    let global: GlobalInputs = serde_json::from_str(GLOBAL_INPUTS)?;
    let private: PrivateInputs = serde_json::from_str(PRIVATE_INPUTS)?;
    assert_eq!(global.chain_id, TEST_CHAIN_ID);

    // two senders, two batches. the second batch refers to alice by slot
    let alice = test_signer(1);
    let bob = test_signer(2);
    let records = vec![
        batch_start(),
        signed_tx(&alice, &transfer(SenderRef::Address(alice.address()), 0)),
        signed_tx(&bob, &transfer(SenderRef::Address(bob.address()), 0)),
        batch_start(),
        signed_tx(&alice, &transfer(SenderRef::Index(0), 1)),
    ];

    // records travel as JSON between the sequencer and the processor
    let json = serde_json::to_string(&records)?;
    let records: Vec<CompressedTx> = serde_json::from_str(&json)?;

    let processor = BlobProcessorBuilder::new()
        .with_db(MemoryDb::new())
        .with_global_inputs(global)
        .with_private_inputs(private)
        .build()?;

    let mut blob = Blob::from(processor);
    for record in records {
        blob.add_tx_to_blob(record)?;
    }
    blob.execute_txs()?;
    let outputs = *blob.build()?;
    println!("{}", serde_json::to_string(&outputs)?);

    if outputs.is_invalid {
        eyre::bail!("blob is invalid");
    }

    let db = blob.into_db()?.commit();
    let tree = Smt::with_root(db, DefaultHasher::default(), outputs.new_blob_root)?;
    let accounts = AccountIndex::load(tree)?;
    for (slot, address) in accounts.iter() {
        println!("slot {slot}: {address}");
    }

    Ok(())
}
