use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};

/// Public inputs for a blob, carried over from the previous blob.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalInputs {
    /// Root of the account tree after the previous blob.
    pub old_blob_root: B256,
    /// The rollup chain id. Bound into every signing payload.
    pub chain_id: u64,
    /// The fork id.
    pub fork_id: u64,
    /// Accumulator hash after the previous blob. Seeds this blob's
    /// accumulator.
    pub old_acc_blob_hash: B256,
    /// Number of blobs processed before this one.
    pub old_num_blob: u64,
}

/// Private inputs for a blob.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateInputs {
    /// Root of the historic global exit root tree.
    #[serde(rename = "historicGERRoot")]
    pub historic_ger_root: B256,
    /// Upper bound on the timestamps of the blob's batches.
    pub timestamp_limit: u64,
    /// The sequencer that submitted the blob.
    pub sequencer_address: Address,
    /// Where the blob data was posted.
    pub blob_hash_type: BlobHashType,
    /// Gas limit for the blob.
    pub zk_gas_limit: u64,
}

/// Where the blob data was posted. Serialized as its integer tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum BlobHashType {
    /// Posted as calldata.
    #[default]
    Calldata = 0,
    /// Posted as an EIP-4844 blob.
    Eip4844 = 1,
    /// Forced by the L1 contract.
    Forced = 2,
}

/// Error converting an integer tag into a [`BlobHashType`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unknown blob hash type {0}")]
pub struct UnknownBlobHashType(pub u8);

impl TryFrom<u8> for BlobHashType {
    type Error = UnknownBlobHashType;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(Self::Calldata),
            1 => Ok(Self::Eip4844),
            2 => Ok(Self::Forced),
            _ => Err(UnknownBlobHashType(tag)),
        }
    }
}

impl From<BlobHashType> for u8 {
    fn from(ty: BlobHashType) -> Self {
        ty as Self
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use alloy::primitives::{address, b256};

    #[test]
    fn global_inputs_from_json() {
        let json = r#"{
            "oldBlobRoot": "0x0000000000000000000000000000000000000000000000000000000000000001",
            "chainId": 1001,
            "forkId": 10,
            "oldAccBlobHash": "0x00000000000000000000000000000000000000000000000000000000000000ff",
            "oldNumBlob": 4
        }"#;
        let inputs: GlobalInputs = serde_json::from_str(json).unwrap();
        assert_eq!(inputs.old_blob_root, B256::with_last_byte(1));
        assert_eq!(inputs.chain_id, 1001);
        assert_eq!(inputs.fork_id, 10);
        assert_eq!(inputs.old_acc_blob_hash, B256::with_last_byte(0xff));
        assert_eq!(inputs.old_num_blob, 4);
    }

    #[test]
    fn private_inputs_from_json() {
        let json = r#"{
            "historicGERRoot": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "timestampLimit": 1944498031,
            "sequencerAddress": "0x617b3a3528F9cDd6630fd3301B9c8911F7Bf063D",
            "blobHashType": 1,
            "zkGasLimit": 100000000
        }"#;
        let inputs: PrivateInputs = serde_json::from_str(json).unwrap();
        assert_eq!(
            inputs.historic_ger_root,
            b256!("1111111111111111111111111111111111111111111111111111111111111111")
        );
        assert_eq!(inputs.sequencer_address, address!("617b3a3528F9cDd6630fd3301B9c8911F7Bf063D"));
        assert_eq!(inputs.blob_hash_type, BlobHashType::Eip4844);
        assert_eq!(inputs.timestamp_limit, 1944498031);
        assert_eq!(inputs.zk_gas_limit, 100_000_000);
    }

    #[test]
    fn blob_hash_type_tag() {
        assert_eq!(serde_json::to_string(&BlobHashType::Forced).unwrap(), "2");
        assert!(serde_json::from_str::<BlobHashType>("3").is_err());
        assert_eq!(BlobHashType::try_from(3), Err(UnknownBlobHashType(3)));
    }
}
