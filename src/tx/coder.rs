use crate::tx::{BlobRecord, DecodedTx, SenderRef};
use alloy::{
    primitives::{Address, Bytes, TxKind, U256},
    rlp::{Buf, BufMut, Decodable, Encodable, Header},
};

type Result<T, E = TxDecodeError> = std::result::Result<T, E>;

// Record encoding
const TAG_BATCH_START: u8 = 0;
const TAG_LEGACY_TX: u8 = 1;

// Sender encoding
const TAG_SENDER_ADDRESS: u8 = 0;
const TAG_SENDER_INDEX: u8 = 1;

/// Error decoding a compressed record.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TxDecodeError {
    /// The record is empty.
    #[error("empty record")]
    Empty,

    /// The buffer does not contain enough data to decode the type.
    #[error("buffer overrun while decoding {ty_name}. Expected {expected} bytes, but only {remaining} bytes remain")]
    Overrun {
        /// The name of the type being decoded.
        ty_name: &'static str,
        /// The number of bytes required to decode the type.
        expected: usize,
        /// The number of bytes remaining in the buffer.
        remaining: usize,
    },

    /// Invalid tag while decoding a type.
    #[error("invalid tag while decoding {ty_name}. Expected a tag in range 0..={max_expected}, got {tag}")]
    InvalidTag {
        /// The name of the type being decoded.
        ty_name: &'static str,
        /// The tag that was decoded.
        tag: u8,
        /// The maximum expected tag value.
        max_expected: u8,
    },

    /// Bytes remain after the record was fully decoded.
    #[error("{remaining} trailing bytes after record")]
    TrailingBytes {
        /// The number of bytes left over.
        remaining: usize,
    },

    /// Error decoding the RLP transaction body.
    #[error("error decoding transaction body: {0}")]
    Rlp(#[from] alloy::rlp::Error),
}

macro_rules! check_len {
    ($buf:ident, $ty_name:literal, $len:expr) => {
        let rem = $buf.remaining();
        if rem < $len {
            return Err(TxDecodeError::Overrun {
                ty_name: $ty_name,
                expected: $len,
                remaining: rem,
            });
        }
    };
}

/// Decode a compressed record into a [`BlobRecord`]. The whole buffer must
/// be consumed.
pub fn decode_record(mut buf: &[u8]) -> Result<BlobRecord> {
    if buf.is_empty() {
        return Err(TxDecodeError::Empty);
    }

    let record = match buf.get_u8() {
        TAG_BATCH_START => BlobRecord::BatchStart,
        TAG_LEGACY_TX => {
            let sender = decode_sender(&mut buf)?;
            BlobRecord::Transaction(decode_body(sender, &mut buf)?)
        }
        tag => {
            return Err(TxDecodeError::InvalidTag {
                ty_name: "BlobRecord",
                tag,
                max_expected: TAG_LEGACY_TX,
            })
        }
    };

    if !buf.is_empty() {
        return Err(TxDecodeError::TrailingBytes { remaining: buf.len() });
    }
    Ok(record)
}

fn decode_sender(buf: &mut &[u8]) -> Result<SenderRef> {
    check_len!(buf, "SenderRef", 1);
    match buf.get_u8() {
        TAG_SENDER_ADDRESS => {
            check_len!(buf, "Address", 20);
            let mut address = Address::ZERO;
            buf.copy_to_slice(address.as_mut_slice());
            Ok(SenderRef::Address(address))
        }
        TAG_SENDER_INDEX => {
            check_len!(buf, "u32", 4);
            Ok(SenderRef::Index(buf.get_u32()))
        }
        tag => Err(TxDecodeError::InvalidTag {
            ty_name: "SenderRef",
            tag,
            max_expected: TAG_SENDER_INDEX,
        }),
    }
}

fn decode_body(sender: SenderRef, buf: &mut &[u8]) -> Result<DecodedTx> {
    let header = Header::decode(buf)?;
    if !header.list {
        return Err(alloy::rlp::Error::UnexpectedString.into());
    }
    if buf.len() < header.payload_length {
        return Err(alloy::rlp::Error::InputTooShort.into());
    }

    let mut body = &buf[..header.payload_length];
    let tx = DecodedTx {
        sender,
        nonce: u64::decode(&mut body)?,
        gas_price: u128::decode(&mut body)?,
        gas_limit: u64::decode(&mut body)?,
        to: TxKind::decode(&mut body)?,
        value: U256::decode(&mut body)?,
        input: Bytes::decode(&mut body)?,
    };
    if !body.is_empty() {
        return Err(alloy::rlp::Error::ListLengthMismatch {
            expected: header.payload_length,
            got: header.payload_length - body.len(),
        }
        .into());
    }

    buf.advance(header.payload_length);
    Ok(tx)
}

/// Encode a batch-boundary record.
pub fn encode_batch_start(out: &mut dyn BufMut) {
    out.put_u8(TAG_BATCH_START);
}

/// Encode a transaction into its compressed form.
pub fn encode_tx(tx: &DecodedTx, out: &mut dyn BufMut) {
    out.put_u8(TAG_LEGACY_TX);
    match tx.sender {
        SenderRef::Address(address) => {
            out.put_u8(TAG_SENDER_ADDRESS);
            out.put_slice(address.as_slice());
        }
        SenderRef::Index(slot) => {
            out.put_u8(TAG_SENDER_INDEX);
            out.put_u32(slot);
        }
    }

    let payload_length = tx.nonce.length()
        + tx.gas_price.length()
        + tx.gas_limit.length()
        + tx.to.length()
        + tx.value.length()
        + tx.input.length();
    Header { list: true, payload_length }.encode(out);
    tx.nonce.encode(out);
    tx.gas_price.encode(out);
    tx.gas_limit.encode(out);
    tx.to.encode(out);
    tx.value.encode(out);
    tx.input.encode(out);
}

/// Encode a record into its compressed form.
pub fn encode_record(record: &BlobRecord) -> Bytes {
    let mut out = Vec::new();
    match record {
        BlobRecord::BatchStart => encode_batch_start(&mut out),
        BlobRecord::Transaction(tx) => encode_tx(tx, &mut out),
    }
    out.into()
}
