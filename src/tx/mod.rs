//! Compressed blob records.
//!
//! Every record starts with a one-byte tag:
//!
//! - `0x00`: batch boundary. No further bytes.
//! - `0x01`: legacy transaction. Followed by a sender reference and an RLP
//!   list `[nonce, gasPrice, gasLimit, to, value, input]`.
//!
//! A sender reference is `0x00 ++ address(20)` or `0x01 ++ slot(u32 BE)`.
//! Decoding a transaction record yields a [`DecodedTx`], from which the
//! EIP-155 signing payload is re-encoded for signature verification.

mod coder;
pub use coder::{decode_record, encode_batch_start, encode_record, encode_tx, TxDecodeError};

mod record;
pub use record::{batch_bytes, BlobRecord, CompressedTx, DecodedTx, SenderRef};
