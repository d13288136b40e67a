//! [`BlobProcessor`] - a typestate blob batch processor for rollup
//! settlement.
//!
//! A blob is an ordered sequence of compressed, signed records. Some records
//! are batch boundaries, the rest are legacy transactions. The processor
//! decodes every record, checks each transaction's signature against its
//! claimed sender, assigns dense account slots in a sparse Merkle tree, and
//! chains the blob's batches into a single accumulator hash. The final tree
//! root, accumulator, batch count and validity flag are the [`BlobOutputs`]
//! handed to a proof-input assembler.
//!
//! The processor is based on the [typestate pattern], which allows the
//! compiler to enforce correct usage:
//!
//! - [`BlobBuilding`]: Accepting records via
//!   [`BlobBuilding::add_tx_to_blob`].
//! - [`BlobValid`]: Every record executed successfully.
//! - [`BlobInvalid`]: A record failed. The blob can no longer change, only be
//!   builded.
//! - [`BlobBuilded`]: Terminal. Outputs are available, and the buffered tree
//!   writes can be released (valid blobs only) or discarded.
//!
//! ```text
//!                         +-----------+
//!  builder.build() -----> |  Building | <-- add_tx_to_blob()
//!                         +-----------+
//!                               |
//!                          execute_txs()
//!                          /         \
//!                 +-------+           +---------+
//!                 | Valid |           | Invalid |
//!                 +-------+           +---------+
//!                          \         /
//!                            build()
//!                               |
//!                         +-----------+
//!                         |  Builded  | --> outputs(), into_db(), discard()
//!                         +-----------+
//! ```
//!
//! Invalidity is a state, not an error. A malformed record, a bad
//! signature, a reference to an unassigned slot, or a transaction before the
//! first boundary all end execution with a [`BlobInvalid`] carrying an
//! [`InvalidBlob`]. Errors ([`BlobError`]) are reserved for an inconsistent
//! tree store and, in the runtime-checked [`Blob`] wrapper, for operations
//! called in the wrong state.
//!
//! ## Quickstart
//!
//! ```
//! use blobproc::{
//!     tree::MemoryDb, BlobProcessorBuilder, CompressedTx, Executed, GlobalInputs,
//!     PrivateInputs,
//! };
//!
//! # fn t(records: Vec<CompressedTx>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut processor = BlobProcessorBuilder::new()
//!     .with_db(MemoryDb::new())
//!     .with_global_inputs(GlobalInputs::default())
//!     .with_private_inputs(PrivateInputs::default())
//!     .build()?;
//!
//! for record in records {
//!     processor.add_tx_to_blob(record);
//! }
//!
//! let builded = match processor.execute_txs()? {
//!     Executed::Valid(blob) => blob.build(),
//!     Executed::Invalid(blob) => {
//!         eprintln!("{}", blob.reason());
//!         blob.build()
//!     }
//! };
//! println!("{:?}", builded.outputs());
//! # Ok(())
//! # }
//! ```
//!
//! ## Batches and the accumulator
//!
//! Each boundary record closes the open batch and opens the next. Closing a
//! non-empty batch computes `batchHash = keccak256(data)` over the batch's
//! concatenated transactions, each encoded as its EIP-155 signing payload
//! followed by `r ++ s ++ v`, and folds it into the accumulator as
//! `acc = keccak256(acc ++ batchHash)`. The accumulator is seeded from
//! [`GlobalInputs::old_acc_blob_hash`]. Empty batches are governed by
//! [`EmptyBatchPolicy`].
//!
//! ## Storage
//!
//! Account slots live in a [`tree::Smt`] over any [`tree::Db`]. Every write
//! goes to a [`tree::BufferedDb`] layered over the caller's store. Nothing
//! reaches the store until the caller commits the buffer returned by
//! [`BlobBuilded::into_db`].
//!
//! [typestate pattern]: https://cliffle.com/blog/rust-typestate/

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod accounts;
pub use accounts::{AccountIndex, SlotAssignment, SLOT_COUNT_KEY};

mod batch;
pub use batch::{Batch, BatchAccumulator};

mod builder;
pub use builder::{BlobProcessorBuilder, BuilderError};

mod config;
pub use config::{BlobConfig, EmptyBatchPolicy};

mod error;
pub use error::{BlobError, InvalidBlob, InvalidityCause, Operation, StateViolation};

mod inputs;
pub use inputs::{BlobHashType, GlobalInputs, PrivateInputs, UnknownBlobHashType};

mod outputs;
pub use outputs::BlobOutputs;

mod processor;
pub use processor::{Blob, BlobAccounts, BlobProcessor, Executed};

pub mod sig;

mod states;
pub(crate) use states::sealed::*;
pub use states::{BlobBuilded, BlobBuilding, BlobInvalid, BlobValid};

pub mod tree;

pub mod tx;
pub use tx::CompressedTx;

/// Utilities for testing blob processing.
#[cfg(feature = "test-utils")]
pub mod test_utils;
