//! Tree-backed storage for the account index.
//!
//! The tree engine is generic over a [`TreeHasher`] (the field and hash
//! function) and a [`Db`] (the node store). Processors always write through
//! a [`BufferedDb`], so the caller decides when, and whether, writes reach the
//! backing store.

mod db;
pub use db::{BufferedDb, Db, MemoryDb};

mod hasher;
#[cfg(feature = "poseidon")]
pub use hasher::PoseidonHasher;
pub use hasher::{DefaultHasher, Digest, KeccakHasher, Node, TreeHasher};

mod smt;
pub use smt::{Smt, TreeError, SMT_DEPTH};

/// Shared, thread-safe node store.
#[cfg(feature = "concurrent-db")]
mod sync;
#[cfg(feature = "concurrent-db")]
pub use sync::ConcurrentMemoryDb;
