use crate::BlobProcessor;
use sealed::*;

/// A [`BlobProcessor`] that accepts records.
///
/// Expected continuations include:
/// - [`BlobBuilding::add_tx_to_blob`]
/// - [`BlobBuilding::execute_txs`]
pub type BlobBuilding<D, H> = BlobProcessor<D, H, Building>;

/// A [`BlobProcessor`] whose records all executed successfully.
///
/// Expected continuations include:
/// - [`BlobValid::build`]
pub type BlobValid<D, H> = BlobProcessor<D, H, Valid>;

/// A [`BlobProcessor`] that found an invalid record. No further state
/// changes are possible.
///
/// Expected continuations include:
/// - [`BlobInvalid::reason`]
/// - [`BlobInvalid::build`]
pub type BlobInvalid<D, H> = BlobProcessor<D, H, Invalid>;

/// A [`BlobProcessor`] that has been builded. This state is terminal.
///
/// Expected continuations include:
/// - [`BlobBuilded::outputs`]
/// - [`BlobBuilded::into_db`]
/// - [`BlobBuilded::discard`]
pub type BlobBuilded<D, H> = BlobProcessor<D, H, Builded>;

#[allow(unnameable_types)]
pub(crate) mod sealed {
    use crate::{BlobOutputs, InvalidBlob};

    macro_rules! states {
        ($($name:ident),+) => {
            $(

                /// A state for the [`BlobProcessor`].
                ///
                /// [`BlobProcessor`]: crate::BlobProcessor
                #[derive(Debug)]
                pub struct $name { _private: () }

                impl $name {
                    /// Create a new state.
                    pub(crate) const fn new() -> Self {
                        Self { _private: () }
                    }
                }

            )*
        };
    }

    states!(Building, Valid);

    /// States whose accounts and batches are still being assembled. An
    /// invalid or builded blob only reports through its outputs.
    pub trait InProgress {}
    impl InProgress for Building {}
    impl InProgress for Valid {}

    /// A state for the [`BlobProcessor`].
    ///
    /// [`BlobProcessor`]: crate::BlobProcessor
    #[derive(Debug)]
    pub struct Invalid {
        /// The first failure.
        pub reason: InvalidBlob,
    }

    /// A state for the [`BlobProcessor`].
    ///
    /// [`BlobProcessor`]: crate::BlobProcessor
    #[derive(Debug)]
    pub struct Builded {
        /// The final outputs.
        pub outputs: BlobOutputs,
        /// The first failure, for an invalid blob.
        pub reason: Option<InvalidBlob>,
    }
}
