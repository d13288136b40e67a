mod blob;
pub use blob::Blob;

mod executed;
pub use executed::Executed;

mod r#struct;
pub(crate) use r#struct::BlobContext;
pub use r#struct::{BlobAccounts, BlobProcessor};

// Impl blocks for processor states
mod builded;
mod building;
