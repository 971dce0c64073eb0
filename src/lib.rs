//! Batch conversions between smart contract metadata layouts: solc metadata to
//! contract descriptors, descriptors to method-name indexes, and descriptors to
//! a standalone-mode database.

pub mod abi;
pub mod descriptor;
pub mod error;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod settings;
pub mod store;
pub mod types;

pub use descriptor::ContractDescriptor;
pub use error::{Error, Result, SchemaViolation};
pub use pipeline::{IndexScope, bundle, convert, index_methods};
pub use settings::{Defaults, FailurePolicy, Settings};
pub use store::{DocumentStore, FsStore, MemoryStore, SourceDir, SourceLookup};
