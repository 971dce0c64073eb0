use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures of a batch run. Every variant names the file or directory involved.
#[derive(Debug, Error)]
pub enum Error {
    #[error("directory not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("descriptor not found: {}", path.display())]
    DescriptorNotFound { path: PathBuf },

    #[error("source file not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("malformed descriptor {}: {source}", path.display())]
    MalformedDescriptor {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{id}: {violation}")]
    Schema {
        id: String,
        #[source]
        violation: SchemaViolation,
    },

    #[error("failed to read {}: {source}", path.display())]
    StorageRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl Error {
    pub fn schema(id: impl Into<String>, violation: SchemaViolation) -> Self {
        Self::Schema {
            id: id.into(),
            violation,
        }
    }

    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::DirectoryNotFound { .. }
            | Self::DescriptorNotFound { .. }
            | Self::SourceNotFound { .. } => 2,
            Self::MalformedDescriptor { .. } => 3,
            Self::Schema { .. } => 4,
            Self::StorageRead { .. } | Self::StorageWrite { .. } => 5,
            Self::Config { .. } => 6,
        }
    }

    pub fn is_schema_violation(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }
}

/// A document that parsed as JSON but does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("no `abi` found at contract.descriptor.abi, contract.abi or abi")]
    MissingAbi,

    #[error("missing required field `{path}`")]
    MissingRequiredField { path: String },

    #[error("field `{path}` is not {expected}")]
    InvalidField { path: String, expected: &'static str },

    #[error("settings.compilationTarget must hold exactly one entry, found {count}")]
    AmbiguousCompilationTarget { count: usize },

    #[error("abi holds {count} constructor entries, at most one is allowed")]
    MultipleConstructors { count: usize },

    #[error("descriptor is named `{found}` but stored as `{expected}`")]
    NameMismatch { expected: String, found: String },

    #[error("contract `{name}` is already produced by {first}")]
    DuplicateContract { name: String, first: String },
}

impl SchemaViolation {
    pub fn missing(path: impl Into<String>) -> Self {
        Self::MissingRequiredField { path: path.into() }
    }

    pub fn invalid(path: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidField {
            path: path.into(),
            expected,
        }
    }
}
