use paramstore_core::module::RegistryError;
use paramstore_tensor::AllocError;

/// Error that can occur when encoding or decoding a tensor record.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The record is malformed: unknown tag, invalid shape or trailing bytes.
    #[error("Invalid tensor record: {0}")]
    Format(String),

    /// The record ends before all the bytes it declares.
    #[error("Truncated tensor record: expected {expected} bytes, got {actual}")]
    TruncatedInput {
        /// Bytes required by the record.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },

    /// The allocator refused the tensor.
    #[error("Failed to allocate tensor: {0}")]
    Allocation(#[from] AllocError),
}

/// Reason a checkpoint cannot be bound to a registry.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Mismatch {
    /// The checkpoint holds a parameter the registry does not have.
    #[error("checkpoint entry \"{0}\" has no matching parameter")]
    UnexpectedParam(String),

    /// The registry has parameters the checkpoint does not hold.
    #[error("parameters missing from checkpoint: {0:?}")]
    MissingParams(Vec<String>),

    /// A tensor does not fit its parameter.
    #[error(transparent)]
    Param(RegistryError),
}

/// Error that can occur when saving or loading a checkpoint.
#[derive(thiserror::Error, Debug)]
pub enum CheckpointError {
    /// The checkpoint framing is malformed.
    #[error("Invalid checkpoint: {0}")]
    Format(String),

    /// The checkpoint ends in the middle of an entry.
    #[error("Truncated checkpoint: {0}")]
    TruncatedInput(String),

    /// A tensor record could not be encoded or decoded.
    #[error("Invalid tensor record for \"{name}\": {source}")]
    Codec {
        /// Entry name.
        name: String,
        /// Underlying codec error.
        source: CodecError,
    },

    /// The checkpoint does not match the architecture of the target registry.
    #[error("Architecture mismatch: {0}")]
    ArchitectureMismatch(#[from] Mismatch),

    /// A parameter without value cannot be saved.
    #[error("Parameter \"{0}\" is not initialized")]
    Uninitialized(String),

    /// The sink refused bytes.
    #[error("Failed to write checkpoint: {0}")]
    IoWrite(#[source] std::io::Error),

    /// The source could not be read.
    #[error("Failed to read checkpoint: {0}")]
    IoRead(#[source] std::io::Error),

    /// The checkpoint file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(String),
}

impl CheckpointError {
    /// Returns true if the error comes from input ending too early, at the framing or the
    /// tensor record level.
    pub fn is_truncated(&self) -> bool {
        matches!(
            self,
            CheckpointError::TruncatedInput(_)
                | CheckpointError::Codec {
                    source: CodecError::TruncatedInput { .. },
                    ..
                }
        )
    }

    /// Returns true if the error comes from malformed input, at the framing or the tensor
    /// record level.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            CheckpointError::Format(_)
                | CheckpointError::Codec {
                    source: CodecError::Format(_),
                    ..
                }
        )
    }
}
