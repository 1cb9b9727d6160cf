mod initializer;
mod linear;
mod mlp;
mod relu;

/// Reference implementations of the layer computations.
pub mod functional;

pub use initializer::*;
pub use linear::*;
pub use mlp::*;
pub use relu::*;

use crate::module::RegistryError;
use crate::tensor::{DType, DataError, Shape};

/// Error that can occur when running a layer.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ModuleError {
    /// A parameter has no value yet.
    #[error("Parameter \"{0}\" is not initialized")]
    Uninitialized(String),

    /// The reference forward pass only computes in f32.
    #[error("Unsupported data type {0}, the forward pass computes in f32")]
    UnsupportedDType(DType),

    /// The input does not match the layer.
    #[error("Invalid input shape {found}: {reason}")]
    InputShape {
        /// Shape of the input.
        found: Shape,
        /// Why it was rejected.
        reason: String,
    },

    /// Registry lookup failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Tensor data could not be read.
    #[error(transparent)]
    Data(#[from] DataError),
}
