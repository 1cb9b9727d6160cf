#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! This library provides the tensor data abstractions used by the paramstore crates.
//!
//! A [`TensorData`] is a host-side buffer tagged with a [`Shape`] and a [`DType`]. Buffers are
//! always stored in little-endian byte order so they can be written to disk as-is.

#[macro_use]
extern crate derive_new;

mod tensor;

pub use tensor::*;

// Re-exported types
pub use half::{bf16, f16};
