#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! The core crate of paramstore.
//!
//! It holds the named parameters of a network in a [`ParamRegistry`](module::ParamRegistry),
//! the initializers that fill them, and the small set of layers used to build networks whose
//! parameters are checkpointed.

#[macro_use]
extern crate derive_new;

/// Re-export serde for configs.
pub use serde;

/// The configuration module.
pub mod config;

/// Module for parameters and their registry.
pub mod module;

/// Neural network module.
pub mod nn;

/// Module for the tensor.
pub mod tensor {
    pub use paramstore_tensor::*;
}
