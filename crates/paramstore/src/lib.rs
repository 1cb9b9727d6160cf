#![warn(missing_docs)]

//! # Paramstore
//!
//! Parameters of a network live in a [registry](module::ParamRegistry) keyed by name. They can
//! be declared before their shape is fully known and initialized on the first input, then
//! saved to and restored from a compact binary checkpoint.
//!
//! A checkpoint carries values only. To restore a network, rebuild it from the same config and
//! [load](store::load) the checkpoint into its registry.

pub use paramstore_core::*;

/// Tensor records and parameter checkpoints.
pub mod store {
    pub use paramstore_store::*;
}
