#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # Parameter checkpoints
//!
//! Serialization of tensors and of the parameters of a network.
//!
//! ## Tensor record
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │  version (u8)                    │  Record format version (1)
//! │  dtype tag (u8)                  │  See `DType::tag`
//! │  rank (u8)                       │  Number of dimensions
//! │  extents (rank x u32, LE)        │  Dimension sizes, all >= 1
//! │  elements                        │  Raw bytes, row-major, little-endian
//! └──────────────────────────────────┘
//! ```
//!
//! ## Checkpoint
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │  name length (u32, LE)           │
//! │  name (UTF-8)                    │  e.g. "dense0.weight"
//! │  record length (u32, LE)         │
//! │  tensor record                   │
//! ├──────────────────────────────────┤
//! │  ... one entry per parameter ... │  In registry order
//! └──────────────────────────────────┘
//! ```
//!
//! There is no entry count and no footer: the reader consumes entries until the source is
//! exhausted. A checkpoint carries no architecture; it is bound by name to the registry of a
//! network that was rebuilt in code.

pub mod codec;
mod error;
mod file;
mod reader;
mod writer;

pub use codec::{RECORD_VERSION, RecordHeader, decode, encode, encode_into};
pub use error::*;
pub use file::*;
pub use reader::*;
pub use writer::*;

#[cfg(test)]
mod tests;
