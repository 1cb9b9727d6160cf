mod allocator;
mod data;
mod distribution;
mod dtype;
mod element;
mod shape;

pub use allocator::*;
pub use data::*;
pub use distribution::*;
pub use dtype::*;
pub use element::*;
pub use shape::*;
