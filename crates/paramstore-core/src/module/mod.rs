mod param;
mod registry;

pub use param::*;
pub use registry::*;
