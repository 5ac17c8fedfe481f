// Processors module
pub mod minifier;
pub mod source_map;

pub use minifier::*;
pub use source_map::*;
