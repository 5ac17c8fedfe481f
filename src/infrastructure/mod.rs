// Infrastructure layer
pub mod file_system;
pub mod processors;
pub mod registry;
pub mod transforms;

pub use file_system::*;
pub use processors::*;
pub use registry::*;
pub use transforms::*;
