// Core domain layer
pub mod artifacts;
pub mod models;
pub mod services;
pub mod interfaces;

pub use artifacts::*;
pub use models::*;
pub use services::*;
pub use interfaces::*;
