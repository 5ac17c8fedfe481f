// bundlemap - source-mapped script bundling for web asset pipelines

pub mod cli;
pub mod config;
pub mod core;
pub mod infrastructure;
pub mod utils;

pub use crate::config::{BundlerConfig, LineEnding};
pub use crate::core::{
    AdHocArtifact, AdHocBundleBuilder, Bundle, BundleBuilder, BundleContext, BundleKind,
    BundleRegistry, InputFile, ScriptBundle, SourceMappingBundler,
};
pub use crate::infrastructure::{InMemoryBundleRegistry, OxcMinifier};
pub use crate::utils::{BundleError, Result};
