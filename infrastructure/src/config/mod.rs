//! File configuration loading and conversion

mod file_config;
mod loader;

pub use file_config::{ConfigValidationError, FileConfig, FilePipelineConfig};
pub use loader::ConfigLoader;
