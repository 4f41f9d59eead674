//! Infrastructure layer for warden-swarm
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod factory;
pub mod gateway;

// Re-export commonly used types
pub use config::{ConfigLoader, ConfigValidationError, FileConfig, FilePipelineConfig};
pub use factory::InMemoryAgentFactory;
pub use gateway::InMemoryAgentGateway;
