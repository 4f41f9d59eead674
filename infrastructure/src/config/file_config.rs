//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! The component sections deserialize straight into domain config types;
//! every field has a default so a partial file is always valid TOML-wise.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use warden_application::SwarmConfig;
use warden_domain::{BalancerConfig, ConsensusConfig, PoolConfig, SwarmError, TopologyConfig};

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("invalid [{section}] section: {source}")]
    InvalidSection {
        section: &'static str,
        source: SwarmError,
    },
}

/// Raw pipeline configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePipelineConfig {
    /// Per-stage bound on a single agent evaluation
    pub stage_timeout_ms: u64,
}

impl Default for FilePipelineConfig {
    fn default() -> Self {
        Self {
            stage_timeout_ms: 1_000,
        }
    }
}

/// Complete raw configuration from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub pool: PoolConfig,
    pub balancer: BalancerConfig,
    pub topology: TopologyConfig,
    pub consensus: ConsensusConfig,
    pub pipeline: FilePipelineConfig,
}

impl FileConfig {
    /// Validate section-by-section so errors name the offending TOML table
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let section = |section, result: Result<(), SwarmError>| {
            result.map_err(|source| ConfigValidationError::InvalidSection { section, source })
        };
        section("pool", self.pool.validate())?;
        section("balancer", self.balancer.validate())?;
        section("consensus", self.consensus.validate())?;
        Ok(())
    }

    pub fn to_swarm_config(&self) -> SwarmConfig {
        SwarmConfig {
            pool: self.pool.clone(),
            balancer: self.balancer.clone(),
            topology: self.topology.clone(),
            consensus: self.consensus.clone(),
            stage_timeout_ms: self.pipeline.stage_timeout_ms,
        }
    }
}
