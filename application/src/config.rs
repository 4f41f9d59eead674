//! Swarm-wide configuration

use serde::{Deserialize, Serialize};
use warden_domain::{BalancerConfig, ConsensusConfig, PoolConfig, SwarmError, TopologyConfig};

/// Aggregate configuration for one coordinated swarm
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwarmConfig {
    pub pool: PoolConfig,
    pub balancer: BalancerConfig,
    pub topology: TopologyConfig,
    pub consensus: ConsensusConfig,
    /// Per-stage bound on a single agent evaluation
    pub stage_timeout_ms: u64,
}

impl SwarmConfig {
    pub fn validate(&self) -> Result<(), SwarmError> {
        self.pool.validate()?;
        self.balancer.validate()?;
        self.consensus.validate()?;
        Ok(())
    }
}

/// Default stage timeout when the config omits one
pub const DEFAULT_STAGE_TIMEOUT_MS: u64 = 1_000;

impl SwarmConfig {
    /// Stage timeout with the zero value mapped to the default
    pub fn stage_timeout_ms(&self) -> u64 {
        if self.stage_timeout_ms == 0 {
            DEFAULT_STAGE_TIMEOUT_MS
        } else {
            self.stage_timeout_ms
        }
    }
}
