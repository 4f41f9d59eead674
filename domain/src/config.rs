//! Component configuration
//!
//! Plain serde-friendly config structs with validated defaults. The
//! infrastructure layer maps its file configuration onto these.

use crate::agent::AgentType;
use crate::core::SwarmError;
use crate::topology::RolePolicy;
use serde::{Deserialize, Serialize};

/// Agent pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub min_agents: usize,
    pub max_agents: usize,
    pub default_agent_type: AgentType,
    pub health_check_interval_ms: u64,
    pub health_check_timeout_ms: u64,
    /// No heartbeat within this window marks the agent unhealthy
    pub unhealthy_threshold_ms: u64,
    pub default_capabilities: Vec<String>,
    /// Load ceiling for the "available" query
    pub available_load_ceiling: f64,
    pub scaling: Option<ScalingPolicy>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_agents: 2,
            max_agents: 10,
            default_agent_type: AgentType::Guardian,
            health_check_interval_ms: 5_000,
            health_check_timeout_ms: 1_000,
            unhealthy_threshold_ms: 15_000,
            default_capabilities: Vec::new(),
            available_load_ceiling: 0.9,
            scaling: Some(ScalingPolicy::default()),
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), SwarmError> {
        if self.min_agents > self.max_agents {
            return Err(SwarmError::InvalidConfig(format!(
                "min_agents ({}) exceeds max_agents ({})",
                self.min_agents, self.max_agents
            )));
        }
        if self.max_agents == 0 {
            return Err(SwarmError::InvalidConfig(
                "max_agents must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.available_load_ceiling) {
            return Err(SwarmError::InvalidConfig(
                "available_load_ceiling must be within [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Pool-wide auto-scaling policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingPolicy {
    /// Utilization the pool tries to hold
    pub target_utilization: f64,
    /// Average load above this triggers a scale-up
    pub scale_up_threshold: f64,
    /// Average load below this triggers a scale-down
    pub scale_down_threshold: f64,
    /// One scale action per cooldown window
    pub cooldown_ms: u64,
    pub max_scale_up: usize,
    pub max_scale_down: usize,
}

impl Default for ScalingPolicy {
    fn default() -> Self {
        Self {
            target_utilization: 0.6,
            scale_up_threshold: 0.8,
            scale_down_threshold: 0.3,
            cooldown_ms: 30_000,
            max_scale_up: 2,
            max_scale_down: 1,
        }
    }
}

/// Per-type scaling bounds and triggers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingRule {
    pub min_instances: usize,
    pub max_instances: usize,
    pub scale_up_load_threshold: f64,
    pub scale_down_load_threshold: f64,
    pub scale_up_queue_depth: usize,
}

impl Default for ScalingRule {
    fn default() -> Self {
        Self {
            min_instances: 1,
            max_instances: 5,
            scale_up_load_threshold: 0.8,
            scale_down_load_threshold: 0.2,
            scale_up_queue_depth: 10,
        }
    }
}

/// Load balancer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BalancerConfig {
    /// Strategy name: round_robin | weighted | least_connections | adaptive
    pub strategy: String,
    /// Agents at or above this load are never assigned work
    pub overload_threshold: f64,
    /// Tasks held back when no agent qualifies; 0 disables queueing
    pub max_queue_size: usize,
    pub sticky_session_ttl_ms: u64,
    /// Effective-weight multiplier applied after a weighted selection
    pub weight_decay: f64,
    /// Fraction of the base weight restored per recorded completion
    pub weight_replenish: f64,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            strategy: "round_robin".to_string(),
            overload_threshold: 0.9,
            max_queue_size: 100,
            sticky_session_ttl_ms: 300_000,
            weight_decay: 0.5,
            weight_replenish: 0.1,
        }
    }
}

impl BalancerConfig {
    pub fn validate(&self) -> Result<(), SwarmError> {
        if !(0.0..=1.0).contains(&self.overload_threshold) {
            return Err(SwarmError::InvalidConfig(
                "overload_threshold must be within [0, 1]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.weight_decay) || !(0.0..=1.0).contains(&self.weight_replenish)
        {
            return Err(SwarmError::InvalidConfig(
                "weight_decay and weight_replenish must be within [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Topology configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Topology name: mesh | hierarchical | ring | star | adaptive
    pub topology: String,
    pub max_nodes: usize,
    pub replication_factor: usize,
    /// Agent count at which the adaptive topology switches from mesh to
    /// hierarchical
    pub adaptive_switch_threshold: usize,
    pub role_policy: RolePolicy,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            topology: "mesh".to_string(),
            max_nodes: 64,
            replication_factor: 2,
            adaptive_switch_threshold: 10,
            role_policy: RolePolicy::default(),
        }
    }
}

/// Quorum consensus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    pub enabled: bool,
    /// Minimum vote count before a decision can be finalized
    pub quorum_size: usize,
    /// Bound on vote collection; late voters are excluded
    pub timeout_ms: u64,
    /// approvals / total_votes must reach this ratio to approve
    pub approval_threshold: f64,
    /// Votes below this confidence are treated as abstentions
    pub min_confidence: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            quorum_size: 3,
            timeout_ms: 2_000,
            approval_threshold: 0.5,
            min_confidence: 0.0,
        }
    }
}

impl ConsensusConfig {
    pub fn validate(&self) -> Result<(), SwarmError> {
        if self.quorum_size == 0 {
            return Err(SwarmError::InvalidConfig(
                "quorum_size must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.approval_threshold) {
            return Err(SwarmError::InvalidConfig(
                "approval_threshold must be within [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(PoolConfig::default().validate().is_ok());
        assert!(BalancerConfig::default().validate().is_ok());
        assert!(ConsensusConfig::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_pool_bounds_rejected() {
        let config = PoolConfig {
            min_agents: 5,
            max_agents: 2,
            ..PoolConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SwarmError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_quorum_rejected() {
        let config = ConsensusConfig {
            quorum_size: 0,
            ..ConsensusConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
