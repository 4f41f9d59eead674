//! Logical swarm topology
//!
//! The manager owns one boxed [`TopologyStrategy`] chosen by name from
//! configuration and exposes graph queries over it.

mod adaptive;
mod hierarchical;
mod mesh;
mod ring;
mod star;
mod strategy;

pub use adaptive::AdaptiveTopology;
pub use hierarchical::{COORDINATOR_TAG, HierarchicalTopology};
pub use mesh::MeshTopology;
pub use ring::RingTopology;
pub use star::{HUB_TAG, StarTopology};
pub use strategy::{Connection, Member, RolePolicy, Route, TopologyStrategy};

use crate::agent::{Agent, AgentId};
use crate::config::TopologyConfig;
use crate::core::SwarmError;
use serde::{Deserialize, Serialize};

/// Point-in-time view of graph health
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyMetrics {
    pub active_agents: usize,
    pub total_connections: usize,
    /// Fraction of agents with at least one neighbor (1.0 for 0 or 1 agents)
    pub health_score: f64,
}

/// Owns the configured topology strategy and the current graph.
pub struct TopologyManager {
    config: TopologyConfig,
    strategy: Box<dyn TopologyStrategy>,
}

impl TopologyManager {
    pub fn new(config: TopologyConfig) -> Result<Self, SwarmError> {
        let name = config.topology.replace('-', "_");
        let strategy: Box<dyn TopologyStrategy> = match name.as_str() {
            "mesh" => Box::new(MeshTopology::new()),
            "hierarchical" => Box::new(HierarchicalTopology::new(config.role_policy)),
            "ring" => Box::new(RingTopology::new()),
            "star" => Box::new(StarTopology::new(config.role_policy)),
            "adaptive" => Box::new(AdaptiveTopology::new(
                config.adaptive_switch_threshold,
                config.role_policy,
            )),
            _ => return Err(SwarmError::UnknownTopology(config.topology.clone())),
        };
        Ok(Self { config, strategy })
    }

    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Rebuild the graph for the given membership
    pub fn connect(&mut self, agents: &[Agent]) -> Result<Vec<Connection>, SwarmError> {
        if agents.len() > self.config.max_nodes {
            return Err(SwarmError::Capacity {
                current: agents.len(),
                max: self.config.max_nodes,
            });
        }
        Ok(self.strategy.connect(agents))
    }

    pub fn add_agents(&mut self, agents: &[Agent]) -> Result<(), SwarmError> {
        let projected = self.strategy.agent_ids().len() + agents.len();
        if projected > self.config.max_nodes {
            return Err(SwarmError::Capacity {
                current: projected,
                max: self.config.max_nodes,
            });
        }
        self.strategy.add_agents(agents);
        Ok(())
    }

    pub fn remove_agents(&mut self, agent_ids: &[AgentId]) {
        self.strategy.remove_agents(agent_ids);
    }

    pub fn connections(&self) -> Vec<Connection> {
        self.strategy.connections()
    }

    pub fn neighbors(&self, agent_id: &AgentId) -> Vec<AgentId> {
        self.strategy.neighbors(agent_id)
    }

    pub fn route(&self, from: &AgentId, to: &AgentId) -> Option<Route> {
        self.strategy.route(from, to)
    }

    pub fn agent_ids(&self) -> Vec<AgentId> {
        self.strategy.agent_ids()
    }

    pub fn metrics(&self) -> TopologyMetrics {
        let ids = self.strategy.agent_ids();
        let active_agents = ids.len();
        let total_connections = self.strategy.connections().len();
        let health_score = if active_agents <= 1 {
            1.0
        } else {
            let connected = ids
                .iter()
                .filter(|id| !self.strategy.neighbors(id).is_empty())
                .count();
            connected as f64 / active_agents as f64
        };
        TopologyMetrics {
            active_agents,
            total_connections,
            health_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentType;

    fn agents(n: usize) -> Vec<Agent> {
        (1..=n)
            .map(|i| Agent::new(format!("agent-{i}"), AgentType::Guardian, 0))
            .collect()
    }

    fn manager(topology: &str) -> TopologyManager {
        TopologyManager::new(TopologyConfig {
            topology: topology.to_string(),
            ..TopologyConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_every_registered_topology_constructs() {
        for name in ["mesh", "hierarchical", "ring", "star", "adaptive"] {
            assert_eq!(manager(name).strategy_name(), name);
        }
    }

    #[test]
    fn test_unknown_topology_is_rejected() {
        let err = TopologyManager::new(TopologyConfig {
            topology: "torus".to_string(),
            ..TopologyConfig::default()
        })
        .err()
        .unwrap();
        assert!(matches!(err, SwarmError::UnknownTopology(name) if name == "torus"));
    }

    #[test]
    fn test_max_nodes_enforced() {
        let mut mgr = TopologyManager::new(TopologyConfig {
            topology: "mesh".to_string(),
            max_nodes: 3,
            ..TopologyConfig::default()
        })
        .unwrap();
        assert!(mgr.connect(&agents(4)).unwrap_err().is_capacity());

        mgr.connect(&agents(3)).unwrap();
        assert!(mgr.add_agents(&agents(4)[3..]).unwrap_err().is_capacity());
    }

    #[test]
    fn test_metrics_on_connected_mesh() {
        let mut mgr = manager("mesh");
        mgr.connect(&agents(4)).unwrap();
        let metrics = mgr.metrics();
        assert_eq!(metrics.active_agents, 4);
        assert_eq!(metrics.total_connections, 12);
        assert_eq!(metrics.health_score, 1.0);
    }

    #[test]
    fn test_single_agent_is_healthy() {
        let mut mgr = manager("ring");
        mgr.connect(&agents(1)).unwrap();
        assert_eq!(mgr.metrics().health_score, 1.0);
        assert_eq!(mgr.metrics().total_connections, 0);
    }
}
