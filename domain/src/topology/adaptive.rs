//! Adaptive topology

use super::hierarchical::HierarchicalTopology;
use super::mesh::MeshTopology;
use super::strategy::{Connection, RolePolicy, Route, TopologyStrategy};
use crate::agent::{Agent, AgentId};

/// Wraps mesh for small swarms and hierarchical above a size threshold.
///
/// Membership changes are applied to the active inner strategy;
/// [`AdaptiveTopology::rebalance`] re-evaluates the swarm size and rebuilds
/// under the other strategy when the threshold is crossed.
pub struct AdaptiveTopology {
    switch_threshold: usize,
    policy: RolePolicy,
    /// Membership cache used to rebuild after a switch
    roster: Vec<Agent>,
    inner: Box<dyn TopologyStrategy>,
}

impl AdaptiveTopology {
    pub fn new(switch_threshold: usize, policy: RolePolicy) -> Self {
        Self {
            switch_threshold: switch_threshold.max(1),
            policy,
            roster: Vec::new(),
            inner: Box::new(MeshTopology::new()),
        }
    }

    /// Name of the strategy currently in effect
    pub fn active_strategy(&self) -> &'static str {
        self.inner.name()
    }

    /// Re-evaluate swarm size; returns true when the inner strategy was
    /// switched and rebuilt
    pub fn rebalance(&mut self) -> bool {
        let want_hierarchical = self.roster.len() >= self.switch_threshold;
        let is_hierarchical = self.inner.name() == "hierarchical";
        if want_hierarchical == is_hierarchical {
            return false;
        }
        self.inner = if want_hierarchical {
            Box::new(HierarchicalTopology::new(self.policy))
        } else {
            Box::new(MeshTopology::new())
        };
        let roster = self.roster.clone();
        self.inner.connect(&roster);
        true
    }
}

impl TopologyStrategy for AdaptiveTopology {
    fn name(&self) -> &'static str {
        "adaptive"
    }

    fn connect(&mut self, agents: &[Agent]) -> Vec<Connection> {
        self.roster = agents.to_vec();
        self.inner = if self.roster.len() >= self.switch_threshold {
            Box::new(HierarchicalTopology::new(self.policy))
        } else {
            Box::new(MeshTopology::new())
        };
        self.inner.connect(agents)
    }

    fn add_agents(&mut self, agents: &[Agent]) {
        for agent in agents {
            if !self.roster.iter().any(|a| a.id == agent.id) {
                self.roster.push(agent.clone());
            }
        }
        self.inner.add_agents(agents);
        self.rebalance();
    }

    fn remove_agents(&mut self, agent_ids: &[AgentId]) {
        self.roster.retain(|a| !agent_ids.contains(&a.id));
        self.inner.remove_agents(agent_ids);
        self.rebalance();
    }

    fn connections(&self) -> Vec<Connection> {
        self.inner.connections()
    }

    fn neighbors(&self, agent_id: &AgentId) -> Vec<AgentId> {
        self.inner.neighbors(agent_id)
    }

    fn route(&self, from: &AgentId, to: &AgentId) -> Option<Route> {
        self.inner.route(from, to)
    }

    fn agent_ids(&self) -> Vec<AgentId> {
        self.inner.agent_ids()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentType;

    fn agents(range: std::ops::RangeInclusive<usize>) -> Vec<Agent> {
        range
            .map(|i| Agent::new(format!("agent-{i}"), AgentType::Guardian, 0))
            .collect()
    }

    #[test]
    fn test_small_swarm_uses_mesh() {
        let mut topo = AdaptiveTopology::new(5, RolePolicy::FirstRegistered);
        topo.connect(&agents(1..=3));
        assert_eq!(topo.active_strategy(), "mesh");
        assert_eq!(topo.connections().len(), 6);
    }

    #[test]
    fn test_large_swarm_uses_hierarchical() {
        let mut topo = AdaptiveTopology::new(5, RolePolicy::FirstRegistered);
        topo.connect(&agents(1..=6));
        assert_eq!(topo.active_strategy(), "hierarchical");
        // hub <-> 5 leaves, both directions
        assert_eq!(topo.connections().len(), 10);
    }

    #[test]
    fn test_growth_switches_strategy() {
        let mut topo = AdaptiveTopology::new(4, RolePolicy::FirstRegistered);
        topo.connect(&agents(1..=3));
        assert_eq!(topo.active_strategy(), "mesh");

        topo.add_agents(&agents(4..=4));
        assert_eq!(topo.active_strategy(), "hierarchical");

        // Routes survive the switch
        let route = topo
            .route(&AgentId::new("agent-2"), &AgentId::new("agent-3"))
            .unwrap();
        assert_eq!(route.hops, 2);
    }

    #[test]
    fn test_shrink_switches_back() {
        let mut topo = AdaptiveTopology::new(4, RolePolicy::FirstRegistered);
        topo.connect(&agents(1..=5));
        assert_eq!(topo.active_strategy(), "hierarchical");

        topo.remove_agents(&[AgentId::new("agent-4"), AgentId::new("agent-5")]);
        assert_eq!(topo.active_strategy(), "mesh");
        let route = topo
            .route(&AgentId::new("agent-2"), &AgentId::new("agent-3"))
            .unwrap();
        assert_eq!(route.hops, 1);
    }

    #[test]
    fn test_rebalance_without_change_is_noop() {
        let mut topo = AdaptiveTopology::new(4, RolePolicy::FirstRegistered);
        topo.connect(&agents(1..=3));
        assert!(!topo.rebalance());
    }
}
