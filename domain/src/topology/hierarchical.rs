//! Hierarchical topology

use super::strategy::{Connection, Member, RolePolicy, Route, TopologyStrategy};
use crate::agent::{Agent, AgentId};

/// Tag that marks an agent as a coordinator candidate under
/// [`RolePolicy::RoleTag`]
pub const COORDINATOR_TAG: &str = "coordinator";

/// A designated coordinator connects to every other agent. Routes between
/// two non-coordinators always pass through the coordinator (2 hops). When
/// the coordinator is removed a new one is elected under the same policy.
#[derive(Debug)]
pub struct HierarchicalTopology {
    policy: RolePolicy,
    members: Vec<Member>,
    coordinator: Option<AgentId>,
}

impl HierarchicalTopology {
    pub fn new(policy: RolePolicy) -> Self {
        Self {
            policy,
            members: Vec::new(),
            coordinator: None,
        }
    }

    /// The current coordinator, if any agents are connected
    pub fn coordinator(&self) -> Option<&AgentId> {
        self.coordinator.as_ref()
    }

    /// Re-run role selection over current members
    pub fn elect_new_coordinator(&mut self) -> Option<AgentId> {
        self.coordinator = self.policy.select(&self.members);
        self.coordinator.clone()
    }

    fn contains(&self, id: &AgentId) -> bool {
        self.members.iter().any(|m| &m.id == id)
    }
}

impl TopologyStrategy for HierarchicalTopology {
    fn name(&self) -> &'static str {
        "hierarchical"
    }

    fn connect(&mut self, agents: &[Agent]) -> Vec<Connection> {
        self.members = agents
            .iter()
            .map(|a| Member::from_agent(a, COORDINATOR_TAG))
            .collect();
        self.elect_new_coordinator();
        self.connections()
    }

    fn add_agents(&mut self, agents: &[Agent]) {
        for agent in agents {
            if !self.contains(&agent.id) {
                self.members.push(Member::from_agent(agent, COORDINATOR_TAG));
            }
        }
        if self.coordinator.is_none() {
            self.elect_new_coordinator();
        }
    }

    fn remove_agents(&mut self, agent_ids: &[AgentId]) {
        self.members.retain(|m| !agent_ids.contains(&m.id));
        if self
            .coordinator
            .as_ref()
            .is_some_and(|c| agent_ids.contains(c))
        {
            self.elect_new_coordinator();
        }
    }

    fn connections(&self) -> Vec<Connection> {
        let Some(coordinator) = &self.coordinator else {
            return Vec::new();
        };
        let mut edges = Vec::new();
        for member in &self.members {
            if &member.id != coordinator {
                edges.push(Connection::new(coordinator.clone(), member.id.clone()));
                edges.push(Connection::new(member.id.clone(), coordinator.clone()));
            }
        }
        edges
    }

    fn neighbors(&self, agent_id: &AgentId) -> Vec<AgentId> {
        let Some(coordinator) = &self.coordinator else {
            return Vec::new();
        };
        if !self.contains(agent_id) {
            return Vec::new();
        }
        if agent_id == coordinator {
            self.members
                .iter()
                .filter(|m| &m.id != coordinator)
                .map(|m| m.id.clone())
                .collect()
        } else {
            vec![coordinator.clone()]
        }
    }

    fn route(&self, from: &AgentId, to: &AgentId) -> Option<Route> {
        let coordinator = self.coordinator.as_ref()?;
        if !self.contains(from) || !self.contains(to) {
            return None;
        }
        if from == to {
            return Some(Route {
                path: vec![from.clone()],
                hops: 0,
            });
        }
        if from == coordinator || to == coordinator {
            return Some(Route {
                path: vec![from.clone(), to.clone()],
                hops: 1,
            });
        }
        Some(Route {
            path: vec![from.clone(), coordinator.clone(), to.clone()],
            hops: 2,
        })
    }

    fn agent_ids(&self) -> Vec<AgentId> {
        self.members.iter().map(|m| m.id.clone()).collect()
    }
}
