//! Star topology

use super::strategy::{Connection, Member, RolePolicy, Route, TopologyStrategy};
use crate::agent::{Agent, AgentId};

/// Tag that marks an agent as a hub candidate under [`RolePolicy::RoleTag`]
pub const HUB_TAG: &str = "hub";

/// A designated hub connects to every leaf; leaves have exactly one
/// neighbor (the hub) and leaf-to-leaf routes are 2 hops via the hub.
#[derive(Debug)]
pub struct StarTopology {
    policy: RolePolicy,
    members: Vec<Member>,
    hub: Option<AgentId>,
}

impl StarTopology {
    pub fn new(policy: RolePolicy) -> Self {
        Self {
            policy,
            members: Vec::new(),
            hub: None,
        }
    }

    /// The current hub, if any agents are connected
    pub fn hub(&self) -> Option<&AgentId> {
        self.hub.as_ref()
    }

    fn elect_hub(&mut self) {
        self.hub = self.policy.select(&self.members);
    }

    fn contains(&self, id: &AgentId) -> bool {
        self.members.iter().any(|m| &m.id == id)
    }
}

impl TopologyStrategy for StarTopology {
    fn name(&self) -> &'static str {
        "star"
    }

    fn connect(&mut self, agents: &[Agent]) -> Vec<Connection> {
        self.members = agents
            .iter()
            .map(|a| Member::from_agent(a, HUB_TAG))
            .collect();
        self.elect_hub();
        self.connections()
    }

    fn add_agents(&mut self, agents: &[Agent]) {
        for agent in agents {
            if !self.contains(&agent.id) {
                self.members.push(Member::from_agent(agent, HUB_TAG));
            }
        }
        if self.hub.is_none() {
            self.elect_hub();
        }
    }

    fn remove_agents(&mut self, agent_ids: &[AgentId]) {
        self.members.retain(|m| !agent_ids.contains(&m.id));
        if self.hub.as_ref().is_some_and(|h| agent_ids.contains(h)) {
            self.elect_hub();
        }
    }

    fn connections(&self) -> Vec<Connection> {
        let Some(hub) = &self.hub else {
            return Vec::new();
        };
        let mut edges = Vec::new();
        for member in &self.members {
            if &member.id != hub {
                edges.push(Connection::new(hub.clone(), member.id.clone()));
                edges.push(Connection::new(member.id.clone(), hub.clone()));
            }
        }
        edges
    }

    fn neighbors(&self, agent_id: &AgentId) -> Vec<AgentId> {
        let Some(hub) = &self.hub else {
            return Vec::new();
        };
        if !self.contains(agent_id) {
            return Vec::new();
        }
        if agent_id == hub {
            self.members
                .iter()
                .filter(|m| &m.id != hub)
                .map(|m| m.id.clone())
                .collect()
        } else {
            vec![hub.clone()]
        }
    }

    fn route(&self, from: &AgentId, to: &AgentId) -> Option<Route> {
        let hub = self.hub.as_ref()?;
        if !self.contains(from) || !self.contains(to) {
            return None;
        }
        if from == to {
            return Some(Route {
                path: vec![from.clone()],
                hops: 0,
            });
        }
        if from == hub || to == hub {
            return Some(Route {
                path: vec![from.clone(), to.clone()],
                hops: 1,
            });
        }
        Some(Route {
            path: vec![from.clone(), hub.clone(), to.clone()],
            hops: 2,
        })
    }

    fn agent_ids(&self) -> Vec<AgentId> {
        self.members.iter().map(|m| m.id.clone()).collect()
    }
}
