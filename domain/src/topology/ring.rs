//! Ring topology

use super::strategy::{Connection, Route, TopologyStrategy};
use crate::agent::{Agent, AgentId};

/// Agents form a cycle in registration order; each is connected to its two
/// neighbors with wraparound. Routes follow the shorter direction around
/// the ring (ties go clockwise).
#[derive(Debug, Default)]
pub struct RingTopology {
    members: Vec<AgentId>,
}

impl RingTopology {
    pub fn new() -> Self {
        Self::default()
    }

    fn index_of(&self, id: &AgentId) -> Option<usize> {
        self.members.iter().position(|m| m == id)
    }
}

impl TopologyStrategy for RingTopology {
    fn name(&self) -> &'static str {
        "ring"
    }

    fn connect(&mut self, agents: &[Agent]) -> Vec<Connection> {
        self.members = agents.iter().map(|a| a.id.clone()).collect();
        self.connections()
    }

    fn add_agents(&mut self, agents: &[Agent]) {
        for agent in agents {
            if self.index_of(&agent.id).is_none() {
                self.members.push(agent.id.clone());
            }
        }
    }

    fn remove_agents(&mut self, agent_ids: &[AgentId]) {
        self.members.retain(|m| !agent_ids.contains(m));
    }

    fn connections(&self) -> Vec<Connection> {
        let n = self.members.len();
        if n < 2 {
            return Vec::new();
        }
        let mut edges = Vec::with_capacity(n * 2);
        for (i, from) in self.members.iter().enumerate() {
            let next = &self.members[(i + 1) % n];
            edges.push(Connection::new(from.clone(), next.clone()));
            edges.push(Connection::new(next.clone(), from.clone()));
        }
        if n == 2 {
            edges.truncate(2);
        }
        edges
    }

    fn neighbors(&self, agent_id: &AgentId) -> Vec<AgentId> {
        let n = self.members.len();
        let Some(i) = self.index_of(agent_id) else {
            return Vec::new();
        };
        if n < 2 {
            return Vec::new();
        }
        let prev = self.members[(i + n - 1) % n].clone();
        let next = self.members[(i + 1) % n].clone();
        if prev == next {
            vec![prev]
        } else {
            vec![prev, next]
        }
    }

    fn route(&self, from: &AgentId, to: &AgentId) -> Option<Route> {
        let n = self.members.len();
        let from_idx = self.index_of(from)?;
        let to_idx = self.index_of(to)?;

        if from_idx == to_idx {
            return Some(Route {
                path: vec![from.clone()],
                hops: 0,
            });
        }

        let clockwise = (to_idx + n - from_idx) % n;
        let counter = n - clockwise;

        let mut path = Vec::new();
        if clockwise <= counter {
            for step in 0..=clockwise {
                path.push(self.members[(from_idx + step) % n].clone());
            }
        } else {
            for step in 0..=counter {
                path.push(self.members[(from_idx + n - step) % n].clone());
            }
        }
        let hops = path.len() - 1;
        Some(Route { path, hops })
    }

    fn agent_ids(&self) -> Vec<AgentId> {
        self.members.clone()
    }
}
