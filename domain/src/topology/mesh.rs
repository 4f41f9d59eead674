//! Full-mesh topology

use super::strategy::{Connection, Route, TopologyStrategy};
use crate::agent::{Agent, AgentId};

/// Every pair of agents is bidirectionally connected: n agents yield
/// n·(n−1) directed edges and every route is a single hop.
#[derive(Debug, Default)]
pub struct MeshTopology {
    members: Vec<AgentId>,
}

impl MeshTopology {
    pub fn new() -> Self {
        Self::default()
    }

    fn contains(&self, id: &AgentId) -> bool {
        self.members.iter().any(|m| m == id)
    }
}

impl TopologyStrategy for MeshTopology {
    fn name(&self) -> &'static str {
        "mesh"
    }

    fn connect(&mut self, agents: &[Agent]) -> Vec<Connection> {
        self.members = agents.iter().map(|a| a.id.clone()).collect();
        self.connections()
    }

    fn add_agents(&mut self, agents: &[Agent]) {
        for agent in agents {
            if !self.contains(&agent.id) {
                self.members.push(agent.id.clone());
            }
        }
    }

    fn remove_agents(&mut self, agent_ids: &[AgentId]) {
        self.members.retain(|m| !agent_ids.contains(m));
    }

    fn connections(&self) -> Vec<Connection> {
        let mut edges = Vec::with_capacity(self.members.len().saturating_sub(1) * self.members.len());
        for from in &self.members {
            for to in &self.members {
                if from != to {
                    edges.push(Connection::new(from.clone(), to.clone()));
                }
            }
        }
        edges
    }

    fn neighbors(&self, agent_id: &AgentId) -> Vec<AgentId> {
        if !self.contains(agent_id) {
            return Vec::new();
        }
        self.members
            .iter()
            .filter(|m| *m != agent_id)
            .cloned()
            .collect()
    }

    fn route(&self, from: &AgentId, to: &AgentId) -> Option<Route> {
        if !self.contains(from) || !self.contains(to) {
            return None;
        }
        if from == to {
            return Some(Route {
                path: vec![from.clone()],
                hops: 0,
            });
        }
        Some(Route {
            path: vec![from.clone(), to.clone()],
            hops: 1,
        })
    }

    fn agent_ids(&self) -> Vec<AgentId> {
        self.members.clone()
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

    #[test]
    fn test_mesh_edge_count() {
        let mut mesh = MeshTopology::new();
        let connections = mesh.connect(&agents(5));
        assert_eq!(connections.len(), 5 * 4);
    }

    #[test]
    fn test_every_route_is_one_hop() {
        let mut mesh = MeshTopology::new();
        mesh.connect(&agents(4));
        for i in 1..=4 {
            for j in 1..=4 {
                if i == j {
                    continue;
                }
                let route = mesh
                    .route(
                        &AgentId::new(format!("agent-{i}")),
                        &AgentId::new(format!("agent-{j}")),
                    )
                    .unwrap();
                assert_eq!(route.hops, 1);
            }
        }
    }

    #[test]
    fn test_unknown_agent_routes_none() {
        let mut mesh = MeshTopology::new();
        mesh.connect(&agents(2));
        assert!(
            mesh.route(&AgentId::new("agent-1"), &AgentId::new("ghost"))
                .is_none()
        );
    }

    #[test]
    fn test_incremental_add_remove() {
        let mut mesh = MeshTopology::new();
        mesh.connect(&agents(3));
        mesh.add_agents(&agents(4)[3..]);
        assert_eq!(mesh.connections().len(), 4 * 3);

        mesh.remove_agents(&[AgentId::new("agent-1"), AgentId::new("agent-2")]);
        assert_eq!(mesh.connections().len(), 2);
        assert_eq!(mesh.neighbors(&AgentId::new("agent-3")), vec![AgentId::new("agent-4")]);
    }
}
