//! Topology strategy contract
//!
//! A topology is a logical connectivity graph over agent ids, independent
//! of physical networking. Strategies own their member lists and edges are
//! recomputed from membership, never mutated directly.

use crate::agent::{Agent, AgentId};
use serde::{Deserialize, Serialize};

/// A directed logical edge between two agents
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub from: AgentId,
    pub to: AgentId,
}

impl Connection {
    pub fn new(from: impl Into<AgentId>, to: impl Into<AgentId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// An ordered path between two agents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub path: Vec<AgentId>,
    pub hops: usize,
}

/// How the hub/coordinator role is chosen.
///
/// Hub identity is an explicit policy, never an accident of spawn order:
/// `RoleTag` prefers an agent tagged with the role name and falls back to
/// the first registered member when no tag is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RolePolicy {
    #[default]
    RoleTag,
    HighestPriority,
    FirstRegistered,
}

/// Membership snapshot kept by role-aware strategies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: AgentId,
    pub priority: u8,
    pub role_tagged: bool,
}

impl Member {
    /// Capture the fields role selection needs from an agent
    pub fn from_agent(agent: &Agent, role_tag: &str) -> Self {
        Self {
            id: agent.id.clone(),
            priority: agent.metadata.priority,
            role_tagged: agent.metadata.tags.iter().any(|t| t == role_tag),
        }
    }
}

impl RolePolicy {
    /// Pick the role holder among members (registration order preserved)
    pub fn select(&self, members: &[Member]) -> Option<AgentId> {
        match self {
            RolePolicy::RoleTag => members
                .iter()
                .find(|m| m.role_tagged)
                .or_else(|| members.first())
                .map(|m| m.id.clone()),
            RolePolicy::HighestPriority => members
                .iter()
                .max_by_key(|m| m.priority)
                .map(|m| m.id.clone()),
            RolePolicy::FirstRegistered => members.first().map(|m| m.id.clone()),
        }
    }
}

/// A pluggable logical-connectivity model.
pub trait TopologyStrategy: Send + Sync {
    /// Registry name of this strategy
    fn name(&self) -> &'static str;

    /// Rebuild the graph from scratch for the given membership
    fn connect(&mut self, agents: &[Agent]) -> Vec<Connection>;

    /// Incrementally add members
    fn add_agents(&mut self, agents: &[Agent]);

    /// Incrementally remove members
    fn remove_agents(&mut self, agent_ids: &[AgentId]);

    /// All current directed edges
    fn connections(&self) -> Vec<Connection>;

    /// Direct neighbors of an agent
    fn neighbors(&self, agent_id: &AgentId) -> Vec<AgentId>;

    /// A route between two agents, or None when either side is absent
    fn route(&self, from: &AgentId, to: &AgentId) -> Option<Route>;

    /// Current member ids, in registration order
    fn agent_ids(&self) -> Vec<AgentId>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentType;

    fn member(id: &str, priority: u8, tagged: bool) -> Member {
        Member {
            id: AgentId::new(id),
            priority,
            role_tagged: tagged,
        }
    }

    #[test]
    fn test_role_tag_policy_prefers_tag() {
        let members = vec![member("a", 1, false), member("b", 1, true)];
        assert_eq!(RolePolicy::RoleTag.select(&members), Some(AgentId::new("b")));
    }

    #[test]
    fn test_role_tag_policy_falls_back_to_first() {
        let members = vec![member("a", 1, false), member("b", 1, false)];
        assert_eq!(RolePolicy::RoleTag.select(&members), Some(AgentId::new("a")));
    }

    #[test]
    fn test_highest_priority_policy() {
        let members = vec![member("a", 1, false), member("b", 9, false)];
        assert_eq!(
            RolePolicy::HighestPriority.select(&members),
            Some(AgentId::new("b"))
        );
    }

    #[test]
    fn test_member_captures_role_tag() {
        let agent = Agent::new("a", AgentType::Coordinator, 0).with_tag("coordinator");
        let member = Member::from_agent(&agent, "coordinator");
        assert!(member.role_tagged);
        let member = Member::from_agent(&agent, "hub");
        assert!(!member.role_tagged);
    }

    #[test]
    fn test_empty_members_selects_none() {
        assert_eq!(RolePolicy::RoleTag.select(&[]), None);
    }
}
