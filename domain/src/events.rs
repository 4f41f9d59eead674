//! Swarm events
//!
//! Every observable state change in the swarm is published as a
//! [`SwarmEvent`]. The union is closed: one variant per event name, each
//! with its own strongly-typed payload, so external monitoring never has to
//! parse loosely-typed maps.

use crate::agent::{AgentId, AgentType, TaskId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An observable swarm state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SwarmEvent {
    AgentSpawned {
        agent_id: AgentId,
        agent_type: AgentType,
    },
    AgentRecycled {
        agent_id: AgentId,
        agent_type: AgentType,
    },
    AgentHealthCheck {
        agent_id: AgentId,
        healthy: bool,
        latency_ms: u64,
    },
    ScaleUp {
        from: usize,
        to: usize,
        reason: String,
    },
    ScaleDown {
        from: usize,
        to: usize,
        reason: String,
    },
    TopologyRebalanced {
        strategy: String,
        connections: usize,
    },
    AgentAdded {
        agent_id: AgentId,
    },
    AgentRemoved {
        agent_id: AgentId,
    },
    TaskAssigned {
        task_id: TaskId,
        agent_id: AgentId,
    },
    AuthzAgentsRegistered {
        total: usize,
        by_type: HashMap<String, usize>,
    },
    TaskDispatched {
        request_id: String,
        agent_type: AgentType,
        agent_id: AgentId,
    },
    TaskCompleted {
        request_id: String,
        agent_type: AgentType,
        success: bool,
        latency_ms: u64,
    },
}

impl SwarmEvent {
    /// The wire name of this event
    pub fn name(&self) -> &'static str {
        match self {
            SwarmEvent::AgentSpawned { .. } => "agent_spawned",
            SwarmEvent::AgentRecycled { .. } => "agent_recycled",
            SwarmEvent::AgentHealthCheck { .. } => "agent_health_check",
            SwarmEvent::ScaleUp { .. } => "scale_up",
            SwarmEvent::ScaleDown { .. } => "scale_down",
            SwarmEvent::TopologyRebalanced { .. } => "topology_rebalanced",
            SwarmEvent::AgentAdded { .. } => "agent_added",
            SwarmEvent::AgentRemoved { .. } => "agent_removed",
            SwarmEvent::TaskAssigned { .. } => "task_assigned",
            SwarmEvent::AuthzAgentsRegistered { .. } => "authz_agents_registered",
            SwarmEvent::TaskDispatched { .. } => "task_dispatched",
            SwarmEvent::TaskCompleted { .. } => "task_completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_match_serde_tag() {
        let event = SwarmEvent::AgentSpawned {
            agent_id: AgentId::new("agent-1"),
            agent_type: AgentType::Guardian,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], event.name());
        assert_eq!(json["agent_type"], "guardian");
    }

    #[test]
    fn test_scale_event_payload() {
        let event = SwarmEvent::ScaleUp {
            from: 2,
            to: 4,
            reason: "utilization above threshold".to_string(),
        };
        assert_eq!(event.name(), "scale_up");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["from"], 2);
        assert_eq!(json["to"], 4);
    }
}
