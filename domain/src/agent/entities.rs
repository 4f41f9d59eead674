//! Agent entity and its lifecycle types
//!
//! An [`Agent`] is a logical worker unit. Its business logic lives outside
//! the swarm (behind the factory and gateway ports); what the swarm manages
//! is the agent's type, status, load and health bookkeeping.

use super::value_objects::{AgentId, Task};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Role an agent plays in the authorization platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    /// Threat detection
    Guardian,
    /// Pattern and risk scoring
    Analyst,
    /// Advisory opinions (non-binding)
    Advisor,
    /// Enforcement actions
    Enforcer,
    /// Swarm-internal coordination role
    Coordinator,
    /// Deployment-specific role
    Custom(String),
}

impl AgentType {
    /// Stable lowercase name used in events and config files
    pub fn as_str(&self) -> &str {
        match self {
            AgentType::Guardian => "guardian",
            AgentType::Analyst => "analyst",
            AgentType::Advisor => "advisor",
            AgentType::Enforcer => "enforcer",
            AgentType::Coordinator => "coordinator",
            AgentType::Custom(name) => name,
        }
    }
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AgentType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "guardian" => AgentType::Guardian,
            "analyst" => AgentType::Analyst,
            "advisor" => AgentType::Advisor,
            "enforcer" => AgentType::Enforcer,
            "coordinator" => AgentType::Coordinator,
            other => AgentType::Custom(other.to_string()),
        })
    }
}

/// Lifecycle status of an agent.
///
/// idle ⇄ busy on assignment/completion; idle/busy → unhealthy on a failed
/// health check and back to idle on recovery; any state → draining → dead on
/// removal or shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Idle,
    Busy,
    Unhealthy,
    Draining,
    Dead,
}

impl AgentStatus {
    /// Whether the agent can still receive work (idle or busy)
    pub fn is_workable(&self) -> bool {
        matches!(self, AgentStatus::Idle | AgentStatus::Busy)
    }

    /// Whether the agent is on its way out or gone
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentStatus::Draining | AgentStatus::Dead)
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Busy => "busy",
            AgentStatus::Unhealthy => "unhealthy",
            AgentStatus::Draining => "draining",
            AgentStatus::Dead => "dead",
        };
        write!(f, "{s}")
    }
}

/// Logical connection metadata. The swarm never opens sockets; real
/// transport is an external concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub host: String,
    pub port: u16,
    pub protocol: String,
    pub secure: bool,
}

/// Descriptive metadata attached to an agent at spawn time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMetadata {
    /// Creation timestamp, milliseconds since epoch
    pub created_at: u64,
    pub version: String,
    pub tags: Vec<String>,
    /// Weighting hint for the weighted balancing strategy
    pub priority: u8,
    /// Free-form attributes
    pub attributes: HashMap<String, String>,
}

impl AgentMetadata {
    pub fn new(created_at: u64) -> Self {
        Self {
            created_at,
            version: "1.0.0".to_string(),
            tags: Vec::new(),
            priority: 1,
            attributes: HashMap::new(),
        }
    }
}

/// A logical worker unit of a given type with capability, health and load
/// state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub agent_type: AgentType,
    pub status: AgentStatus,
    pub capabilities: BTreeSet<String>,
    /// Utilization in [0, 1]
    pub load: f64,
    pub metadata: AgentMetadata,
    /// Last heartbeat timestamp, milliseconds since epoch
    pub last_heartbeat: u64,
    pub connection: Option<ConnectionInfo>,
}

impl Agent {
    /// Create an idle agent with a fresh heartbeat
    pub fn new(id: impl Into<AgentId>, agent_type: AgentType, now_millis: u64) -> Self {
        Self {
            id: id.into(),
            agent_type,
            status: AgentStatus::Idle,
            capabilities: BTreeSet::new(),
            load: 0.0,
            metadata: AgentMetadata::new(now_millis),
            last_heartbeat: now_millis,
            connection: None,
        }
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities
            .extend(capabilities.into_iter().map(Into::into));
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.metadata.priority = priority;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.metadata.tags.push(tag.into());
        self
    }

    pub fn with_connection(mut self, connection: ConnectionInfo) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Whether the agent advertises the capability
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    /// Whether the agent satisfies every capability the task requires
    pub fn satisfies(&self, task: &Task) -> bool {
        task.required_capabilities
            .iter()
            .all(|c| self.has_capability(c))
    }

    /// Whether the agent can accept new work under the given load ceiling
    pub fn is_available(&self, load_ceiling: f64) -> bool {
        self.status.is_workable() && self.load < load_ceiling
    }

    /// Record a heartbeat at the given timestamp
    pub fn record_heartbeat(&mut self, now_millis: u64) {
        self.last_heartbeat = now_millis;
    }

    /// Whether the last heartbeat is stale relative to the threshold
    pub fn heartbeat_stale(&self, now_millis: u64, threshold_ms: u64) -> bool {
        now_millis.saturating_sub(self.last_heartbeat) > threshold_ms
    }
}
