//! Agent domain value objects - identifiers, tasks and assignments.
//!
//! # Identifiers
//! - [`AgentId`] - Unique identifier for an agent, owned by the pool
//! - [`TaskId`] - Unique identifier for a unit of work
//!
//! # Work
//! - [`Task`] - A unit of work routed to an agent
//! - [`TaskMetadata`] - Sticky-session keys attached to a task
//! - [`Assignment`] - The record binding a task to an agent

use serde::{Deserialize, Serialize};

/// Unique identifier for an agent.
///
/// Agent ids are minted by the pool and are unique for the lifetime of the
/// swarm; every other component refers to agents only by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(String);

impl AgentId {
    /// Creates an AgentId from an existing string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a TaskId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session keys used for sticky routing.
///
/// Precedence when resolving a sticky session is
/// `session_id` > `user_id` > `resource_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMetadata {
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub resource_id: Option<String>,
}

impl TaskMetadata {
    /// The sticky-session key for this metadata, if any key is present
    pub fn sticky_key(&self) -> Option<String> {
        if let Some(s) = &self.session_id {
            return Some(format!("session:{s}"));
        }
        if let Some(u) = &self.user_id {
            return Some(format!("user:{u}"));
        }
        self.resource_id.as_ref().map(|r| format!("resource:{r}"))
    }
}

/// A unit of work to be routed to an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task id
    pub id: TaskId,
    /// Kind of work (e.g. "authz:threat_check")
    pub task_type: String,
    /// Priority, higher is more urgent
    pub priority: u8,
    /// Opaque payload forwarded to the agent
    pub payload: serde_json::Value,
    /// Creation timestamp, milliseconds since epoch
    pub created_at: u64,
    /// Capabilities the selected agent must advertise
    pub required_capabilities: Vec<String>,
    /// Sticky-session keys
    pub metadata: TaskMetadata,
}

impl Task {
    /// Create a task with default priority and an empty payload
    pub fn new(id: impl Into<TaskId>, task_type: impl Into<String>, created_at: u64) -> Self {
        Self {
            id: id.into(),
            task_type: task_type.into(),
            priority: 0,
            payload: serde_json::Value::Null,
            created_at,
            required_capabilities: Vec::new(),
            metadata: TaskMetadata::default(),
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.required_capabilities.push(capability.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.metadata.session_id = Some(session_id.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.metadata.user_id = Some(user_id.into());
        self
    }

    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.metadata.resource_id = Some(resource_id.into());
        self
    }
}

/// Record binding a task to the agent it was assigned to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub task_id: TaskId,
    pub agent_id: AgentId,
    /// Assignment timestamp, milliseconds since epoch
    pub assigned_at: u64,
}
