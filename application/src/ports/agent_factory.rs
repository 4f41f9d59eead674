//! Agent factory port
//!
//! Defines the interface for provisioning and probing agent instances.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use warden_domain::{Agent, AgentId, AgentType};

/// Errors that can occur while provisioning or probing agents
#[derive(Error, Debug)]
pub enum FactoryError {
    #[error("Provisioning failed: {0}")]
    ProvisioningFailed(String),

    #[error("Unknown agent: {0}")]
    UnknownAgent(AgentId),

    #[error("Health probe failed: {0}")]
    ProbeFailed(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// Instructions for creating one agent.
///
/// The pool mints the id before calling the factory so that a reserved
/// slot and the created agent always agree on identity.
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub id: AgentId,
    pub agent_type: AgentType,
    pub capabilities: Vec<String>,
    pub priority: u8,
    pub tags: Vec<String>,
    pub attributes: HashMap<String, String>,
}

impl SpawnRequest {
    pub fn new(id: impl Into<AgentId>, agent_type: AgentType) -> Self {
        Self {
            id: id.into(),
            agent_type,
            capabilities: Vec::new(),
            priority: 1,
            tags: Vec::new(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = String>) -> Self {
        self.capabilities.extend(capabilities);
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// Outcome of a single health probe
#[derive(Debug, Clone)]
pub struct HealthCheckResult {
    pub agent_id: AgentId,
    pub healthy: bool,
    pub latency_ms: u64,
    pub checked_at: u64,
    pub error: Option<String>,
}

/// Factory for agent instances
///
/// This port defines how the application layer provisions, destroys, and
/// probes agents. Implementations (adapters) live in the infrastructure
/// layer.
#[async_trait]
pub trait AgentFactory: Send + Sync {
    /// Provision a new agent instance
    async fn create(&self, request: SpawnRequest) -> Result<Agent, FactoryError>;

    /// Tear down an agent instance and release its resources
    async fn destroy(&self, agent_id: &AgentId) -> Result<(), FactoryError>;

    /// Probe one agent for liveness
    async fn health_check(&self, agent_id: &AgentId) -> Result<HealthCheckResult, FactoryError>;
}
