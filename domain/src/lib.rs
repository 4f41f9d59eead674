//! Domain layer for warden-swarm
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Swarm
//!
//! An authorization swarm is a fleet of typed agents coordinated as one
//! decision fabric:
//!
//! - **Agent Pool**: lifecycle, health, and auto-scaling of agent instances
//! - **Load Balancer**: pluggable task-to-agent assignment strategies
//! - **Topology**: a logical connectivity graph over the fleet
//! - **Consensus**: sampling quorum voting over agent decisions
//!
//! ## Agent Types
//!
//! Agents carry a role (`Guardian`, `Analyst`, `Advisor`, `Enforcer`,
//! `Coordinator`) that the authorization pipeline dispatches stages to.

pub mod agent;
pub mod authz;
pub mod balancer;
pub mod config;
pub mod consensus;
pub mod core;
pub mod events;
pub mod topology;

// Re-export commonly used types
pub use agent::{
    Agent, AgentId, AgentMetadata, AgentStatus, AgentType, Assignment, ConnectionInfo, Task,
    TaskId, TaskMetadata,
};
pub use authz::{
    AgentDecision, AuthzDecision, AuthzRequest, PipelineResult, aggregate_decisions,
    decision_from_consensus,
};
pub use balancer::{
    AdaptiveStrategy, AgentLoad, HealthScore, LeastConnectionsStrategy, LoadBalancer,
    LoadBalancingStrategy, RoundRobinStrategy, WeightedStrategy, strategy_for,
};
pub use config::{
    BalancerConfig, ConsensusConfig, PoolConfig, ScalingPolicy, ScalingRule, TopologyConfig,
};
pub use consensus::{ConsensusEngine, ConsensusResult, ConsensusVote};
pub use core::{Clock, ManualClock, SwarmError, SystemClock};
pub use events::SwarmEvent;
pub use topology::{
    AdaptiveTopology, Connection, HierarchicalTopology, MeshTopology, RingTopology, RolePolicy,
    Route, StarTopology, TopologyManager, TopologyMetrics, TopologyStrategy,
};
