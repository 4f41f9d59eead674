//! Application layer for warden-swarm
//!
//! This crate contains the coordinator, the agent pool, port definitions
//! and application configuration. It depends only on the domain layer.

pub mod config;
pub mod coordinator;
pub mod events;
pub mod pool;
pub mod ports;

// Re-export commonly used types
pub use config::SwarmConfig;
pub use coordinator::SwarmCoordinator;
pub use events::EventBus;
pub use pool::{AgentPool, PoolMetrics, TypeCapacity, TypeHealth};
pub use ports::{
    agent_factory::{AgentFactory, FactoryError, HealthCheckResult, SpawnRequest},
    agent_gateway::{AgentGateway, AgentGatewayError, AgentVerdict},
};
