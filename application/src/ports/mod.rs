//! Port definitions (interfaces to the outside world)

pub mod agent_factory;
pub mod agent_gateway;

pub use agent_factory::{AgentFactory, FactoryError, HealthCheckResult, SpawnRequest};
pub use agent_gateway::{AgentGateway, AgentGatewayError, AgentVerdict};
