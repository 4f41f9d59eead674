//! In-memory agent factory adapter
//!
//! Default [`AgentFactory`] implementation backing local deployments and
//! tests. Agents are bookkeeping records only; no process or socket is
//! created. The factory keeps ledgers of what it created and destroyed and
//! exposes failure knobs so callers can exercise degraded paths.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::debug;
use warden_application::ports::{AgentFactory, FactoryError, HealthCheckResult, SpawnRequest};
use warden_domain::{Agent, AgentId, Clock, ConnectionInfo};

pub struct InMemoryAgentFactory {
    clock: Arc<dyn Clock>,
    created: Mutex<Vec<AgentId>>,
    destroyed: Mutex<Vec<AgentId>>,
    unhealthy: Mutex<HashSet<AgentId>>,
    fail_next_create: AtomicBool,
}

impl InMemoryAgentFactory {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            created: Mutex::new(Vec::new()),
            destroyed: Mutex::new(Vec::new()),
            unhealthy: Mutex::new(HashSet::new()),
            fail_next_create: AtomicBool::new(false),
        }
    }

    /// Make subsequent health probes for this agent fail
    pub fn mark_unhealthy(&self, agent_id: &AgentId) {
        self.unhealthy.lock().unwrap().insert(agent_id.clone());
    }

    /// Let this agent's health probes succeed again
    pub fn mark_healthy(&self, agent_id: &AgentId) {
        self.unhealthy.lock().unwrap().remove(agent_id);
    }

    /// Make the next create call fail once
    pub fn fail_next_create(&self) {
        self.fail_next_create.store(true, Ordering::SeqCst);
    }

    pub fn created(&self) -> Vec<AgentId> {
        self.created.lock().unwrap().clone()
    }

    pub fn destroyed(&self) -> Vec<AgentId> {
        self.destroyed.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentFactory for InMemoryAgentFactory {
    async fn create(&self, request: SpawnRequest) -> Result<Agent, FactoryError> {
        if self.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err(FactoryError::ProvisioningFailed(
                "create failure injected".to_string(),
            ));
        }

        let now = self.clock.now_millis();
        let mut agent = Agent::new(request.id.clone(), request.agent_type, now)
            .with_capabilities(request.capabilities)
            .with_priority(request.priority)
            .with_connection(ConnectionInfo {
                host: "in-memory".to_string(),
                port: 0,
                protocol: "local".to_string(),
                secure: false,
            });
        for tag in request.tags {
            agent = agent.with_tag(tag);
        }
        agent.metadata.attributes.extend(request.attributes);

        self.created.lock().unwrap().push(request.id.clone());
        debug!(agent_id = %request.id, "agent provisioned");
        Ok(agent)
    }

    async fn destroy(&self, agent_id: &AgentId) -> Result<(), FactoryError> {
        if !self.created.lock().unwrap().contains(agent_id) {
            return Err(FactoryError::UnknownAgent(agent_id.clone()));
        }
        self.destroyed.lock().unwrap().push(agent_id.clone());
        self.unhealthy.lock().unwrap().remove(agent_id);
        debug!(%agent_id, "agent destroyed");
        Ok(())
    }

    async fn health_check(&self, agent_id: &AgentId) -> Result<HealthCheckResult, FactoryError> {
        let healthy = !self.unhealthy.lock().unwrap().contains(agent_id);
        Ok(HealthCheckResult {
            agent_id: agent_id.clone(),
            healthy,
            latency_ms: 0,
            checked_at: self.clock.now_millis(),
            error: (!healthy).then(|| "probe failure injected".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_domain::{AgentType, ManualClock};

    fn factory() -> InMemoryAgentFactory {
        InMemoryAgentFactory::new(Arc::new(ManualClock::new(5_000)))
    }

    #[tokio::test]
    async fn test_create_honors_request() {
        let factory = factory();
        let request = SpawnRequest::new("agent-1", AgentType::Analyst)
            .with_capabilities(["risk-scoring".to_string()])
            .with_priority(3)
            .with_tag("coordinator");
        let agent = factory.create(request).await.unwrap();

        assert_eq!(agent.id, AgentId::new("agent-1"));
        assert_eq!(agent.agent_type, AgentType::Analyst);
        assert!(agent.has_capability("risk-scoring"));
        assert_eq!(agent.metadata.priority, 3);
        assert_eq!(agent.metadata.created_at, 5_000);
        assert!(agent.connection.is_some());
    }

    #[tokio::test]
    async fn test_destroy_unknown_agent_errors() {
        let factory = factory();
        let err = factory.destroy(&AgentId::new("ghost")).await.unwrap_err();
        assert!(matches!(err, FactoryError::UnknownAgent(_)));
    }

    #[tokio::test]
    async fn test_health_knobs() {
        let factory = factory();
        let agent = factory
            .create(SpawnRequest::new("agent-1", AgentType::Guardian))
            .await
            .unwrap();

        assert!(factory.health_check(&agent.id).await.unwrap().healthy);
        factory.mark_unhealthy(&agent.id);
        let result = factory.health_check(&agent.id).await.unwrap();
        assert!(!result.healthy);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_injected_create_failure_is_one_shot() {
        let factory = factory();
        factory.fail_next_create();
        assert!(
            factory
                .create(SpawnRequest::new("agent-1", AgentType::Guardian))
                .await
                .is_err()
        );
        assert!(
            factory
                .create(SpawnRequest::new("agent-2", AgentType::Guardian))
                .await
                .is_ok()
        );
    }
}
