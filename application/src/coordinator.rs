//! Swarm coordinator
//!
//! The coordinator wires the pool, balancer, topology and consensus engine
//! into one facade. It owns the multi-stage authorization pipeline: each
//! stage routes a task to one agent of a fixed type through the balancer,
//! collects the agent's verdict through the gateway port, and the stage
//! verdicts are folded into a single decision (optionally validated by a
//! consensus round).

use crate::config::SwarmConfig;
use crate::events::EventBus;
use crate::pool::AgentPool;
use crate::ports::{AgentFactory, AgentGateway};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use warden_domain::{
    Agent, AgentDecision, AgentId, AgentType, Assignment, AuthzRequest, Clock, ConsensusEngine,
    ConsensusResult, ConsensusVote, LoadBalancer, PipelineResult, SwarmError, SwarmEvent, Task,
    TaskId, TopologyManager, TopologyMetrics, aggregate_decisions, decision_from_consensus,
};

/// Pipeline stage order. Advisory agents run last and only when present;
/// any stage with no workable cohort is skipped.
const STAGE_ORDER: [AgentType; 4] = [
    AgentType::Guardian,
    AgentType::Analyst,
    AgentType::Enforcer,
    AgentType::Advisor,
];

pub struct SwarmCoordinator {
    config: SwarmConfig,
    pool: Arc<AgentPool>,
    balancer: Mutex<LoadBalancer>,
    topology: Mutex<TopologyManager>,
    consensus: ConsensusEngine,
    gateway: Arc<dyn AgentGateway>,
    clock: Arc<dyn Clock>,
    events: EventBus,
    initialized: AtomicBool,
}

impl SwarmCoordinator {
    pub fn new(
        config: SwarmConfig,
        factory: Arc<dyn AgentFactory>,
        gateway: Arc<dyn AgentGateway>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SwarmError> {
        config.validate()?;
        let events = EventBus::default();
        let pool = Arc::new(AgentPool::new(
            config.pool.clone(),
            factory,
            Arc::clone(&clock),
            events.clone(),
        )?);
        let balancer = Mutex::new(LoadBalancer::new(config.balancer.clone(), Arc::clone(&clock))?);
        let topology = Mutex::new(TopologyManager::new(config.topology.clone())?);
        let consensus = ConsensusEngine::new(config.consensus.clone());
        Ok(Self {
            config,
            pool,
            balancer,
            topology,
            consensus,
            gateway,
            clock,
            events,
            initialized: AtomicBool::new(false),
        })
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn pool(&self) -> &Arc<AgentPool> {
        &self.pool
    }

    fn ensure_initialized(&self) -> Result<(), SwarmError> {
        if self.initialized.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(SwarmError::NotInitialized)
        }
    }

    /// Spawn the minimum fleet and wire it into the balancer and topology
    pub async fn initialize(&self) -> Result<(), SwarmError> {
        self.pool.initialize().await?;
        let agents = self.pool.agents().await;
        {
            let mut balancer = self.balancer.lock().await;
            balancer.initialize(&agents);
        }
        {
            let mut topology = self.topology.lock().await;
            topology.connect(&agents)?;
        }
        self.initialized.store(true, Ordering::Release);
        info!(agents = agents.len(), "swarm coordinator initialized");
        Ok(())
    }

    /// Spawn a typed cohort for the authorization pipeline, e.g.
    /// `{Guardian: 3, Analyst: 2, Enforcer: 2}`. Best effort under the
    /// capacity bound; returns what was actually spawned.
    pub async fn register_authz_agents(
        &self,
        distribution: &HashMap<AgentType, usize>,
    ) -> Result<Vec<Agent>, SwarmError> {
        self.ensure_initialized()?;
        let spawned = self.pool.spawn_by_type_distribution(distribution).await;

        {
            let mut balancer = self.balancer.lock().await;
            for agent in &spawned {
                balancer.add_agent(agent);
            }
        }
        self.rewire_topology().await?;

        let mut by_type: HashMap<String, usize> = HashMap::new();
        for agent in &spawned {
            *by_type.entry(agent.agent_type.as_str().to_string()).or_insert(0) += 1;
        }
        self.events.emit(SwarmEvent::AuthzAgentsRegistered {
            total: spawned.len(),
            by_type,
        });
        Ok(spawned)
    }

    /// Spawn one agent and wire it into the balancer and topology
    pub async fn spawn_agent(&self, agent_type: AgentType) -> Result<Agent, SwarmError> {
        self.ensure_initialized()?;
        let agent = self.pool.spawn_agent(agent_type).await?;
        {
            let mut balancer = self.balancer.lock().await;
            balancer.add_agent(&agent);
        }
        {
            let mut topology = self.topology.lock().await;
            topology.add_agents(std::slice::from_ref(&agent))?;
        }
        self.events.emit(SwarmEvent::AgentAdded {
            agent_id: agent.id.clone(),
        });
        Ok(agent)
    }

    /// Recycle one agent and remove it everywhere. Returns false for an
    /// unknown agent.
    pub async fn recycle_agent(&self, agent_id: &AgentId) -> Result<bool, SwarmError> {
        self.ensure_initialized()?;
        if !self.pool.recycle_agent(agent_id).await {
            return Ok(false);
        }
        {
            let mut balancer = self.balancer.lock().await;
            balancer.remove_agent(agent_id);
        }
        {
            let mut topology = self.topology.lock().await;
            topology.remove_agents(std::slice::from_ref(agent_id));
        }
        self.events.emit(SwarmEvent::AgentRemoved {
            agent_id: agent_id.clone(),
        });
        Ok(true)
    }

    /// Rebuild the topology from the current fleet
    async fn rewire_topology(&self) -> Result<(), SwarmError> {
        let agents = self.pool.agents().await;
        let mut topology = self.topology.lock().await;
        let connections = topology.connect(&agents)?;
        self.events.emit(SwarmEvent::TopologyRebalanced {
            strategy: topology.strategy_name().to_string(),
            connections: connections.len(),
        });
        Ok(())
    }

    /// Run an authorization request through the typed stage pipeline.
    ///
    /// Each stage consults one agent of its type (sticky-session aware via
    /// the balancer) under the stage timeout. A stage whose agent fails or
    /// times out contributes no verdict; the remaining verdicts still
    /// produce a decision. With `require_consensus` the verdicts are
    /// replayed as votes through the consensus engine.
    pub async fn coordinate_authz_pipeline(
        &self,
        request: AuthzRequest,
    ) -> Result<PipelineResult, SwarmError> {
        self.ensure_initialized()?;
        let started = self.clock.now_millis();
        let counts = self.pool.healthy_agent_count_by_type().await;
        let mut decisions: Vec<AgentDecision> = Vec::new();

        for agent_type in STAGE_ORDER {
            if counts.get(&agent_type).copied().unwrap_or(0) == 0 {
                debug!(request = %request.id, stage = %agent_type, "stage skipped, no cohort");
                continue;
            }
            if let Some(decision) = self.run_stage(&request, &agent_type).await {
                decisions.push(decision);
            }
        }

        let duration_ms = self.clock.now_millis().saturating_sub(started);
        let (decision, confidence, consensus) =
            if request.require_consensus && self.consensus.config().enabled {
                let votes: Vec<ConsensusVote> = decisions.iter().map(|d| d.to_vote()).collect();
                let result = self.consensus.tally(request.id.clone(), &votes, duration_ms);
                (
                    decision_from_consensus(&result),
                    result.avg_confidence,
                    Some(result),
                )
            } else {
                let (decision, confidence) = aggregate_decisions(&decisions);
                (decision, confidence, None)
            };

        Ok(PipelineResult {
            request_id: request.id,
            decision,
            confidence,
            agent_decisions: decisions,
            consensus,
            processing_time_ms: duration_ms,
        })
    }

    async fn run_stage(
        &self,
        request: &AuthzRequest,
        agent_type: &AgentType,
    ) -> Option<AgentDecision> {
        let now = self.clock.now_millis();
        let mut task = Task::new(
            format!("{}:{}", request.id, agent_type),
            format!("authz:{}", request.action),
            now,
        )
        .with_user_id(
            request
                .user_id
                .clone()
                .unwrap_or_else(|| request.subject.clone()),
        )
        .with_resource_id(request.resource.clone());
        if let Some(session_id) = &request.session_id {
            task = task.with_session_id(session_id.clone());
        }
        let task_id = task.id.clone();

        let assignment = {
            let mut balancer = self.balancer.lock().await;
            balancer.route_authz_request(task, agent_type)?
        };
        let agent_id = assignment.agent_id.clone();
        self.events.emit(SwarmEvent::TaskDispatched {
            request_id: request.id.clone(),
            agent_type: agent_type.clone(),
            agent_id: agent_id.clone(),
        });

        let agent = self.pool.agent(&agent_id).await?;
        let timeout = Duration::from_millis(self.config.stage_timeout_ms());
        let outcome = tokio::time::timeout(timeout, self.gateway.evaluate(&agent, request)).await;
        let latency_ms = self.clock.now_millis().saturating_sub(now);

        let verdict = match outcome {
            Ok(Ok(verdict)) => Some(verdict),
            Ok(Err(err)) => {
                warn!(%agent_id, stage = %agent_type, error = %err, "stage evaluation failed");
                None
            }
            Err(_) => {
                warn!(%agent_id, stage = %agent_type, "stage evaluation timed out");
                None
            }
        };
        let success = verdict.is_some();

        {
            let mut balancer = self.balancer.lock().await;
            balancer.complete_task(&task_id, success, latency_ms);
        }
        self.events.emit(SwarmEvent::TaskCompleted {
            request_id: request.id.clone(),
            agent_type: agent_type.clone(),
            success,
            latency_ms,
        });

        verdict.map(|v| AgentDecision {
            agent_type: agent_type.clone(),
            agent_id,
            allowed: v.allowed,
            confidence: v.confidence,
            latency_ms,
        })
    }

    /// Assign an arbitrary task through the balancer. Queued (and `None`
    /// returned) when no agent currently qualifies.
    pub async fn assign_task(&self, task: Task) -> Result<Option<Assignment>, SwarmError> {
        self.ensure_initialized()?;
        let assignment = {
            let mut balancer = self.balancer.lock().await;
            balancer.assign(task)
        };
        if let Some(assignment) = &assignment {
            self.events.emit(SwarmEvent::TaskAssigned {
                task_id: assignment.task_id.clone(),
                agent_id: assignment.agent_id.clone(),
            });
        }
        Ok(assignment)
    }

    /// Report completion of a task handed out by
    /// [`SwarmCoordinator::assign_task`]. Returns false for an unknown task.
    pub async fn complete_task(
        &self,
        task_id: &TaskId,
        success: bool,
        duration_ms: u64,
    ) -> Result<bool, SwarmError> {
        self.ensure_initialized()?;
        let mut balancer = self.balancer.lock().await;
        Ok(balancer.complete_task(task_id, success, duration_ms))
    }

    /// Tally a set of already-collected votes as one consensus round.
    ///
    /// Pure computation over the supplied votes; it touches no swarm state
    /// and is usable before [`SwarmCoordinator::initialize`].
    pub fn run_distributed_consensus(
        &self,
        proposal_id: impl Into<String>,
        votes: &[ConsensusVote],
    ) -> ConsensusResult {
        self.consensus.tally(proposal_id, votes, 0)
    }

    /// Live consensus round: every workable agent is polled concurrently
    /// through the gateway; voters that miss the configured timeout are
    /// excluded from the tally.
    pub async fn run_consensus_round(
        &self,
        proposal_id: impl Into<String>,
        request: &AuthzRequest,
    ) -> Result<ConsensusResult, SwarmError> {
        self.ensure_initialized()?;
        let proposal_id = proposal_id.into();
        let started = self.clock.now_millis();
        let voters: Vec<Agent> = self
            .pool
            .agents()
            .await
            .into_iter()
            .filter(|a| a.status.is_workable())
            .collect();

        let mut ballots = FuturesUnordered::new();
        for agent in &voters {
            let gateway = Arc::clone(&self.gateway);
            ballots.push(async move {
                match gateway.evaluate(agent, request).await {
                    Ok(verdict) => Some(
                        ConsensusVote::new(agent.id.clone(), verdict.allowed)
                            .with_confidence(verdict.confidence),
                    ),
                    Err(err) => {
                        warn!(agent_id = %agent.id, error = %err, "vote dropped");
                        None
                    }
                }
            });
        }

        let deadline = Duration::from_millis(self.consensus.config().timeout_ms);
        let mut votes = Vec::with_capacity(voters.len());
        let collection = async {
            while let Some(ballot) = ballots.next().await {
                if let Some(vote) = ballot {
                    votes.push(vote);
                }
            }
        };
        if tokio::time::timeout(deadline, collection).await.is_err() {
            debug!(%proposal_id, collected = votes.len(), "vote collection hit deadline");
        }

        let duration_ms = self.clock.now_millis().saturating_sub(started);
        Ok(self.consensus.tally(proposal_id, &votes, duration_ms))
    }

    /// Swap the balancing strategy at runtime
    pub async fn set_balancer_strategy(&self, name: &str) -> Result<(), SwarmError> {
        self.ensure_initialized()?;
        let mut balancer = self.balancer.lock().await;
        balancer.set_strategy(name)
    }

    // The accessors below are read-only views and report the configured or
    // empty state before initialization.

    pub async fn balancer_strategy(&self) -> &'static str {
        self.balancer.lock().await.strategy_name()
    }

    pub async fn topology_metrics(&self) -> TopologyMetrics {
        self.topology.lock().await.metrics()
    }

    pub async fn queued_tasks(&self) -> usize {
        self.balancer.lock().await.queued_tasks()
    }

    /// Periodic upkeep: purge expired sticky sessions, retry the queued
    /// backlog once, and evaluate auto-scaling against what remains
    pub async fn run_maintenance(&self) {
        let (expired, assignments, queue_depth) = {
            let mut balancer = self.balancer.lock().await;
            let expired = balancer.cleanup_expired_sessions();
            // Bounded by the backlog observed on entry; a task that still
            // has no agent goes back to the end of the queue.
            let backlog = balancer.queued_tasks();
            let mut assignments = Vec::new();
            for _ in 0..backlog {
                let Some(task) = balancer.dequeue_task() else {
                    break;
                };
                if let Some(assignment) = balancer.assign(task) {
                    assignments.push(assignment);
                }
            }
            (expired, assignments, balancer.queued_tasks())
        };
        if expired > 0 {
            debug!(expired, "sticky sessions purged");
        }
        if !assignments.is_empty() {
            debug!(retried = assignments.len(), "queued tasks re-assigned");
        }
        for assignment in assignments {
            self.events.emit(SwarmEvent::TaskAssigned {
                task_id: assignment.task_id,
                agent_id: assignment.agent_id,
            });
        }
        self.pool.check_auto_scaling(queue_depth).await;
    }

    pub async fn shutdown(&self) {
        self.initialized.store(false, Ordering::Release);
        self.pool.shutdown().await;
        info!("swarm coordinator shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{AgentGatewayError, AgentVerdict, FactoryError, HealthCheckResult,
        SpawnRequest};
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use warden_domain::{AuthzDecision, ManualClock, PoolConfig};

    struct StubFactory;

    #[async_trait]
    impl AgentFactory for StubFactory {
        async fn create(&self, request: SpawnRequest) -> Result<Agent, FactoryError> {
            Ok(Agent::new(request.id, request.agent_type, 0))
        }

        async fn destroy(&self, _agent_id: &AgentId) -> Result<(), FactoryError> {
            Ok(())
        }

        async fn health_check(
            &self,
            agent_id: &AgentId,
        ) -> Result<HealthCheckResult, FactoryError> {
            Ok(HealthCheckResult {
                agent_id: agent_id.clone(),
                healthy: true,
                latency_ms: 1,
                checked_at: 0,
                error: None,
            })
        }
    }

    #[derive(Default)]
    struct ScriptedGateway {
        /// Types that deny; everything else allows at 0.9
        denying: StdMutex<Vec<AgentType>>,
        evaluated: StdMutex<Vec<AgentId>>,
    }

    impl ScriptedGateway {
        fn deny_for(&self, agent_type: AgentType) {
            self.denying.lock().unwrap().push(agent_type);
        }

        fn evaluated(&self) -> Vec<AgentId> {
            self.evaluated.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AgentGateway for ScriptedGateway {
        async fn evaluate(
            &self,
            agent: &Agent,
            _request: &AuthzRequest,
        ) -> Result<AgentVerdict, AgentGatewayError> {
            self.evaluated.lock().unwrap().push(agent.id.clone());
            if self.denying.lock().unwrap().contains(&agent.agent_type) {
                Ok(AgentVerdict::deny(0.95))
            } else {
                Ok(AgentVerdict::allow(0.9))
            }
        }
    }

    fn swarm_config() -> SwarmConfig {
        SwarmConfig {
            pool: PoolConfig {
                min_agents: 1,
                max_agents: 20,
                scaling: None,
                ..PoolConfig::default()
            },
            ..SwarmConfig::default()
        }
    }

    async fn coordinator_with(
        gateway: Arc<ScriptedGateway>,
    ) -> SwarmCoordinator {
        let coordinator = SwarmCoordinator::new(
            swarm_config(),
            Arc::new(StubFactory),
            gateway,
            Arc::new(ManualClock::new(1_000)),
        )
        .unwrap();
        coordinator.initialize().await.unwrap();
        coordinator
    }

    fn standard_cohort() -> HashMap<AgentType, usize> {
        HashMap::from([
            (AgentType::Guardian, 2usize),
            (AgentType::Analyst, 2usize),
            (AgentType::Enforcer, 1usize),
        ])
    }

    #[tokio::test]
    async fn test_operations_require_initialize() {
        let coordinator = SwarmCoordinator::new(
            swarm_config(),
            Arc::new(StubFactory),
            Arc::new(ScriptedGateway::default()),
            Arc::new(ManualClock::new(0)),
        )
        .unwrap();

        let request = AuthzRequest::new("r-1", "alice", "read", "doc-1");
        let err = coordinator.coordinate_authz_pipeline(request).await.unwrap_err();
        assert!(matches!(err, SwarmError::NotInitialized));
        assert!(matches!(
            coordinator.complete_task(&TaskId::new("t-1"), true, 1).await,
            Err(SwarmError::NotInitialized)
        ));
        assert!(matches!(
            coordinator.set_balancer_strategy("weighted").await,
            Err(SwarmError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_pipeline_all_stages_allow() {
        let gateway = Arc::new(ScriptedGateway::default());
        let coordinator = coordinator_with(gateway.clone()).await;
        coordinator
            .register_authz_agents(&standard_cohort())
            .await
            .unwrap();

        let request = AuthzRequest::new("r-1", "alice", "read", "doc-1");
        let result = coordinator.coordinate_authz_pipeline(request).await.unwrap();

        assert_eq!(result.decision, AuthzDecision::Allow);
        // Guardian, Analyst, Enforcer ran; no Advisor cohort exists
        assert_eq!(result.agent_decisions.len(), 3);
        assert!(result.consensus.is_none());
        assert!(result.confidence > 0.0);
    }

    #[tokio::test]
    async fn test_single_deny_denies_the_request() {
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.deny_for(AgentType::Enforcer);
        let coordinator = coordinator_with(gateway).await;
        coordinator
            .register_authz_agents(&standard_cohort())
            .await
            .unwrap();

        let request = AuthzRequest::new("r-2", "mallory", "delete", "doc-1");
        let result = coordinator.coordinate_authz_pipeline(request).await.unwrap();
        assert_eq!(result.decision, AuthzDecision::Deny);
    }

    #[tokio::test]
    async fn test_consensus_two_of_three_approves() {
        let gateway = Arc::new(ScriptedGateway::default());
        let coordinator = coordinator_with(gateway).await;

        let votes = vec![
            ConsensusVote::approve("agent-1"),
            ConsensusVote::approve("agent-2"),
            ConsensusVote::reject("agent-3"),
        ];
        let result = coordinator.run_distributed_consensus("p-1", &votes);
        assert!(result.reached);
        assert!(result.decision);
        assert_eq!(result.total_votes, 3);
    }

    #[tokio::test]
    async fn test_pipeline_consensus_validation() {
        let gateway = Arc::new(ScriptedGateway::default());
        let coordinator = coordinator_with(gateway).await;
        coordinator
            .register_authz_agents(&standard_cohort())
            .await
            .unwrap();

        let request = AuthzRequest::new("r-3", "alice", "read", "doc-1").with_consensus();
        let result = coordinator.coordinate_authz_pipeline(request).await.unwrap();

        let consensus = result.consensus.unwrap();
        assert!(consensus.reached);
        assert_eq!(result.decision, AuthzDecision::Allow);
    }

    #[tokio::test]
    async fn test_sticky_session_reuses_stage_agent() {
        let gateway = Arc::new(ScriptedGateway::default());
        let coordinator = coordinator_with(gateway).await;
        coordinator
            .register_authz_agents(&HashMap::from([(AgentType::Guardian, 3usize)]))
            .await
            .unwrap();

        let first = coordinator
            .coordinate_authz_pipeline(
                AuthzRequest::new("r-4", "alice", "read", "doc-1").with_session_id("s-1"),
            )
            .await
            .unwrap();
        let second = coordinator
            .coordinate_authz_pipeline(
                AuthzRequest::new("r-5", "alice", "read", "doc-2").with_session_id("s-1"),
            )
            .await
            .unwrap();

        let guardian = |r: &PipelineResult| {
            r.agent_decisions
                .iter()
                .find(|d| d.agent_type == AgentType::Guardian)
                .map(|d| d.agent_id.clone())
                .unwrap()
        };
        assert_eq!(guardian(&first), guardian(&second));
    }

    #[tokio::test]
    async fn test_sticky_user_reuses_stage_agent() {
        let gateway = Arc::new(ScriptedGateway::default());
        let coordinator = coordinator_with(gateway).await;
        coordinator
            .register_authz_agents(&HashMap::from([(AgentType::Guardian, 3usize)]))
            .await
            .unwrap();

        // Different subjects, same user key, no session
        let first = coordinator
            .coordinate_authz_pipeline(
                AuthzRequest::new("r-7", "svc-a", "read", "doc-1").with_user_id("u-1"),
            )
            .await
            .unwrap();
        let second = coordinator
            .coordinate_authz_pipeline(
                AuthzRequest::new("r-8", "svc-b", "read", "doc-2").with_user_id("u-1"),
            )
            .await
            .unwrap();

        let guardian = |r: &PipelineResult| {
            r.agent_decisions
                .iter()
                .find(|d| d.agent_type == AgentType::Guardian)
                .map(|d| d.agent_id.clone())
                .unwrap()
        };
        assert_eq!(guardian(&first), guardian(&second));
    }

    #[tokio::test]
    async fn test_maintenance_retries_queued_tasks() {
        let gateway = Arc::new(ScriptedGateway::default());
        let coordinator = coordinator_with(gateway).await;

        // Empty the fleet so the task has nowhere to go and queues up
        let initial = coordinator.pool().agents().await;
        coordinator.recycle_agent(&initial[0].id).await.unwrap();
        let queued = coordinator
            .assign_task(Task::new("t-queued", "work", 0))
            .await
            .unwrap();
        assert!(queued.is_none());
        assert_eq!(coordinator.queued_tasks().await, 1);

        let agent = coordinator.spawn_agent(AgentType::Guardian).await.unwrap();
        let mut events = coordinator.events().subscribe();
        coordinator.run_maintenance().await;

        assert_eq!(coordinator.queued_tasks().await, 0);
        match events.try_recv().unwrap() {
            SwarmEvent::TaskAssigned { task_id, agent_id } => {
                assert_eq!(task_id, TaskId::new("t-queued"));
                assert_eq!(agent_id, agent.id);
            }
            other => panic!("unexpected event: {}", other.name()),
        }
        assert!(
            coordinator
                .complete_task(&TaskId::new("t-queued"), true, 5)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_live_consensus_round_polls_workable_agents() {
        let gateway = Arc::new(ScriptedGateway::default());
        let coordinator = coordinator_with(gateway.clone()).await;
        coordinator
            .register_authz_agents(&HashMap::from([(AgentType::Analyst, 3usize)]))
            .await
            .unwrap();

        let request = AuthzRequest::new("r-6", "alice", "read", "doc-1");
        let result = coordinator.run_consensus_round("p-2", &request).await.unwrap();

        assert!(result.reached);
        assert!(result.decision);
        // 3 analysts + the 1 default guardian from initialize
        assert_eq!(gateway.evaluated().len(), 4);
    }

    #[tokio::test]
    async fn test_recycle_unwires_agent_everywhere() {
        let gateway = Arc::new(ScriptedGateway::default());
        let coordinator = coordinator_with(gateway).await;
        let agent = coordinator.spawn_agent(AgentType::Guardian).await.unwrap();

        assert!(coordinator.recycle_agent(&agent.id).await.unwrap());
        assert!(coordinator.pool().agent(&agent.id).await.is_none());
        let metrics = coordinator.topology_metrics().await;
        assert_eq!(metrics.active_agents, 1);
    }

    #[tokio::test]
    async fn test_strategy_swap_at_runtime() {
        let gateway = Arc::new(ScriptedGateway::default());
        let coordinator = coordinator_with(gateway).await;

        assert_eq!(coordinator.balancer_strategy().await, "round_robin");
        coordinator.set_balancer_strategy("least_connections").await.unwrap();
        assert_eq!(coordinator.balancer_strategy().await, "least_connections");
        assert!(coordinator.set_balancer_strategy("bogus").await.is_err());
    }
}
