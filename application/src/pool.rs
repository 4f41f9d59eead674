//! Agent pool
//!
//! Owns the live agent fleet: provisioning through the [`AgentFactory`]
//! port, periodic health probing, and auto-scaling between configured
//! bounds. All factory calls happen outside the pool lock; a spawn first
//! reserves a slot under the lock so concurrent spawns can never exceed
//! `max_agents`.

use crate::events::EventBus;
use crate::ports::{AgentFactory, SpawnRequest};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use warden_domain::{
    Agent, AgentId, AgentStatus, AgentType, Clock, PoolConfig, ScalingRule, SwarmError, SwarmEvent,
};

/// Counters exposed for observability
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolMetrics {
    pub agents: usize,
    pub available: usize,
    pub total_spawned: u64,
    pub total_recycled: u64,
    pub health_checks: u64,
    pub failed_health_checks: u64,
    pub avg_load: f64,
}

/// Current/maximum instance counts for one agent type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeCapacity {
    pub current: usize,
    pub max: usize,
}

/// Healthy/total breakdown for one agent type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeHealth {
    pub healthy: usize,
    pub total: usize,
}

#[derive(Default)]
struct PoolState {
    agents: HashMap<AgentId, Agent>,
    /// Timestamp of the last assignment or completion per agent
    last_activity: HashMap<AgentId, u64>,
    /// Slots claimed by in-flight spawns, counted against `max_agents`
    reserved: usize,
    scaling_rules: HashMap<AgentType, ScalingRule>,
    last_scale_at: u64,
    total_spawned: u64,
    total_recycled: u64,
    health_checks: u64,
    failed_health_checks: u64,
}

pub struct AgentPool {
    config: PoolConfig,
    factory: Arc<dyn AgentFactory>,
    clock: Arc<dyn Clock>,
    events: EventBus,
    state: Mutex<PoolState>,
    id_seq: AtomicU64,
    /// Serializes scale decisions so up/down never interleave
    scaling: AtomicBool,
    cancel: CancellationToken,
}

impl AgentPool {
    pub fn new(
        config: PoolConfig,
        factory: Arc<dyn AgentFactory>,
        clock: Arc<dyn Clock>,
        events: EventBus,
    ) -> Result<Self, SwarmError> {
        config.validate()?;
        let mut state = PoolState::default();
        // Per-type scaling starts from the default rule; callers override
        // with set_scaling_rule.
        state
            .scaling_rules
            .insert(config.default_agent_type.clone(), ScalingRule::default());
        Ok(Self {
            config,
            factory,
            clock,
            events,
            state: Mutex::new(state),
            id_seq: AtomicU64::new(1),
            scaling: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Spawn the minimum fleet and start the background health loop
    pub async fn initialize(self: &Arc<Self>) -> Result<(), SwarmError> {
        let spawned = self
            .spawn_multiple(self.config.default_agent_type.clone(), self.config.min_agents)
            .await;
        if spawned.len() < self.config.min_agents {
            warn!(
                spawned = spawned.len(),
                wanted = self.config.min_agents,
                "pool initialized below minimum"
            );
        }
        self.spawn_health_loop();
        info!(agents = spawned.len(), "agent pool initialized");
        Ok(())
    }

    fn spawn_health_loop(self: &Arc<Self>) {
        let pool = Arc::clone(self);
        let interval = Duration::from_millis(self.config.health_check_interval_ms.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = pool.cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        pool.check_health_now().await;
                        pool.check_auto_scaling(0).await;
                    }
                }
            }
            debug!("health loop stopped");
        });
    }

    fn next_agent_id(&self) -> AgentId {
        let n = self.id_seq.fetch_add(1, Ordering::Relaxed);
        AgentId::new(format!("agent-{n}"))
    }

    /// Spawn one agent of the given type.
    ///
    /// Fails with a capacity error when the pool (including in-flight
    /// spawns) is already at `max_agents`.
    pub async fn spawn_agent(&self, agent_type: AgentType) -> Result<Agent, SwarmError> {
        let id = {
            let mut state = self.state.lock().await;
            let occupied = state.agents.len() + state.reserved;
            if occupied >= self.config.max_agents {
                return Err(SwarmError::Capacity {
                    current: occupied,
                    max: self.config.max_agents,
                });
            }
            state.reserved += 1;
            self.next_agent_id()
        };

        let request = SpawnRequest::new(id.clone(), agent_type.clone())
            .with_capabilities(self.config.default_capabilities.iter().cloned());
        let created = self.factory.create(request).await;

        let mut state = self.state.lock().await;
        state.reserved -= 1;
        match created {
            Ok(agent) => {
                let now = self.clock.now_millis();
                state.last_activity.insert(agent.id.clone(), now);
                state.agents.insert(agent.id.clone(), agent.clone());
                state.total_spawned += 1;
                drop(state);
                self.events.emit(SwarmEvent::AgentSpawned {
                    agent_id: agent.id.clone(),
                    agent_type: agent.agent_type.clone(),
                });
                Ok(agent)
            }
            Err(err) => {
                warn!(%id, error = %err, "agent spawn failed");
                Err(SwarmError::Spawn(err.to_string()))
            }
        }
    }

    /// Best-effort batch spawn; returns the agents that were created
    pub async fn spawn_multiple(&self, agent_type: AgentType, count: usize) -> Vec<Agent> {
        let mut spawned = Vec::with_capacity(count);
        for _ in 0..count {
            match self.spawn_agent(agent_type.clone()).await {
                Ok(agent) => spawned.push(agent),
                Err(err) => {
                    warn!(error = %err, "batch spawn stopped early");
                    break;
                }
            }
        }
        spawned
    }

    /// Best-effort spawn of a typed cohort, e.g. `{Guardian: 3, Analyst: 2}`
    pub async fn spawn_by_type_distribution(
        &self,
        distribution: &HashMap<AgentType, usize>,
    ) -> Vec<Agent> {
        let mut spawned = Vec::new();
        for (agent_type, count) in distribution {
            spawned.extend(self.spawn_multiple(agent_type.clone(), *count).await);
        }
        spawned
    }

    /// Remove an agent and tear it down through the factory.
    ///
    /// Returns false when the agent is unknown. A destroy failure is
    /// logged, not propagated; the agent is already out of the fleet.
    pub async fn recycle_agent(&self, agent_id: &AgentId) -> bool {
        let removed = {
            let mut state = self.state.lock().await;
            state.last_activity.remove(agent_id);
            state.agents.remove(agent_id)
        };
        let Some(agent) = removed else {
            return false;
        };

        if let Err(err) = self.factory.destroy(agent_id).await {
            warn!(%agent_id, error = %err, "destroy failed during recycle");
        }
        let mut state = self.state.lock().await;
        state.total_recycled += 1;
        drop(state);
        self.events.emit(SwarmEvent::AgentRecycled {
            agent_id: agent.id,
            agent_type: agent.agent_type,
        });
        true
    }

    /// Mark an agent as draining; it finishes current work but receives
    /// no new assignments
    pub async fn drain_agent(&self, agent_id: &AgentId) -> bool {
        let mut state = self.state.lock().await;
        match state.agents.get_mut(agent_id) {
            Some(agent) => {
                agent.status = AgentStatus::Draining;
                true
            }
            None => false,
        }
    }

    /// Recycle a batch of agents; returns how many were actually removed
    pub async fn drain(&self, agent_ids: &[AgentId]) -> usize {
        let mut removed = 0;
        for agent_id in agent_ids {
            self.drain_agent(agent_id).await;
            if self.recycle_agent(agent_id).await {
                removed += 1;
            }
        }
        removed
    }

    /// Scale the fleet to `target` agents, clamped to configured bounds.
    ///
    /// Scale-down victims are the least recently active agents.
    pub async fn scale_to(&self, target: usize) -> Result<usize, SwarmError> {
        if self
            .scaling
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Ok(self.size().await);
        }
        let result = self.scale_to_inner(target).await;
        self.scaling.store(false, Ordering::Release);
        result
    }

    async fn scale_to_inner(&self, target: usize) -> Result<usize, SwarmError> {
        let target = target.clamp(self.config.min_agents, self.config.max_agents);
        let current = self.size().await;

        if target > current {
            let spawned = self
                .spawn_multiple(self.config.default_agent_type.clone(), target - current)
                .await;
            self.note_scale(current, current + spawned.len(), "manual scale-up")
                .await;
        } else if target < current {
            let victims = self.removal_victims(current - target).await;
            for victim in &victims {
                self.recycle_agent(victim).await;
            }
            self.note_scale(current, current - victims.len(), "manual scale-down")
                .await;
        }
        Ok(self.size().await)
    }

    async fn note_scale(&self, from: usize, to: usize, reason: &str) {
        if from == to {
            return;
        }
        {
            let mut state = self.state.lock().await;
            state.last_scale_at = self.clock.now_millis();
        }
        let event = if to > from {
            SwarmEvent::ScaleUp {
                from,
                to,
                reason: reason.to_string(),
            }
        } else {
            SwarmEvent::ScaleDown {
                from,
                to,
                reason: reason.to_string(),
            }
        };
        self.events.emit(event);
    }

    /// Least recently active workable agents, oldest first
    async fn removal_victims(&self, count: usize) -> Vec<AgentId> {
        let state = self.state.lock().await;
        let mut candidates: Vec<(AgentId, u64)> = state
            .agents
            .values()
            .filter(|a| !a.status.is_terminal())
            .map(|a| {
                let activity = state.last_activity.get(&a.id).copied().unwrap_or(0);
                (a.id.clone(), activity)
            })
            .collect();
        candidates.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        candidates.into_iter().take(count).map(|(id, _)| id).collect()
    }

    /// Evaluate pool-wide and per-type scaling triggers.
    ///
    /// `queue_depth` is the caller-observed backlog of unassigned tasks.
    /// One scale action per cooldown window.
    pub async fn check_auto_scaling(&self, queue_depth: usize) {
        let Some(policy) = self.config.scaling.clone() else {
            return;
        };
        if self
            .scaling
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        let now = self.clock.now_millis();
        let plan = {
            let state = self.state.lock().await;
            if now.saturating_sub(state.last_scale_at) < policy.cooldown_ms {
                None
            } else {
                Some(self.plan_scaling(&state, &policy, queue_depth))
            }
        };

        if let Some(plan) = plan {
            self.apply_scaling_plan(plan).await;
        }
        self.scaling.store(false, Ordering::Release);
    }

    fn plan_scaling(
        &self,
        state: &PoolState,
        policy: &warden_domain::ScalingPolicy,
        queue_depth: usize,
    ) -> ScalingPlan {
        let mut plan = ScalingPlan::default();
        let workable: Vec<&Agent> = state
            .agents
            .values()
            .filter(|a| a.status.is_workable())
            .collect();
        let size = state.agents.len();

        if !workable.is_empty() {
            let avg = workable.iter().map(|a| a.load).sum::<f64>() / workable.len() as f64;
            if avg > policy.scale_up_threshold && size < self.config.max_agents {
                let headroom = self.config.max_agents - size;
                plan.spawn.extend(
                    std::iter::repeat(self.config.default_agent_type.clone())
                        .take(policy.max_scale_up.min(headroom)),
                );
                plan.reason = format!("avg load {avg:.2} above threshold");
            } else if avg < policy.scale_down_threshold && size > self.config.min_agents {
                plan.recycle = policy.max_scale_down.min(size - self.config.min_agents);
                plan.reason = format!("avg load {avg:.2} below threshold");
            }
        }

        // Explicit rules plus the default rule for every type resident in
        // the pool. A type the pool-wide plan already covers this cycle is
        // skipped so one pressure signal cannot double-spawn.
        let default_rule = ScalingRule::default();
        let mut rules: Vec<(&AgentType, &ScalingRule)> = state.scaling_rules.iter().collect();
        for agent in state.agents.values() {
            if !rules.iter().any(|(t, _)| *t == &agent.agent_type) {
                rules.push((&agent.agent_type, &default_rule));
            }
        }
        for (agent_type, rule) in rules {
            if plan.spawn.contains(agent_type) {
                continue;
            }
            let of_type: Vec<&&Agent> = workable
                .iter()
                .filter(|a| &a.agent_type == agent_type)
                .collect();
            let count = state
                .agents
                .values()
                .filter(|a| &a.agent_type == agent_type)
                .count();
            let avg = if of_type.is_empty() {
                0.0
            } else {
                of_type.iter().map(|a| a.load).sum::<f64>() / of_type.len() as f64
            };
            let pressured =
                avg > rule.scale_up_load_threshold || queue_depth >= rule.scale_up_queue_depth;
            if (count < rule.min_instances || pressured) && count < rule.max_instances {
                plan.spawn.push(agent_type.clone());
                if plan.reason.is_empty() {
                    plan.reason = format!("{agent_type} under pressure");
                }
            }
        }
        plan
    }

    async fn apply_scaling_plan(&self, plan: ScalingPlan) {
        if plan.spawn.is_empty() && plan.recycle == 0 {
            return;
        }
        let from = self.size().await;
        for agent_type in plan.spawn {
            if self.spawn_agent(agent_type).await.is_err() {
                break;
            }
        }
        if plan.recycle > 0 {
            for victim in self.removal_victims(plan.recycle).await {
                self.recycle_agent(&victim).await;
            }
        }
        let to = self.size().await;
        self.note_scale(from, to, &plan.reason).await;
    }

    pub async fn set_scaling_rule(&self, agent_type: AgentType, rule: ScalingRule) {
        let mut state = self.state.lock().await;
        state.scaling_rules.insert(agent_type, rule);
    }

    /// Probe every agent concurrently, bounded by the configured timeout.
    ///
    /// An agent goes unhealthy on a failed probe, a late probe, or a stale
    /// heartbeat; an unhealthy agent recovers only when a probe succeeds
    /// and its heartbeat is fresh again.
    pub async fn check_health_now(&self) {
        let probes: Vec<AgentId> = {
            let state = self.state.lock().await;
            state
                .agents
                .values()
                .filter(|a| !a.status.is_terminal())
                .map(|a| a.id.clone())
                .collect()
        };
        if probes.is_empty() {
            return;
        }

        let timeout = Duration::from_millis(self.config.health_check_timeout_ms.max(1));
        let mut tasks = JoinSet::new();
        for agent_id in probes {
            let factory = Arc::clone(&self.factory);
            tasks.spawn(async move {
                let outcome = tokio::time::timeout(timeout, factory.health_check(&agent_id)).await;
                (agent_id, outcome)
            });
        }

        let now = self.clock.now_millis();
        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let Ok((agent_id, outcome)) = joined else {
                continue;
            };
            let healthy = matches!(&outcome, Ok(Ok(check)) if check.healthy);
            let latency_ms = match &outcome {
                Ok(Ok(check)) => check.latency_ms,
                _ => timeout.as_millis() as u64,
            };
            results.push((agent_id, healthy, latency_ms));
        }

        let mut events = Vec::with_capacity(results.len());
        {
            let mut state = self.state.lock().await;
            for (agent_id, probe_healthy, latency_ms) in results {
                state.health_checks += 1;
                // The agent borrow must end before the counter below is
                // touched; `healthy` carries the outcome out of the match.
                let healthy = match state.agents.get_mut(&agent_id) {
                    Some(agent) => {
                        let stale =
                            agent.heartbeat_stale(now, self.config.unhealthy_threshold_ms);
                        let healthy = probe_healthy && !stale;
                        match (healthy, agent.status) {
                            (false, AgentStatus::Idle | AgentStatus::Busy) => {
                                debug!(%agent_id, stale, "agent marked unhealthy");
                                agent.status = AgentStatus::Unhealthy;
                            }
                            (true, AgentStatus::Unhealthy) => {
                                debug!(%agent_id, "agent recovered");
                                agent.status = AgentStatus::Idle;
                            }
                            _ => {}
                        }
                        healthy
                    }
                    None => continue,
                };
                if !healthy {
                    state.failed_health_checks += 1;
                }
                events.push(SwarmEvent::AgentHealthCheck {
                    agent_id,
                    healthy,
                    latency_ms,
                });
            }
        }
        for event in events {
            self.events.emit(event);
        }
    }

    pub async fn record_heartbeat(&self, agent_id: &AgentId) -> bool {
        let now = self.clock.now_millis();
        let mut state = self.state.lock().await;
        match state.agents.get_mut(agent_id) {
            Some(agent) => {
                agent.record_heartbeat(now);
                true
            }
            None => false,
        }
    }

    /// Update an agent's reported load and activity timestamp
    pub async fn record_agent_load(&self, agent_id: &AgentId, load: f64, status: AgentStatus) {
        let now = self.clock.now_millis();
        let mut state = self.state.lock().await;
        state.last_activity.insert(agent_id.clone(), now);
        if let Some(agent) = state.agents.get_mut(agent_id) {
            agent.load = load.clamp(0.0, 1.0);
            if !agent.status.is_terminal() && agent.status != AgentStatus::Unhealthy {
                agent.status = status;
            }
        }
    }

    // Queries

    pub async fn agent(&self, agent_id: &AgentId) -> Option<Agent> {
        self.state.lock().await.agents.get(agent_id).cloned()
    }

    pub async fn agents(&self) -> Vec<Agent> {
        let state = self.state.lock().await;
        let mut agents: Vec<Agent> = state.agents.values().cloned().collect();
        agents.sort_by(|a, b| a.id.cmp(&b.id));
        agents
    }

    pub async fn agents_by_type(&self, agent_type: &AgentType) -> Vec<Agent> {
        self.agents()
            .await
            .into_iter()
            .filter(|a| &a.agent_type == agent_type)
            .collect()
    }

    pub async fn agents_by_status(&self, status: &AgentStatus) -> Vec<Agent> {
        self.agents()
            .await
            .into_iter()
            .filter(|a| &a.status == status)
            .collect()
    }

    pub async fn agents_by_capability(&self, capability: &str) -> Vec<Agent> {
        self.agents()
            .await
            .into_iter()
            .filter(|a| a.has_capability(capability))
            .collect()
    }

    /// Workable agents under the configured load ceiling
    pub async fn available_agents(&self) -> Vec<Agent> {
        self.agents()
            .await
            .into_iter()
            .filter(|a| a.is_available(self.config.available_load_ceiling))
            .collect()
    }

    /// Best single agent of a type: workable, idle before busy, then
    /// lowest load
    pub async fn agent_by_type(&self, agent_type: &AgentType) -> Option<Agent> {
        self.agents_by_type(agent_type)
            .await
            .into_iter()
            .filter(|a| a.status.is_workable())
            .min_by(|a, b| {
                let rank = |agent: &Agent| usize::from(agent.status != AgentStatus::Idle);
                rank(a)
                    .cmp(&rank(b))
                    .then_with(|| a.load.total_cmp(&b.load))
            })
    }

    pub async fn healthy_agent_count_by_type(&self) -> HashMap<AgentType, usize> {
        let mut counts = HashMap::new();
        for agent in self.agents().await {
            if agent.status.is_workable() {
                *counts.entry(agent.agent_type).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Current count against the per-type instance ceiling. Types without
    /// an explicit scaling rule fall back to the default rule's bounds.
    pub async fn capacity_by_type(&self) -> HashMap<AgentType, TypeCapacity> {
        let state = self.state.lock().await;
        let mut capacity: HashMap<AgentType, TypeCapacity> = HashMap::new();
        for agent in state.agents.values() {
            capacity.entry(agent.agent_type.clone()).or_default().current += 1;
        }
        for (agent_type, entry) in capacity.iter_mut() {
            entry.max = state
                .scaling_rules
                .get(agent_type)
                .map(|r| r.max_instances)
                .unwrap_or_else(|| ScalingRule::default().max_instances);
        }
        capacity
    }

    pub async fn health_status_by_type(&self) -> HashMap<AgentType, TypeHealth> {
        let mut status = HashMap::new();
        for agent in self.agents().await {
            let entry: &mut TypeHealth = status.entry(agent.agent_type).or_default();
            entry.total += 1;
            if agent.status.is_workable() {
                entry.healthy += 1;
            }
        }
        status
    }

    pub async fn size(&self) -> usize {
        self.state.lock().await.agents.len()
    }

    pub async fn metrics(&self) -> PoolMetrics {
        let ceiling = self.config.available_load_ceiling;
        let state = self.state.lock().await;
        let agents = state.agents.len();
        let avg_load = if agents == 0 {
            0.0
        } else {
            state.agents.values().map(|a| a.load).sum::<f64>() / agents as f64
        };
        PoolMetrics {
            agents,
            available: state
                .agents
                .values()
                .filter(|a| a.is_available(ceiling))
                .count(),
            total_spawned: state.total_spawned,
            total_recycled: state.total_recycled,
            health_checks: state.health_checks,
            failed_health_checks: state.failed_health_checks,
            avg_load,
        }
    }

    /// Recycle every agent and stop the health loop
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let ids: Vec<AgentId> = {
            let state = self.state.lock().await;
            state.agents.keys().cloned().collect()
        };
        for id in ids {
            self.recycle_agent(&id).await;
        }
        info!("agent pool shut down");
    }
}

#[derive(Default)]
struct ScalingPlan {
    spawn: Vec<AgentType>,
    recycle: usize,
    reason: String,
}
