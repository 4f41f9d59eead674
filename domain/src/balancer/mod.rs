//! Load balancer
//!
//! Assigns tasks to agents under a pluggable strategy. The balancer holds
//! only a derived view of pool membership, keyed by agent id and updated
//! explicitly by the coordinator. It never observes the pool directly.

pub mod adaptive;
pub mod least_connections;
pub mod round_robin;
pub mod strategy;
pub mod weighted;

pub use adaptive::AdaptiveStrategy;
pub use least_connections::LeastConnectionsStrategy;
pub use round_robin::RoundRobinStrategy;
pub use strategy::{LoadBalancingStrategy, strategy_for};
pub use weighted::WeightedStrategy;

use crate::agent::{Agent, AgentId, AgentType, Assignment, Task, TaskId};
use crate::config::BalancerConfig;
use crate::core::{Clock, SwarmError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Per-agent work counters maintained by the balancer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentLoad {
    pub load: f64,
    pub active_tasks: usize,
    pub queued_tasks: usize,
    pub completed_tasks: u64,
    pub failed_tasks: u64,
    pub avg_processing_time_ms: f64,
    /// Timestamp of the last assignment or completion
    pub last_activity: u64,
}

/// Derived [0, 1] ranking combining load and historical success rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    pub score: f64,
    pub load: f64,
    pub last_updated: u64,
}

/// A sticky-session pin: all tasks sharing the key land on one agent until
/// it becomes overloaded or unhealthy, or the entry expires.
#[derive(Debug, Clone)]
struct StickySession {
    agent_id: AgentId,
    expires_at: u64,
}

/// Task-to-agent assignment facade.
///
/// All mutating operations must be externally serialized (the application
/// layer holds one mutex per balancer); in particular this makes the sticky
/// lookup-then-assign path atomic per session key.
pub struct LoadBalancer {
    config: BalancerConfig,
    clock: Arc<dyn Clock>,
    strategy: Box<dyn LoadBalancingStrategy>,
    agents: HashMap<AgentId, Agent>,
    /// Registration order; candidate lists preserve it
    order: Vec<AgentId>,
    loads: HashMap<AgentId, AgentLoad>,
    assignments: HashMap<TaskId, Assignment>,
    sticky: HashMap<String, StickySession>,
    queue: VecDeque<Task>,
}

impl LoadBalancer {
    pub fn new(config: BalancerConfig, clock: Arc<dyn Clock>) -> Result<Self, SwarmError> {
        config.validate()?;
        let strategy = strategy_for(&config.strategy, &config)?;
        Ok(Self {
            config,
            clock,
            strategy,
            agents: HashMap::new(),
            order: Vec::new(),
            loads: HashMap::new(),
            assignments: HashMap::new(),
            sticky: HashMap::new(),
            queue: VecDeque::new(),
        })
    }

    /// Seed the derived view from current pool membership
    pub fn initialize(&mut self, agents: &[Agent]) {
        self.agents.clear();
        self.order.clear();
        self.loads.clear();
        for agent in agents {
            self.add_agent(agent);
        }
    }

    pub fn add_agent(&mut self, agent: &Agent) {
        if !self.agents.contains_key(&agent.id) {
            self.order.push(agent.id.clone());
        }
        self.loads.entry(agent.id.clone()).or_default().load = agent.load;
        self.agents.insert(agent.id.clone(), agent.clone());
    }

    pub fn remove_agent(&mut self, agent_id: &AgentId) {
        self.agents.remove(agent_id);
        self.order.retain(|id| id != agent_id);
        self.loads.remove(agent_id);
        self.sticky.retain(|_, s| &s.agent_id != agent_id);
        self.strategy.forget_agent(agent_id);
    }

    /// Refresh an agent's derived view (status, load)
    pub fn sync_agent(&mut self, agent: &Agent) {
        if self.agents.contains_key(&agent.id) {
            if let Some(load) = self.loads.get_mut(&agent.id) {
                load.load = agent.load;
            }
            self.agents.insert(agent.id.clone(), agent.clone());
        }
    }

    /// Assign a task through the active strategy.
    ///
    /// Agents at or above the overload threshold never qualify. When no
    /// candidate qualifies the task is queued (up to `max_queue_size`) and
    /// `None` is returned.
    pub fn assign(&mut self, task: Task) -> Option<Assignment> {
        let owned = self.candidate_views(&task, None);
        let refs: Vec<&Agent> = owned.iter().collect();
        match self.strategy.select_agent(&refs, &task) {
            Some(agent_id) => Some(self.commit_assignment(agent_id, &task)),
            None => {
                self.enqueue(task);
                None
            }
        }
    }

    /// Route an authorization task to an agent of one specific type,
    /// honoring sticky sessions.
    ///
    /// Sticky precedence is session > user > resource. A pinned agent that
    /// has become overloaded or unhealthy is bypassed and the pin is moved
    /// to the newly selected agent.
    pub fn route_authz_request(
        &mut self,
        task: Task,
        agent_type: &AgentType,
    ) -> Option<Assignment> {
        let now = self.clock.now_millis();
        let key = task.metadata.sticky_key();

        if let Some(k) = &key {
            if let Some(pinned) = self.sticky.get(k).filter(|s| s.expires_at > now) {
                let pinned_id = pinned.agent_id.clone();
                let usable = self.agents.get(&pinned_id).is_some_and(|a| {
                    a.agent_type == *agent_type
                        && a.status.is_workable()
                        && a.load < self.config.overload_threshold
                });
                if usable {
                    self.pin_session(k.clone(), pinned_id.clone());
                    return Some(self.commit_assignment(pinned_id, &task));
                }
            }
        }

        let owned = self.candidate_views(&task, Some(agent_type));
        let refs: Vec<&Agent> = owned.iter().collect();
        let selected = self.strategy.select_agent(&refs, &task)?;
        if let Some(k) = key {
            self.pin_session(k, selected.clone());
        }
        Some(self.commit_assignment(selected, &task))
    }

    /// Record a task completion: updates counters, the rolling latency
    /// average and the strategy's completion hook. Returns false for an
    /// unknown task.
    pub fn complete_task(&mut self, task_id: &TaskId, success: bool, duration_ms: u64) -> bool {
        let Some(assignment) = self.assignments.remove(task_id) else {
            return false;
        };
        let now = self.clock.now_millis();
        let agent_id = assignment.agent_id;

        if let Some(load) = self.loads.get_mut(&agent_id) {
            load.active_tasks = load.active_tasks.saturating_sub(1);
            if success {
                load.completed_tasks += 1;
            } else {
                load.failed_tasks += 1;
            }
            let samples = (load.completed_tasks + load.failed_tasks) as f64;
            load.avg_processing_time_ms =
                (load.avg_processing_time_ms * (samples - 1.0) + duration_ms as f64) / samples;
            load.last_activity = now;

            if load.active_tasks == 0 {
                if let Some(agent) = self.agents.get_mut(&agent_id) {
                    if agent.status == crate::agent::AgentStatus::Busy {
                        agent.status = crate::agent::AgentStatus::Idle;
                    }
                }
            }
        }

        self.strategy.record_completion(&agent_id, success, duration_ms);
        true
    }

    /// Swap the active strategy atomically
    pub fn set_strategy(&mut self, name: &str) -> Result<(), SwarmError> {
        self.strategy = strategy_for(name, &self.config)?;
        Ok(())
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Override a per-agent weight on the active strategy
    pub fn set_agent_weight(&mut self, agent_id: &AgentId, weight: f64) {
        self.strategy.set_weight(agent_id, weight);
    }

    /// Health score combining (1 − load) with the completion success ratio
    pub fn agent_health_score(&self, agent_id: &AgentId) -> Option<HealthScore> {
        let agent = self.agents.get(agent_id)?;
        let load = self.loads.get(agent_id)?;
        let samples = load.completed_tasks + load.failed_tasks;
        let success_ratio = if samples == 0 {
            1.0
        } else {
            load.completed_tasks as f64 / samples as f64
        };
        let score = ((1.0 - agent.load) * 0.5 + success_ratio * 0.5).clamp(0.0, 1.0);
        Some(HealthScore {
            score,
            load: agent.load,
            last_updated: self.clock.now_millis(),
        })
    }

    /// Non-overloaded agents grouped by type, each group sorted by
    /// ascending load
    pub fn agents_by_type_for_authz(&self) -> HashMap<AgentType, Vec<Agent>> {
        let mut groups: HashMap<AgentType, Vec<Agent>> = HashMap::new();
        for id in &self.order {
            let Some(agent) = self.agents.get(id) else {
                continue;
            };
            if agent.status.is_workable() && agent.load < self.config.overload_threshold {
                groups
                    .entry(agent.agent_type.clone())
                    .or_default()
                    .push(agent.clone());
            }
        }
        for group in groups.values_mut() {
            group.sort_by(|a, b| a.load.partial_cmp(&b.load).unwrap_or(std::cmp::Ordering::Equal));
        }
        groups
    }

    /// Purge expired sticky entries; returns how many were removed
    pub fn cleanup_expired_sessions(&mut self) -> usize {
        let now = self.clock.now_millis();
        let before = self.sticky.len();
        self.sticky.retain(|_, s| s.expires_at > now);
        before - self.sticky.len()
    }

    /// Ask the active strategy which agents to shed on scale-down
    pub fn removal_candidates(&self, count: usize) -> Vec<AgentId> {
        let owned: Vec<Agent> = self
            .order
            .iter()
            .filter_map(|id| self.agents.get(id))
            .cloned()
            .collect();
        let refs: Vec<&Agent> = owned.iter().collect();
        self.strategy.select_for_removal(&refs, count, &self.loads)
    }

    pub fn agent_load(&self, agent_id: &AgentId) -> Option<&AgentLoad> {
        self.loads.get(agent_id)
    }

    pub fn assignment_for(&self, task_id: &TaskId) -> Option<&Assignment> {
        self.assignments.get(task_id)
    }

    pub fn queued_tasks(&self) -> usize {
        self.queue.len()
    }

    /// Pop the oldest queued task for a retry
    pub fn dequeue_task(&mut self) -> Option<Task> {
        self.queue.pop_front()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    fn enqueue(&mut self, task: Task) {
        if self.config.max_queue_size > 0 && self.queue.len() < self.config.max_queue_size {
            self.queue.push_back(task);
        }
    }

    fn pin_session(&mut self, key: String, agent_id: AgentId) {
        let expires_at = self.clock.now_millis() + self.config.sticky_session_ttl_ms;
        self.sticky.insert(key, StickySession { agent_id, expires_at });
    }

    fn commit_assignment(&mut self, agent_id: AgentId, task: &Task) -> Assignment {
        let now = self.clock.now_millis();
        let assignment = Assignment {
            task_id: task.id.clone(),
            agent_id: agent_id.clone(),
            assigned_at: now,
        };
        self.assignments.insert(task.id.clone(), assignment.clone());

        let load = self.loads.entry(agent_id.clone()).or_default();
        load.active_tasks += 1;
        load.last_activity = now;
        if let Some(agent) = self.agents.get_mut(&agent_id) {
            agent.status = crate::agent::AgentStatus::Busy;
            load.load = agent.load;
        }
        assignment
    }

    /// Candidates in registration order: workable, under the overload
    /// threshold, satisfying the task's capabilities, optionally restricted
    /// to one agent type.
    fn candidate_views(&self, task: &Task, agent_type: Option<&AgentType>) -> Vec<Agent> {
        self.order
            .iter()
            .filter_map(|id| self.agents.get(id))
            .filter(|a| a.status.is_workable())
            .filter(|a| a.load < self.config.overload_threshold)
            .filter(|a| a.satisfies(task))
            .filter(|a| agent_type.is_none_or(|t| &a.agent_type == t))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;

    fn balancer(strategy: &str, clock: Arc<ManualClock>) -> LoadBalancer {
        let config = BalancerConfig {
            strategy: strategy.to_string(),
            ..BalancerConfig::default()
        };
        LoadBalancer::new(config, clock).unwrap()
    }

    fn agent(id: &str, agent_type: AgentType, load: f64) -> Agent {
        let mut agent = Agent::new(id, agent_type, 0);
        agent.load = load;
        agent
    }

    #[test]
    fn test_overloaded_agents_never_assigned() {
        let clock = Arc::new(ManualClock::new(0));
        let mut lb = balancer("round_robin", clock);
        lb.initialize(&[
            agent("a", AgentType::Guardian, 0.95),
            agent("b", AgentType::Guardian, 0.5),
            agent("c", AgentType::Guardian, 0.92),
        ]);

        for i in 0..5 {
            let task = Task::new(format!("t-{i}"), "work", 0);
            let assignment = lb.assign(task).unwrap();
            assert_eq!(assignment.agent_id, AgentId::new("b"));
            lb.complete_task(&TaskId::new(format!("t-{i}")), true, 1);
        }
    }

    #[test]
    fn test_no_candidates_queues_up_to_bound() {
        let clock = Arc::new(ManualClock::new(0));
        let config = BalancerConfig {
            max_queue_size: 2,
            ..BalancerConfig::default()
        };
        let mut lb = LoadBalancer::new(config, clock).unwrap();
        lb.initialize(&[agent("a", AgentType::Guardian, 0.99)]);

        assert!(lb.assign(Task::new("t-1", "work", 0)).is_none());
        assert!(lb.assign(Task::new("t-2", "work", 0)).is_none());
        assert!(lb.assign(Task::new("t-3", "work", 0)).is_none());
        assert_eq!(lb.queued_tasks(), 2);
        assert_eq!(lb.dequeue_task().unwrap().id, TaskId::new("t-1"));
    }

    #[test]
    fn test_sticky_session_pins_agent() {
        let clock = Arc::new(ManualClock::new(0));
        let mut lb = balancer("round_robin", clock);
        lb.initialize(&[
            agent("a", AgentType::Guardian, 0.1),
            agent("b", AgentType::Guardian, 0.1),
        ]);

        let t1 = Task::new("t-1", "authz", 0).with_session_id("sess-1");
        let t2 = Task::new("t-2", "authz", 0).with_session_id("sess-1");
        let first = lb.route_authz_request(t1, &AgentType::Guardian).unwrap();
        let second = lb.route_authz_request(t2, &AgentType::Guardian).unwrap();
        assert_eq!(first.agent_id, second.agent_id);
    }

    #[test]
    fn test_sticky_rerouted_when_pinned_agent_overloads() {
        let clock = Arc::new(ManualClock::new(0));
        let mut lb = balancer("round_robin", clock);
        let mut a = agent("a", AgentType::Guardian, 0.1);
        let b = agent("b", AgentType::Guardian, 0.1);
        lb.initialize(&[a.clone(), b.clone()]);

        let t1 = Task::new("t-1", "authz", 0).with_session_id("sess-1");
        let first = lb.route_authz_request(t1, &AgentType::Guardian).unwrap();
        assert_eq!(first.agent_id, AgentId::new("a"));

        // Pinned agent overloads; the session moves
        a.load = 0.95;
        lb.sync_agent(&a);
        let t2 = Task::new("t-2", "authz", 0).with_session_id("sess-1");
        let second = lb.route_authz_request(t2, &AgentType::Guardian).unwrap();
        assert_eq!(second.agent_id, AgentId::new("b"));

        // And stays moved
        let t3 = Task::new("t-3", "authz", 0).with_session_id("sess-1");
        let third = lb.route_authz_request(t3, &AgentType::Guardian).unwrap();
        assert_eq!(third.agent_id, AgentId::new("b"));
    }

    #[test]
    fn test_sticky_sessions_expire() {
        let clock = Arc::new(ManualClock::new(0));
        let config = BalancerConfig {
            sticky_session_ttl_ms: 1_000,
            ..BalancerConfig::default()
        };
        let mut lb = LoadBalancer::new(config, clock.clone()).unwrap();
        lb.initialize(&[agent("a", AgentType::Guardian, 0.1)]);

        let t1 = Task::new("t-1", "authz", 0).with_session_id("sess-1");
        lb.route_authz_request(t1, &AgentType::Guardian).unwrap();

        clock.advance(2_000);
        assert_eq!(lb.cleanup_expired_sessions(), 1);
    }

    #[test]
    fn test_health_score_blends_load_and_success() {
        let clock = Arc::new(ManualClock::new(0));
        let mut lb = balancer("round_robin", clock);
        lb.initialize(&[agent("a", AgentType::Guardian, 0.4)]);

        // 3 successes, 1 failure
        for (i, success) in [true, true, true, false].iter().enumerate() {
            let task = Task::new(format!("t-{i}"), "work", 0);
            lb.assign(task).unwrap();
            lb.complete_task(&TaskId::new(format!("t-{i}")), *success, 10);
        }

        let score = lb.agent_health_score(&AgentId::new("a")).unwrap();
        // (1 - 0.4) * 0.5 + 0.75 * 0.5 = 0.675
        assert!((score.score - 0.675).abs() < 1e-9);
        assert_eq!(score.load, 0.4);
    }

    #[test]
    fn test_groups_by_type_sorted_by_load() {
        let clock = Arc::new(ManualClock::new(0));
        let mut lb = balancer("round_robin", clock);
        lb.initialize(&[
            agent("g1", AgentType::Guardian, 0.7),
            agent("g2", AgentType::Guardian, 0.2),
            agent("e1", AgentType::Enforcer, 0.95), // overloaded, excluded
            agent("e2", AgentType::Enforcer, 0.3),
        ]);

        let groups = lb.agents_by_type_for_authz();
        let guardians: Vec<&str> = groups[&AgentType::Guardian]
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(guardians, vec!["g2", "g1"]);
        assert_eq!(groups[&AgentType::Enforcer].len(), 1);
    }

    #[test]
    fn test_set_strategy_swaps_and_rejects_unknown() {
        let clock = Arc::new(ManualClock::new(0));
        let mut lb = balancer("round_robin", clock);
        assert_eq!(lb.strategy_name(), "round_robin");

        lb.set_strategy("adaptive").unwrap();
        assert_eq!(lb.strategy_name(), "adaptive");

        assert!(lb.set_strategy("bogus").is_err());
        assert_eq!(lb.strategy_name(), "adaptive");
    }

    #[test]
    fn test_capability_filter() {
        let clock = Arc::new(ManualClock::new(0));
        let mut lb = balancer("round_robin", clock);
        lb.initialize(&[
            agent("plain", AgentType::Analyst, 0.1),
            agent("skilled", AgentType::Analyst, 0.8)
                .with_capabilities(["risk-scoring"]),
        ]);

        let task = Task::new("t-1", "risk", 0).with_capability("risk-scoring");
        let assignment = lb.assign(task).unwrap();
        assert_eq!(assignment.agent_id, AgentId::new("skilled"));
    }

    #[test]
    fn test_remove_agent_clears_sticky_pins() {
        let clock = Arc::new(ManualClock::new(0));
        let mut lb = balancer("round_robin", clock);
        lb.initialize(&[
            agent("a", AgentType::Guardian, 0.1),
            agent("b", AgentType::Guardian, 0.1),
        ]);

        let t1 = Task::new("t-1", "authz", 0).with_session_id("sess-1");
        let first = lb.route_authz_request(t1, &AgentType::Guardian).unwrap();
        lb.remove_agent(&first.agent_id);

        let t2 = Task::new("t-2", "authz", 0).with_session_id("sess-1");
        let second = lb.route_authz_request(t2, &AgentType::Guardian).unwrap();
        assert_ne!(second.agent_id, first.agent_id);
    }
}
