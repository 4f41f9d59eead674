//! Load-balancing strategy contract
//!
//! Strategies are selected through a name-keyed registry and swapped
//! atomically on the facade; implementations are never mutated in place by
//! callers.

use super::AgentLoad;
use crate::agent::{Agent, AgentId, Task};
use crate::config::BalancerConfig;
use crate::core::SwarmError;
use std::collections::HashMap;

/// A pluggable agent-selection policy.
///
/// `candidates` is always pre-filtered by the facade: healthy, workable,
/// capability-matching agents under the overload threshold, in registration
/// order.
pub trait LoadBalancingStrategy: Send + Sync {
    /// Registry name of this strategy
    fn name(&self) -> &'static str;

    /// Pick an agent for the task, or None when no candidate suits
    fn select_agent(&mut self, candidates: &[&Agent], task: &Task) -> Option<AgentId>;

    /// Pick `count` agents to remove on scale-down
    fn select_for_removal(
        &self,
        candidates: &[&Agent],
        count: usize,
        loads: &HashMap<AgentId, AgentLoad>,
    ) -> Vec<AgentId>;

    /// Completion hook; strategies tracking per-agent state update here
    fn record_completion(&mut self, _agent_id: &AgentId, _success: bool, _duration_ms: u64) {}

    /// Override a per-agent weight; only meaningful for weighted strategies
    fn set_weight(&mut self, _agent_id: &AgentId, _weight: f64) {}

    /// Forget any per-agent state for a removed agent
    fn forget_agent(&mut self, _agent_id: &AgentId) {}
}

/// Instantiate a strategy by registry name.
///
/// Accepted names: `round_robin`, `weighted`, `least_connections`,
/// `adaptive` (hyphens are treated as underscores).
pub fn strategy_for(
    name: &str,
    config: &BalancerConfig,
) -> Result<Box<dyn LoadBalancingStrategy>, SwarmError> {
    match name.to_lowercase().replace('-', "_").as_str() {
        "round_robin" => Ok(Box::new(super::round_robin::RoundRobinStrategy::new())),
        "weighted" => Ok(Box::new(super::weighted::WeightedStrategy::new(
            config.weight_decay,
            config.weight_replenish,
        ))),
        "least_connections" => Ok(Box::new(
            super::least_connections::LeastConnectionsStrategy::new(),
        )),
        "adaptive" => Ok(Box::new(super::adaptive::AdaptiveStrategy::new())),
        other => Err(SwarmError::UnknownStrategy(other.to_string())),
    }
}

/// Scale-down default shared by strategies without an opinion of their own:
/// least recently active agents go first.
pub(crate) fn least_recently_active(
    candidates: &[&Agent],
    count: usize,
    loads: &HashMap<AgentId, AgentLoad>,
) -> Vec<AgentId> {
    let mut ids: Vec<&AgentId> = candidates.iter().map(|a| &a.id).collect();
    ids.sort_by_key(|id| loads.get(*id).map(|l| l.last_activity).unwrap_or(0));
    ids.into_iter().take(count).cloned().collect()
}
