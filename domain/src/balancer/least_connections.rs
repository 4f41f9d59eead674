//! Least-connections strategy

use super::AgentLoad;
use super::strategy::LoadBalancingStrategy;
use crate::agent::{Agent, AgentId, Task};
use std::collections::HashMap;

/// Pressure added per tracked active task when comparing candidates
const ACTIVE_TASK_PRESSURE: f64 = 0.1;

/// Selects the agent with the lowest effective load.
///
/// Effective load is the agent's reported load plus a fixed pressure per
/// active task tracked by this strategy. Counters are incremented on
/// selection and decremented on completion.
#[derive(Debug, Default)]
pub struct LeastConnectionsStrategy {
    active: HashMap<AgentId, usize>,
}

impl LeastConnectionsStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    fn effective_load(&self, agent: &Agent) -> f64 {
        let active = self.active.get(&agent.id).copied().unwrap_or(0);
        agent.load + active as f64 * ACTIVE_TASK_PRESSURE
    }

    /// Tracked active-task count; exposed for inspection in tests
    pub fn active_tasks(&self, agent_id: &AgentId) -> usize {
        self.active.get(agent_id).copied().unwrap_or(0)
    }
}

impl LoadBalancingStrategy for LeastConnectionsStrategy {
    fn name(&self) -> &'static str {
        "least_connections"
    }

    fn select_agent(&mut self, candidates: &[&Agent], _task: &Task) -> Option<AgentId> {
        // Ties keep the earliest candidate for determinism
        let mut best: Option<(&AgentId, f64)> = None;
        for agent in candidates {
            let load = self.effective_load(agent);
            match best {
                Some((_, best_load)) if load >= best_load => {}
                _ => best = Some((&agent.id, load)),
            }
        }
        let selected = best.map(|(id, _)| id.clone())?;

        *self.active.entry(selected.clone()).or_insert(0) += 1;
        Some(selected)
    }

    fn select_for_removal(
        &self,
        candidates: &[&Agent],
        count: usize,
        _loads: &HashMap<AgentId, AgentLoad>,
    ) -> Vec<AgentId> {
        // Fewest in-flight tasks go first: least disruptive to drain
        let mut ids: Vec<&AgentId> = candidates.iter().map(|a| &a.id).collect();
        ids.sort_by_key(|id| self.active.get(*id).copied().unwrap_or(0));
        ids.into_iter().take(count).cloned().collect()
    }

    fn record_completion(&mut self, agent_id: &AgentId, _success: bool, _duration_ms: u64) {
        if let Some(active) = self.active.get_mut(agent_id) {
            *active = active.saturating_sub(1);
        }
    }

    fn forget_agent(&mut self, agent_id: &AgentId) {
        self.active.remove(agent_id);
    }
}
