//! Weighted-random strategy

use super::AgentLoad;
use super::strategy::LoadBalancingStrategy;
use crate::agent::{Agent, AgentId, Task};
use rand::Rng;
use std::collections::HashMap;

/// Weighted-random selection with post-selection decay.
///
/// Each agent carries a base weight derived from `metadata.priority`
/// (overridable via [`LoadBalancingStrategy::set_weight`]). Selection is a
/// weighted random draw over effective weights. To spread load, the winner's
/// effective weight is multiplied by `decay` after every selection and
/// replenished by `replenish` × base weight on every recorded completion,
/// capped at the base weight.
#[derive(Debug)]
pub struct WeightedStrategy {
    decay: f64,
    replenish: f64,
    base: HashMap<AgentId, f64>,
    effective: HashMap<AgentId, f64>,
}

impl WeightedStrategy {
    pub fn new(decay: f64, replenish: f64) -> Self {
        Self {
            decay,
            replenish,
            base: HashMap::new(),
            effective: HashMap::new(),
        }
    }

    fn base_weight(&mut self, agent: &Agent) -> f64 {
        *self
            .base
            .entry(agent.id.clone())
            .or_insert_with(|| f64::from(agent.metadata.priority.max(1)))
    }

    /// Current effective weight; exposed for inspection in tests
    pub fn effective_weight(&self, agent_id: &AgentId) -> Option<f64> {
        self.effective.get(agent_id).copied()
    }
}

impl LoadBalancingStrategy for WeightedStrategy {
    fn name(&self) -> &'static str {
        "weighted"
    }

    fn select_agent(&mut self, candidates: &[&Agent], _task: &Task) -> Option<AgentId> {
        if candidates.is_empty() {
            return None;
        }

        let weights: Vec<(AgentId, f64)> = candidates
            .iter()
            .map(|agent| {
                let base = self.base_weight(agent);
                let effective = *self.effective.entry(agent.id.clone()).or_insert(base);
                (agent.id.clone(), effective.max(f64::EPSILON))
            })
            .collect();

        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        let mut roll = rand::thread_rng().gen_range(0.0..total);

        let mut selected = weights
            .last()
            .map(|(id, _)| id.clone())
            .unwrap_or_else(|| candidates[0].id.clone());
        for (id, weight) in &weights {
            if roll < *weight {
                selected = id.clone();
                break;
            }
            roll -= weight;
        }

        if let Some(effective) = self.effective.get_mut(&selected) {
            *effective *= self.decay;
        }
        Some(selected)
    }

    fn select_for_removal(
        &self,
        candidates: &[&Agent],
        count: usize,
        _loads: &HashMap<AgentId, AgentLoad>,
    ) -> Vec<AgentId> {
        // Lightest agents go first
        let mut ids: Vec<&AgentId> = candidates.iter().map(|a| &a.id).collect();
        ids.sort_by(|a, b| {
            let wa = self.effective.get(*a).copied().unwrap_or(1.0);
            let wb = self.effective.get(*b).copied().unwrap_or(1.0);
            wa.partial_cmp(&wb).unwrap_or(std::cmp::Ordering::Equal)
        });
        ids.into_iter().take(count).cloned().collect()
    }

    fn record_completion(&mut self, agent_id: &AgentId, _success: bool, _duration_ms: u64) {
        let base = self.base.get(agent_id).copied().unwrap_or(1.0);
        if let Some(effective) = self.effective.get_mut(agent_id) {
            *effective = (*effective + self.replenish * base).min(base);
        }
    }

    fn set_weight(&mut self, agent_id: &AgentId, weight: f64) {
        let weight = weight.max(f64::EPSILON);
        self.base.insert(agent_id.clone(), weight);
        self.effective.insert(agent_id.clone(), weight);
    }

    fn forget_agent(&mut self, agent_id: &AgentId) {
        self.base.remove(agent_id);
        self.effective.remove(agent_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentType;

    fn agent(id: &str, priority: u8) -> Agent {
        Agent::new(id, AgentType::Analyst, 0).with_priority(priority)
    }

    #[test]
    fn test_selection_decays_winner() {
        let a = agent("a", 4);
        let candidates = vec![&a];
        let task = Task::new("t", "work", 0);
        let mut strategy = WeightedStrategy::new(0.5, 0.1);

        strategy.select_agent(&candidates, &task).unwrap();
        assert_eq!(strategy.effective_weight(&AgentId::new("a")), Some(2.0));

        strategy.select_agent(&candidates, &task).unwrap();
        assert_eq!(strategy.effective_weight(&AgentId::new("a")), Some(1.0));
    }

    #[test]
    fn test_completion_replenishes_up_to_base() {
        let a = agent("a", 4);
        let candidates = vec![&a];
        let task = Task::new("t", "work", 0);
        let mut strategy = WeightedStrategy::new(0.5, 0.5);

        strategy.select_agent(&candidates, &task).unwrap();
        assert_eq!(strategy.effective_weight(&AgentId::new("a")), Some(2.0));

        strategy.record_completion(&AgentId::new("a"), true, 10);
        assert_eq!(strategy.effective_weight(&AgentId::new("a")), Some(4.0));

        // Already at base; replenishment caps
        strategy.record_completion(&AgentId::new("a"), true, 10);
        assert_eq!(strategy.effective_weight(&AgentId::new("a")), Some(4.0));
    }

    #[test]
    fn test_set_weight_overrides_priority() {
        let a = agent("a", 1);
        let b = agent("b", 1);
        let candidates = vec![&a, &b];
        let task = Task::new("t", "work", 0);
        let mut strategy = WeightedStrategy::new(1.0, 0.0);

        // Give "b" overwhelming weight; over many draws it must dominate
        strategy.set_weight(&AgentId::new("b"), 10_000.0);
        let mut b_wins = 0;
        for _ in 0..50 {
            if strategy.select_agent(&candidates, &task).unwrap() == AgentId::new("b") {
                b_wins += 1;
            }
        }
        assert!(b_wins > 40);
    }

    #[test]
    fn test_removal_picks_lightest() {
        let a = agent("a", 1);
        let b = agent("b", 1);
        let candidates = vec![&a, &b];
        let mut strategy = WeightedStrategy::new(0.5, 0.0);
        strategy.set_weight(&AgentId::new("a"), 8.0);
        strategy.set_weight(&AgentId::new("b"), 2.0);

        let victims = strategy.select_for_removal(&candidates, 1, &HashMap::new());
        assert_eq!(victims, vec![AgentId::new("b")]);
    }
}
