//! Round-robin strategy

use super::AgentLoad;
use super::strategy::{LoadBalancingStrategy, least_recently_active};
use crate::agent::{Agent, AgentId, Task};
use std::collections::HashMap;

/// Cyclic pointer over the candidate list.
///
/// The pointer survives membership changes; it is reduced modulo the
/// current candidate count on every selection, so the rotation wraps
/// around regardless of churn.
#[derive(Debug, Default)]
pub struct RoundRobinStrategy {
    cursor: usize,
}

impl RoundRobinStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancingStrategy for RoundRobinStrategy {
    fn name(&self) -> &'static str {
        "round_robin"
    }

    fn select_agent(&mut self, candidates: &[&Agent], _task: &Task) -> Option<AgentId> {
        if candidates.is_empty() {
            return None;
        }
        let selected = candidates[self.cursor % candidates.len()].id.clone();
        self.cursor = self.cursor.wrapping_add(1);
        Some(selected)
    }

    fn select_for_removal(
        &self,
        candidates: &[&Agent],
        count: usize,
        loads: &HashMap<AgentId, AgentLoad>,
    ) -> Vec<AgentId> {
        least_recently_active(candidates, count, loads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentType;

    fn agents(names: &[&str]) -> Vec<Agent> {
        names
            .iter()
            .map(|n| Agent::new(*n, AgentType::Guardian, 0))
            .collect()
    }

    #[test]
    fn test_cycles_and_wraps() {
        let pool = agents(&["a", "b", "c"]);
        let candidates: Vec<&Agent> = pool.iter().collect();
        let task = Task::new("t", "work", 0);
        let mut strategy = RoundRobinStrategy::new();

        let picks: Vec<String> = (0..4)
            .map(|_| strategy.select_agent(&candidates, &task).unwrap().to_string())
            .collect();
        assert_eq!(picks, vec!["a", "b", "c", "a"]);
    }

    #[test]
    fn test_empty_candidates_selects_none() {
        let mut strategy = RoundRobinStrategy::new();
        let task = Task::new("t", "work", 0);
        assert!(strategy.select_agent(&[], &task).is_none());
    }

    #[test]
    fn test_removal_prefers_least_recently_active() {
        let pool = agents(&["a", "b", "c"]);
        let candidates: Vec<&Agent> = pool.iter().collect();
        let strategy = RoundRobinStrategy::new();

        let mut loads = HashMap::new();
        for (id, at) in [("a", 300_u64), ("b", 100), ("c", 200)] {
            let mut load = AgentLoad::default();
            load.last_activity = at;
            loads.insert(AgentId::new(id), load);
        }

        let victims = strategy.select_for_removal(&candidates, 2, &loads);
        assert_eq!(victims, vec![AgentId::new("b"), AgentId::new("c")]);
    }
}
