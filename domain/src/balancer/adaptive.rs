//! Adaptive (learning) strategy

use super::AgentLoad;
use super::strategy::LoadBalancingStrategy;
use crate::agent::{Agent, AgentId, AgentStatus, Task};
use rand::Rng;
use std::collections::HashMap;

/// Rolling per-agent outcome statistics
#[derive(Debug, Default, Clone)]
struct AgentStats {
    successes: u64,
    failures: u64,
    total_latency_ms: u64,
}

impl AgentStats {
    fn samples(&self) -> u64 {
        self.successes + self.failures
    }

    /// Success rate; optimistic 0.5 before any samples exist
    fn success_rate(&self) -> f64 {
        if self.samples() == 0 {
            0.5
        } else {
            self.successes as f64 / self.samples() as f64
        }
    }

    fn avg_latency_ms(&self) -> f64 {
        if self.samples() == 0 {
            0.0
        } else {
            self.total_latency_ms as f64 / self.samples() as f64
        }
    }
}

/// Scores candidates from status, load, history and task-type affinity.
///
/// Score = idle bonus + (1 − load) + success rate + affinity, weighted, plus
/// a small random jitter so equally-scored agents do not herd onto one
/// winner. Affinity counts how often an agent has handled a task type.
#[derive(Debug, Default)]
pub struct AdaptiveStrategy {
    stats: HashMap<AgentId, AgentStats>,
    affinity: HashMap<(String, AgentId), u32>,
}

const IDLE_BONUS: f64 = 0.2;
const LOAD_WEIGHT: f64 = 0.4;
const SUCCESS_WEIGHT: f64 = 0.3;
const AFFINITY_WEIGHT: f64 = 0.1;
const JITTER: f64 = 0.01;

impl AdaptiveStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    fn score(&self, agent: &Agent, task_type: &str, jitter: f64) -> f64 {
        let idle = if agent.status == AgentStatus::Idle {
            IDLE_BONUS
        } else {
            0.0
        };
        let stats = self.stats.get(&agent.id);
        let success_rate = stats.map(AgentStats::success_rate).unwrap_or(0.5);
        let affinity = self
            .affinity
            .get(&(task_type.to_string(), agent.id.clone()))
            .copied()
            .unwrap_or(0) as f64;
        let affinity_score = affinity / (affinity + 3.0);

        idle + (1.0 - agent.load) * LOAD_WEIGHT
            + success_rate * SUCCESS_WEIGHT
            + affinity_score * AFFINITY_WEIGHT
            + jitter
    }

    /// Observed average latency for an agent; exposed for diagnostics
    pub fn avg_latency_ms(&self, agent_id: &AgentId) -> f64 {
        self.stats
            .get(agent_id)
            .map(AgentStats::avg_latency_ms)
            .unwrap_or(0.0)
    }
}

impl LoadBalancingStrategy for AdaptiveStrategy {
    fn name(&self) -> &'static str {
        "adaptive"
    }

    fn select_agent(&mut self, candidates: &[&Agent], task: &Task) -> Option<AgentId> {
        let mut rng = rand::thread_rng();
        let selected = candidates
            .iter()
            .map(|agent| {
                let jitter = rng.gen_range(0.0..JITTER);
                (agent.id.clone(), self.score(agent, &task.task_type, jitter))
            })
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(id, _)| id)?;

        *self
            .affinity
            .entry((task.task_type.clone(), selected.clone()))
            .or_insert(0) += 1;
        Some(selected)
    }

    fn select_for_removal(
        &self,
        candidates: &[&Agent],
        count: usize,
        _loads: &HashMap<AgentId, AgentLoad>,
    ) -> Vec<AgentId> {
        // Worst historical performers go first
        let mut ids: Vec<&AgentId> = candidates.iter().map(|a| &a.id).collect();
        ids.sort_by(|a, b| {
            let ra = self.stats.get(*a).map(AgentStats::success_rate).unwrap_or(0.5);
            let rb = self.stats.get(*b).map(AgentStats::success_rate).unwrap_or(0.5);
            ra.partial_cmp(&rb).unwrap_or(std::cmp::Ordering::Equal)
        });
        ids.into_iter().take(count).cloned().collect()
    }

    fn record_completion(&mut self, agent_id: &AgentId, success: bool, duration_ms: u64) {
        let stats = self.stats.entry(agent_id.clone()).or_default();
        if success {
            stats.successes += 1;
        } else {
            stats.failures += 1;
        }
        stats.total_latency_ms += duration_ms;
    }

    fn forget_agent(&mut self, agent_id: &AgentId) {
        self.stats.remove(agent_id);
        self.affinity.retain(|(_, id), _| id != agent_id);
    }
}
