//! Quorum consensus
//!
//! The swarm's consensus is a sampling vote aggregator, not a replicated
//! log: votes are collected (elsewhere, under a timeout), then tallied here.
//! A result is produced even when quorum is not reached; callers inspect
//! [`ConsensusResult::reached`].

use crate::agent::AgentId;
use crate::config::ConsensusConfig;
use serde::{Deserialize, Serialize};

/// A single vote in a consensus round.
///
/// # Example
///
/// ```
/// use warden_domain::consensus::ConsensusVote;
///
/// let vote = ConsensusVote::approve("agent-1").with_confidence(0.8);
/// assert!(vote.approved);
/// assert_eq!(vote.confidence, 0.8);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusVote {
    pub agent_id: AgentId,
    pub approved: bool,
    /// Confidence in [0, 1]; explicit votes default to 1.0
    pub confidence: f64,
}

impl ConsensusVote {
    pub fn new(agent_id: impl Into<AgentId>, approved: bool) -> Self {
        Self {
            agent_id: agent_id.into(),
            approved,
            confidence: 1.0,
        }
    }

    pub fn approve(agent_id: impl Into<AgentId>) -> Self {
        Self::new(agent_id, true)
    }

    pub fn reject(agent_id: impl Into<AgentId>) -> Self {
        Self::new(agent_id, false)
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }
}

/// Outcome of a consensus round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub proposal_id: String,
    /// Quorum reached: total_votes >= quorum_size
    pub reached: bool,
    /// Approved: approvals / total_votes >= approval_threshold
    pub decision: bool,
    pub total_votes: usize,
    pub approvals: usize,
    pub rejections: usize,
    pub avg_confidence: f64,
    pub participants: Vec<AgentId>,
    pub duration_ms: u64,
}

impl ConsensusResult {
    /// Approval ratio in [0, 1]; 0 when no votes were counted
    pub fn approval_ratio(&self) -> f64 {
        if self.total_votes == 0 {
            0.0
        } else {
            self.approvals as f64 / self.total_votes as f64
        }
    }
}

/// Pure vote aggregator parameterized by a [`ConsensusConfig`].
#[derive(Debug, Clone)]
pub struct ConsensusEngine {
    config: ConsensusConfig,
}

impl ConsensusEngine {
    pub fn new(config: ConsensusConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Tally a set of collected votes.
    ///
    /// Votes below `min_confidence` are abstentions: they do not count
    /// toward approvals, rejections or quorum. At most `quorum_size` voters
    /// are sampled, in the order given.
    pub fn tally(
        &self,
        proposal_id: impl Into<String>,
        votes: &[ConsensusVote],
        duration_ms: u64,
    ) -> ConsensusResult {
        let counted: Vec<&ConsensusVote> = votes
            .iter()
            .filter(|v| v.confidence >= self.config.min_confidence)
            .take(self.config.quorum_size)
            .collect();

        let approvals = counted.iter().filter(|v| v.approved).count();
        let rejections = counted.len() - approvals;
        let total_votes = counted.len();

        let avg_confidence = if counted.is_empty() {
            0.0
        } else {
            counted.iter().map(|v| v.confidence).sum::<f64>() / counted.len() as f64
        };

        let reached = total_votes >= self.config.quorum_size;
        let decision =
            total_votes > 0 && approvals as f64 / total_votes as f64 >= self.config.approval_threshold;

        ConsensusResult {
            proposal_id: proposal_id.into(),
            reached,
            decision,
            total_votes,
            approvals,
            rejections,
            avg_confidence,
            participants: counted.iter().map(|v| v.agent_id.clone()).collect(),
            duration_ms,
        }
    }
}
