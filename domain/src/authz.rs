//! Authorization pipeline value objects
//!
//! The coordinator runs a request through a sequence of typed agent cohorts
//! and folds their verdicts into a single decision. The types here carry
//! that flow; the dispatching itself lives in the application layer.

use crate::agent::{AgentId, AgentType};
use crate::consensus::{ConsensusResult, ConsensusVote};
use serde::{Deserialize, Serialize};

/// An authorization request entering the swarm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthzRequest {
    pub id: String,
    pub subject: String,
    pub action: String,
    pub resource: String,
    /// Sticky-session key, when the caller has one
    pub session_id: Option<String>,
    /// Sticky user key; routing falls back to `subject` when unset
    pub user_id: Option<String>,
    /// Opaque evaluation context forwarded to agents
    pub context: serde_json::Value,
    /// Validate the aggregate decision with a consensus round
    pub require_consensus: bool,
}

impl AuthzRequest {
    pub fn new(
        id: impl Into<String>,
        subject: impl Into<String>,
        action: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            action: action.into(),
            resource: resource.into(),
            session_id: None,
            user_id: None,
            context: serde_json::Value::Null,
            require_consensus: false,
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = context;
        self
    }

    pub fn with_consensus(mut self) -> Self {
        self.require_consensus = true;
        self
    }
}

/// One participating agent type's verdict on a request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDecision {
    pub agent_type: AgentType,
    pub agent_id: AgentId,
    pub allowed: bool,
    pub confidence: f64,
    pub latency_ms: u64,
}

/// Final aggregate decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthzDecision {
    Allow,
    Deny,
    Indeterminate,
}

impl std::fmt::Display for AuthzDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuthzDecision::Allow => "allow",
            AuthzDecision::Deny => "deny",
            AuthzDecision::Indeterminate => "indeterminate",
        };
        write!(f, "{s}")
    }
}

/// Result of a full pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub request_id: String,
    pub decision: AuthzDecision,
    pub confidence: f64,
    pub agent_decisions: Vec<AgentDecision>,
    /// Present when the caller requested consensus validation
    pub consensus: Option<ConsensusResult>,
    pub processing_time_ms: u64,
}

/// Fold per-type verdicts into a decision without consensus.
///
/// Any denial denies; all allowing verdicts allow; no verdicts at all is
/// indeterminate. Confidence is the mean of participating verdicts.
pub fn aggregate_decisions(decisions: &[AgentDecision]) -> (AuthzDecision, f64) {
    if decisions.is_empty() {
        return (AuthzDecision::Indeterminate, 0.0);
    }

    let confidence =
        decisions.iter().map(|d| d.confidence).sum::<f64>() / decisions.len() as f64;

    let decision = if decisions.iter().any(|d| !d.allowed) {
        AuthzDecision::Deny
    } else {
        AuthzDecision::Allow
    };

    (decision, confidence)
}

/// Interpret a consensus round as a pipeline decision.
///
/// An unreached quorum is indeterminate; otherwise the round's decision
/// maps directly to allow/deny.
pub fn decision_from_consensus(result: &ConsensusResult) -> AuthzDecision {
    if !result.reached {
        AuthzDecision::Indeterminate
    } else if result.decision {
        AuthzDecision::Allow
    } else {
        AuthzDecision::Deny
    }
}

impl AgentDecision {
    /// The consensus vote this decision casts
    pub fn to_vote(&self) -> ConsensusVote {
        ConsensusVote::new(self.agent_id.clone(), self.allowed).with_confidence(self.confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision(agent_type: AgentType, allowed: bool, confidence: f64) -> AgentDecision {
        AgentDecision {
            agent_type,
            agent_id: AgentId::new("agent-1"),
            allowed,
            confidence,
            latency_ms: 5,
        }
    }

    #[test]
    fn test_all_allow_aggregates_to_allow() {
        let decisions = vec![
            decision(AgentType::Guardian, true, 0.9),
            decision(AgentType::Analyst, true, 0.7),
        ];
        let (outcome, confidence) = aggregate_decisions(&decisions);
        assert_eq!(outcome, AuthzDecision::Allow);
        assert!((confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_any_deny_aggregates_to_deny() {
        let decisions = vec![
            decision(AgentType::Guardian, true, 0.9),
            decision(AgentType::Enforcer, false, 0.95),
        ];
        let (outcome, _) = aggregate_decisions(&decisions);
        assert_eq!(outcome, AuthzDecision::Deny);
    }

    #[test]
    fn test_no_decisions_is_indeterminate() {
        let (outcome, confidence) = aggregate_decisions(&[]);
        assert_eq!(outcome, AuthzDecision::Indeterminate);
        assert_eq!(confidence, 0.0);
    }

    #[test]
    fn test_request_builder_carries_user_id() {
        let request = AuthzRequest::new("r-1", "svc-gateway", "read", "doc-1")
            .with_user_id("alice");
        assert_eq!(request.subject, "svc-gateway");
        assert_eq!(request.user_id.as_deref(), Some("alice"));
        assert!(AuthzRequest::new("r-2", "bob", "read", "doc-1").user_id.is_none());
    }

    #[test]
    fn test_decision_to_vote_carries_confidence() {
        let vote = decision(AgentType::Analyst, false, 0.6).to_vote();
        assert!(!vote.approved);
        assert_eq!(vote.confidence, 0.6);
    }
}
