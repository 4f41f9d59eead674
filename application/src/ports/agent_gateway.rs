//! Agent gateway port
//!
//! Defines the interface for asking a live agent to evaluate an
//! authorization request. Agent-internal decision logic is outside this
//! crate; the pipeline only sees verdicts.

use async_trait::async_trait;
use thiserror::Error;
use warden_domain::{Agent, AuthzRequest};

/// Errors that can occur while consulting an agent
#[derive(Error, Debug)]
pub enum AgentGatewayError {
    #[error("Agent unreachable: {0}")]
    Unreachable(String),

    #[error("Evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// A single agent's answer to an authorization question
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentVerdict {
    pub allowed: bool,
    /// Confidence in [0, 1]
    pub confidence: f64,
}

impl AgentVerdict {
    pub fn allow(confidence: f64) -> Self {
        Self {
            allowed: true,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn deny(confidence: f64) -> Self {
        Self {
            allowed: false,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Gateway for agent evaluation
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait AgentGateway: Send + Sync {
    /// Ask one agent to evaluate a request
    async fn evaluate(
        &self,
        agent: &Agent,
        request: &AuthzRequest,
    ) -> Result<AgentVerdict, AgentGatewayError>;
}
