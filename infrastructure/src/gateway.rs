//! In-memory agent gateway adapter
//!
//! Default [`AgentGateway`] for local deployments and demos. Verdicts are
//! scripted per agent type; unscripted types allow with high confidence.
//! A request whose context carries `"suspicious": true` is denied
//! regardless of scripting, so demo pipelines have a deny path.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use warden_application::ports::{AgentGateway, AgentGatewayError, AgentVerdict};
use warden_domain::{Agent, AgentType, AuthzRequest};

const DEFAULT_CONFIDENCE: f64 = 0.9;

#[derive(Default)]
pub struct InMemoryAgentGateway {
    verdicts: Mutex<HashMap<AgentType, AgentVerdict>>,
}

impl InMemoryAgentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the verdict every agent of this type returns
    pub fn set_verdict(&self, agent_type: AgentType, verdict: AgentVerdict) {
        self.verdicts.lock().unwrap().insert(agent_type, verdict);
    }

    fn suspicious(request: &AuthzRequest) -> bool {
        request
            .context
            .get("suspicious")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

#[async_trait]
impl AgentGateway for InMemoryAgentGateway {
    async fn evaluate(
        &self,
        agent: &Agent,
        request: &AuthzRequest,
    ) -> Result<AgentVerdict, AgentGatewayError> {
        if Self::suspicious(request) {
            return Ok(AgentVerdict::deny(0.99));
        }
        let verdict = self
            .verdicts
            .lock()
            .unwrap()
            .get(&agent.agent_type)
            .copied()
            .unwrap_or(AgentVerdict::allow(DEFAULT_CONFIDENCE));
        Ok(verdict)
    }
}
