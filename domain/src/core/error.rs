//! Swarm error taxonomy

use thiserror::Error;

/// Errors surfaced by swarm components.
///
/// Configuration errors ([`SwarmError::UnknownStrategy`],
/// [`SwarmError::UnknownTopology`], [`SwarmError::InvalidConfig`]) are fatal
/// at construction time. [`SwarmError::Capacity`] and
/// [`SwarmError::NotInitialized`] are thrown to the direct caller. Per-agent
/// transient failures (a bad health check, a missing vote) are absorbed into
/// state and metrics, never raised as errors.
#[derive(Error, Debug)]
pub enum SwarmError {
    #[error("Pool at capacity: {current} of {max} agents")]
    Capacity { current: usize, max: usize },

    #[error("Coordinator not initialized; call initialize() first")]
    NotInitialized,

    #[error("Unknown load-balancing strategy: {0}")]
    UnknownStrategy(String),

    #[error("Unknown topology type: {0}")]
    UnknownTopology(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Spawn failed: {0}")]
    Spawn(String),
}

impl SwarmError {
    /// Check whether this error is a capacity rejection
    pub fn is_capacity(&self) -> bool {
        matches!(self, SwarmError::Capacity { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_error_display() {
        let error = SwarmError::Capacity {
            current: 10,
            max: 10,
        };
        assert_eq!(error.to_string(), "Pool at capacity: 10 of 10 agents");
        assert!(error.is_capacity());
    }

    #[test]
    fn test_not_initialized_is_not_capacity() {
        assert!(!SwarmError::NotInitialized.is_capacity());
    }

    #[test]
    fn test_unknown_topology_display() {
        let error = SwarmError::UnknownTopology("pentagram".to_string());
        assert_eq!(error.to_string(), "Unknown topology type: pentagram");
    }
}
