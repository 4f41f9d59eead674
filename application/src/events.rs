//! Swarm event bus
//!
//! A broadcast fan-out for [`SwarmEvent`]s. Emitting never blocks and
//! never fails; events published with no live subscriber are dropped.

use tokio::sync::broadcast;
use warden_domain::SwarmEvent;

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SwarmEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SwarmEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: SwarmEvent) {
        tracing::debug!(event = event.name(), "swarm event");
        // A closed channel just means nobody is listening
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
