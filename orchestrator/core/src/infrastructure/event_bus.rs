// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Event Bus Implementation - Pub/Sub for Deployment Events
//
// Provides in-memory event streaming using tokio broadcast channels.
// Lets the CLI and other observers follow a deployment, including the
// deferred governance step that finishes after the caller got its receipt.

use crate::domain::events::{DeploymentEvent, DeploymentId};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Event bus for publishing and subscribing to deployment events
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<DeploymentEvent>>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    /// Capacity determines how many events can be buffered before dropping old ones
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create event bus with default capacity (1000)
    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    /// Publish a deployment event to all subscribers
    pub fn publish(&self, event: DeploymentEvent) {
        debug!("Publishing event: {:?}", event);

        // send() only fails when nobody is subscribed
        let receiver_count = self.sender.send(event).unwrap_or(0);

        if receiver_count == 0 {
            debug!("No subscribers listening to event");
        }
    }

    /// Subscribe to all deployment events
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Subscribe and filter for a single deployment
    pub fn subscribe_deployment(&self, deployment_id: DeploymentId) -> DeploymentEventReceiver {
        DeploymentEventReceiver {
            receiver: self.sender.subscribe(),
            deployment_id,
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

fn map_recv_error(e: broadcast::error::RecvError) -> EventBusError {
    match e {
        broadcast::error::RecvError::Closed => EventBusError::Closed,
        broadcast::error::RecvError::Lagged(n) => {
            warn!("Event receiver lagged by {} events", n);
            EventBusError::Lagged(n)
        }
    }
}

/// Receiver for all deployment events
pub struct EventReceiver {
    receiver: broadcast::Receiver<DeploymentEvent>,
}

impl EventReceiver {
    /// Receive the next event (waits until one is available)
    pub async fn recv(&mut self) -> Result<DeploymentEvent, EventBusError> {
        self.receiver.recv().await.map_err(map_recv_error)
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<DeploymentEvent, EventBusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => EventBusError::Empty,
            broadcast::error::TryRecvError::Closed => EventBusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }
}

/// Receiver for one deployment's events (filtered)
pub struct DeploymentEventReceiver {
    receiver: broadcast::Receiver<DeploymentEvent>,
    deployment_id: DeploymentId,
}

impl DeploymentEventReceiver {
    /// Receive the next event for the subscribed deployment
    pub async fn recv(&mut self) -> Result<DeploymentEvent, EventBusError> {
        loop {
            let event = self.receiver.recv().await.map_err(map_recv_error)?;
            if event.deployment_id() == self.deployment_id {
                return Ok(event);
            }
        }
    }
}

/// Errors that can occur when receiving events
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::DeploymentPhase;
    use chrono::Utc;

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();
        let deployment_id = DeploymentId::new();

        event_bus.publish(DeploymentEvent::DeploymentStarted {
            deployment_id,
            organization: "smart-farming".to_string(),
            group_count: 3,
            started_at: Utc::now(),
        });

        match receiver.recv().await.unwrap() {
            DeploymentEvent::DeploymentStarted { deployment_id: id, group_count, .. } => {
                assert_eq!(id, deployment_id);
                assert_eq!(group_count, 3);
            }
            other => panic!("Wrong event type received: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_deployment_event_filtering() {
        let event_bus = EventBus::new(10);
        let deployment_id = DeploymentId::new();
        let mut receiver = event_bus.subscribe_deployment(deployment_id);

        event_bus.publish(DeploymentEvent::PhaseCompleted {
            deployment_id: DeploymentId::new(),
            phase: DeploymentPhase::GroupArtifacts,
            operations: 2,
            completed_at: Utc::now(),
        });
        event_bus.publish(DeploymentEvent::PhaseCompleted {
            deployment_id,
            phase: DeploymentPhase::OrganizationArtifact,
            operations: 1,
            completed_at: Utc::now(),
        });

        match receiver.recv().await.unwrap() {
            DeploymentEvent::PhaseCompleted { deployment_id: id, phase, .. } => {
                assert_eq!(id, deployment_id);
                assert_eq!(phase, DeploymentPhase::OrganizationArtifact);
            }
            other => panic!("Wrong event type received: {:?}", other),
        }
    }

    #[test]
    fn test_try_recv_empty() {
        let event_bus = EventBus::new(4);
        let mut receiver = event_bus.subscribe();
        assert_eq!(event_bus.subscriber_count(), 1);
        assert!(matches!(receiver.try_recv(), Err(EventBusError::Empty)));
    }
}
