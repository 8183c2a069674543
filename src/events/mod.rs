use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{DeliveryStatus, OrderStatus};

/// Events emitted after a state change has been persisted. The hosting
/// application drains the receiving end (webhooks, audit trail, UI refresh).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Order events
    OrderCreated(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
    OrderCancelled(Uuid),

    // Delivery events
    DeliveryMaterialized {
        delivery_id: Uuid,
        order_id: Uuid,
    },
    DeliveryStatusChanged {
        delivery_id: Uuid,
        old_status: DeliveryStatus,
        new_status: DeliveryStatus,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Builds the event channel pair with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Drains an event channel, logging each event. Hosting applications that do
/// not process events themselves can spawn this to keep the channel moving.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    info!("Event processor started");
    while let Some(event) = receiver.recv().await {
        debug!(?event, "Event received");
    }
    info!("Event processor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_and_receive_round_trip() {
        let (sender, mut receiver) = event_channel(8);
        let order_id = Uuid::new_v4();

        sender.send(Event::OrderCreated(order_id)).await.unwrap();

        match receiver.recv().await {
            Some(Event::OrderCreated(id)) => assert_eq!(id, order_id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn events_serialize_with_wire_status_names() {
        let event = Event::OrderStatusChanged {
            order_id: Uuid::nil(),
            old_status: OrderStatus::Confirmed,
            new_status: OrderStatus::Shipped,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"confirmed\""));
        assert!(json.contains("\"shipped\""));

        let back: Event = serde_json::from_str(&json).unwrap();
        match back {
            Event::OrderStatusChanged { new_status, .. } => {
                assert_eq!(new_status, OrderStatus::Shipped);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_fails_once_receiver_is_dropped() {
        let (sender, receiver) = event_channel(1);
        drop(receiver);

        let result = sender.send(Event::OrderCancelled(Uuid::new_v4())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn process_events_drains_until_the_senders_are_gone() {
        let (sender, receiver) = event_channel(8);
        let processor = tokio::spawn(process_events(receiver));

        sender.send(Event::OrderCreated(Uuid::new_v4())).await.unwrap();
        sender.send(Event::OrderCancelled(Uuid::new_v4())).await.unwrap();
        drop(sender);

        // The processor stops once the channel closes.
        processor.await.unwrap();
    }
}
