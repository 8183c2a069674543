use crate::{
    commands::Command,
    errors::EngineError,
    events::{Event, EventSender},
    models::{Delivery, Order, OrderStatus},
    store::CommerceStore,
};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use prometheus::IntCounter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    static ref ORDERS_DELIVERED: IntCounter =
        IntCounter::new("orders_delivered_total", "Total number of orders delivered")
            .expect("metric can be created");
    static ref ORDER_DELIVER_FAILURES: IntCounter = IntCounter::new(
        "order_deliver_failures_total",
        "Total number of failed order deliveries"
    )
    .expect("metric can be created");
}

/// Marks a shipped order as delivered and stamps the reception date on the
/// linked delivery, materializing one with preparing defaults when the order
/// only had a virtual projection.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct DeliverOrderCommand {
    pub order_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeliverOrderResult {
    pub id: Uuid,
    pub status: String,
    pub delivery_id: Option<Uuid>,
    pub delivered_at: DateTime<Utc>,
}

#[async_trait::async_trait]
impl Command for DeliverOrderCommand {
    type Result = DeliverOrderResult;

    #[instrument(skip(self, store, event_sender))]
    async fn execute(
        &self,
        store: Arc<dyn CommerceStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, EngineError> {
        let now = Utc::now();
        let (order, old_status) = self.deliver_order(store.as_ref(), now).await?;
        let delivery_id = self.stamp_delivery(store.as_ref(), &order, now).await?;

        self.log_and_trigger_event(&event_sender, &order, old_status)
            .await;

        ORDERS_DELIVERED.inc();

        Ok(DeliverOrderResult {
            id: order.id,
            status: order.status.to_string(),
            delivery_id,
            delivered_at: now,
        })
    }
}

impl DeliverOrderCommand {
    async fn deliver_order(
        &self,
        store: &dyn CommerceStore,
        now: DateTime<Utc>,
    ) -> Result<(Order, OrderStatus), EngineError> {
        let mut order = store
            .get_order(self.order_id)
            .await?
            .ok_or_else(|| {
                ORDER_DELIVER_FAILURES.inc();
                let msg = format!("Order {} not found", self.order_id);
                error!("{}", msg);
                EngineError::NotFound(msg)
            })?;

        let old_status = order.status;
        order
            .transition_to(OrderStatus::Delivered, now)
            .map_err(|e| {
                ORDER_DELIVER_FAILURES.inc();
                error!("{}", e);
                e
            })?;

        store.save_order(&order).await.map_err(|e| {
            ORDER_DELIVER_FAILURES.inc();
            let msg = format!("Failed to update order {}: {}", self.order_id, e);
            error!("{}", msg);
            EngineError::StorageError(e)
        })?;

        Ok((order, old_status))
    }

    /// Stamps `delivered_at` on the order's delivery. The delivery keeps its
    /// own status; only the reception date is recorded here.
    async fn stamp_delivery(
        &self,
        store: &dyn CommerceStore,
        order: &Order,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>, EngineError> {
        let mut delivery = match store.find_delivery_by_order(order.id).await? {
            Some(delivery) => delivery,
            None => {
                let delivery = Delivery::materialize(order, now);
                store.create_delivery(&delivery).await.map_err(|e| {
                    ORDER_DELIVER_FAILURES.inc();
                    let msg = format!(
                        "Failed to create delivery for order {}: {}",
                        self.order_id, e
                    );
                    error!("{}", msg);
                    EngineError::StorageError(e)
                })?;
                delivery
            }
        };

        delivery.delivered_at = Some(now);
        delivery.updated_at = Some(now);
        store.save_delivery(&delivery).await.map_err(|e| {
            ORDER_DELIVER_FAILURES.inc();
            let msg = format!(
                "Failed to stamp delivery {} for order {}: {}",
                delivery.id, self.order_id, e
            );
            error!("{}", msg);
            EngineError::StorageError(e)
        })?;

        Ok(Some(delivery.id))
    }

    async fn log_and_trigger_event(
        &self,
        event_sender: &EventSender,
        order: &Order,
        old_status: OrderStatus,
    ) {
        info!(order_id = %self.order_id, "Order successfully delivered");

        if let Err(e) = event_sender
            .send(Event::OrderStatusChanged {
                order_id: order.id,
                old_status,
                new_status: order.status,
            })
            .await
        {
            warn!(
                order_id = %order.id,
                "Failed to send event for delivered order: {}", e
            );
        }
    }
}
