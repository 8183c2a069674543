use crate::{
    commands::Command,
    errors::EngineError,
    events::{Event, EventSender},
    models::{Order, OrderStatus},
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
    static ref ORDERS_SHIPPED: IntCounter =
        IntCounter::new("orders_shipped_total", "Total number of orders shipped")
            .expect("metric can be created");
    static ref ORDER_SHIP_FAILURES: IntCounter = IntCounter::new(
        "order_ship_failures_total",
        "Total number of failed order shipments"
    )
    .expect("metric can be created");
}

/// Ships a confirmed order, stamping `shipped_at`. The supplier pending
/// counter is untouched here; that side effect belongs to creation only.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ShipOrderCommand {
    pub order_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShipOrderResult {
    pub id: Uuid,
    pub status: String,
    pub shipped_at: Option<DateTime<Utc>>,
}

#[async_trait::async_trait]
impl Command for ShipOrderCommand {
    type Result = ShipOrderResult;

    #[instrument(skip(self, store, event_sender))]
    async fn execute(
        &self,
        store: Arc<dyn CommerceStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, EngineError> {
        let (order, old_status) = self.ship_order(store.as_ref()).await?;

        self.log_and_trigger_event(&event_sender, &order, old_status)
            .await;

        ORDERS_SHIPPED.inc();

        Ok(ShipOrderResult {
            id: order.id,
            status: order.status.to_string(),
            shipped_at: order.shipped_at,
        })
    }
}

impl ShipOrderCommand {
    async fn ship_order(
        &self,
        store: &dyn CommerceStore,
    ) -> Result<(Order, OrderStatus), EngineError> {
        let mut order = store
            .get_order(self.order_id)
            .await?
            .ok_or_else(|| {
                ORDER_SHIP_FAILURES.inc();
                let msg = format!("Order {} not found", self.order_id);
                error!("{}", msg);
                EngineError::NotFound(msg)
            })?;

        let old_status = order.status;
        order
            .transition_to(OrderStatus::Shipped, Utc::now())
            .map_err(|e| {
                ORDER_SHIP_FAILURES.inc();
                error!("{}", e);
                e
            })?;

        store.save_order(&order).await.map_err(|e| {
            ORDER_SHIP_FAILURES.inc();
            let msg = format!("Failed to update order {}: {}", self.order_id, e);
            error!("{}", msg);
            EngineError::StorageError(e)
        })?;

        Ok((order, old_status))
    }

    async fn log_and_trigger_event(
        &self,
        event_sender: &EventSender,
        order: &Order,
        old_status: OrderStatus,
    ) {
        info!(
            order_id = %self.order_id,
            shipped_at = ?order.shipped_at,
            "Order successfully shipped"
        );

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
                "Failed to send event for shipped order: {}", e
            );
        }
    }
}
