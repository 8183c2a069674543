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
    static ref ORDERS_CONFIRMED: IntCounter =
        IntCounter::new("orders_confirmed_total", "Total number of orders confirmed")
            .expect("metric can be created");
    static ref ORDER_CONFIRM_FAILURES: IntCounter = IntCounter::new(
        "order_confirm_failures_total",
        "Total number of failed order confirmations"
    )
    .expect("metric can be created");
}

/// Confirms a processing order. From here on the lines and discounts are
/// frozen; only shipping and cancellation remain.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ConfirmOrderCommand {
    pub order_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfirmOrderResult {
    pub id: Uuid,
    pub status: String,
    pub confirmed_at: Option<DateTime<Utc>>,
}

#[async_trait::async_trait]
impl Command for ConfirmOrderCommand {
    type Result = ConfirmOrderResult;

    #[instrument(skip(self, store, event_sender))]
    async fn execute(
        &self,
        store: Arc<dyn CommerceStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, EngineError> {
        let (order, old_status) = self.confirm_order(store.as_ref()).await?;

        self.log_and_trigger_event(&event_sender, &order, old_status)
            .await;

        ORDERS_CONFIRMED.inc();

        Ok(ConfirmOrderResult {
            id: order.id,
            status: order.status.to_string(),
            confirmed_at: order.updated_at,
        })
    }
}

impl ConfirmOrderCommand {
    async fn confirm_order(
        &self,
        store: &dyn CommerceStore,
    ) -> Result<(Order, OrderStatus), EngineError> {
        let mut order = store
            .get_order(self.order_id)
            .await?
            .ok_or_else(|| {
                ORDER_CONFIRM_FAILURES.inc();
                let msg = format!("Order {} not found", self.order_id);
                error!("{}", msg);
                EngineError::NotFound(msg)
            })?;

        let old_status = order.status;
        order
            .transition_to(OrderStatus::Confirmed, Utc::now())
            .map_err(|e| {
                ORDER_CONFIRM_FAILURES.inc();
                error!("{}", e);
                e
            })?;

        store.save_order(&order).await.map_err(|e| {
            ORDER_CONFIRM_FAILURES.inc();
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
        info!(order_id = %self.order_id, "Order confirmed successfully");

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
                "Failed to send event for confirmed order: {}", e
            );
        }
    }
}
