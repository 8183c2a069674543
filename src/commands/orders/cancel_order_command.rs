use crate::{
    commands::Command,
    errors::EngineError,
    events::{Event, EventSender},
    models::{Order, OrderStatus},
    store::CommerceStore,
};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    static ref ORDER_CANCELLATIONS: IntCounter = IntCounter::new(
        "order_cancellations_total",
        "Total number of order cancellations"
    )
    .expect("metric can be created");
    static ref ORDER_CANCELLATION_FAILURES: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new(
            "order_cancellation_failures_total",
            "Total number of failed order cancellations"
        ),
        &["error_type"]
    )
    .expect("metric can be created");
}

/// Cancels any non-terminal order, stamping `cancelled_at` and keeping the
/// reason on the record.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CancelOrderCommand {
    pub order_id: Uuid,
    #[validate(length(
        max = 500,
        message = "Reason must be at most 500 characters"
    ))]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelOrderResult {
    pub id: Uuid,
    pub status: String,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
}

#[async_trait::async_trait]
impl Command for CancelOrderCommand {
    type Result = CancelOrderResult;

    #[instrument(skip(self, store, event_sender))]
    async fn execute(
        &self,
        store: Arc<dyn CommerceStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, EngineError> {
        self.validate().map_err(|e| {
            ORDER_CANCELLATION_FAILURES
                .with_label_values(&["validation_error"])
                .inc();
            let msg = format!("Invalid input: {}", e);
            error!("{}", msg);
            EngineError::ValidationError(msg)
        })?;

        let order = self.cancel_order(store.as_ref()).await?;

        self.log_and_trigger_event(&event_sender, &order).await;

        ORDER_CANCELLATIONS.inc();

        Ok(CancelOrderResult {
            id: order.id,
            status: order.status.to_string(),
            cancelled_at: order.cancelled_at,
            cancel_reason: order.cancel_reason.clone(),
        })
    }
}

impl CancelOrderCommand {
    async fn cancel_order(&self, store: &dyn CommerceStore) -> Result<Order, EngineError> {
        let mut order = store
            .get_order(self.order_id)
            .await?
            .ok_or_else(|| {
                ORDER_CANCELLATION_FAILURES
                    .with_label_values(&["not_found"])
                    .inc();
                let msg = format!("Order {} not found", self.order_id);
                error!("{}", msg);
                EngineError::NotFound(msg)
            })?;

        order
            .transition_to(OrderStatus::Cancelled, Utc::now())
            .map_err(|e| {
                ORDER_CANCELLATION_FAILURES
                    .with_label_values(&["invalid_transition"])
                    .inc();
                error!("{}", e);
                e
            })?;
        order.cancel_reason = self.reason.clone();

        store.save_order(&order).await.map_err(|e| {
            ORDER_CANCELLATION_FAILURES
                .with_label_values(&["storage_error"])
                .inc();
            let msg = format!("Failed to update order {}: {}", self.order_id, e);
            error!("{}", msg);
            EngineError::StorageError(e)
        })?;

        Ok(order)
    }

    async fn log_and_trigger_event(&self, event_sender: &EventSender, order: &Order) {
        info!(
            order_id = %self.order_id,
            reason = ?self.reason,
            "Order cancelled successfully"
        );

        if let Err(e) = event_sender.send(Event::OrderCancelled(order.id)).await {
            ORDER_CANCELLATION_FAILURES
                .with_label_values(&["event_error"])
                .inc();
            warn!(
                order_id = %order.id,
                "Failed to send event for cancelled order: {}", e
            );
        }
    }
}
