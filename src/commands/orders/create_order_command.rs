use crate::{
    commands::Command,
    errors::EngineError,
    events::{Event, EventSender},
    models::{Counterparty, Order, OrderLine, OrderStatus, OrderType},
    money::validate_percent,
    store::CommerceStore,
};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use prometheus::IntCounter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    static ref ORDER_CREATIONS: IntCounter =
        IntCounter::new("order_creations_total", "Total number of orders created")
            .expect("metric can be created");
    static ref ORDER_CREATION_FAILURES: IntCounter = IntCounter::new(
        "order_creation_failures_total",
        "Total number of failed order creations"
    )
    .expect("metric can be created");
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateOrderCommand {
    pub order_type: OrderType,
    #[validate(length(min = 1, message = "Order number is required"))]
    pub number: String,
    /// Client id for sales, supplier id for purchases.
    pub counterparty_id: Uuid,
    #[validate(length(min = 1, message = "At least one line is required"))]
    pub lines: Vec<OrderLine>,
    #[validate(custom = "validate_percent")]
    pub global_discount_percent: Decimal,
    /// Status the order starts in; only draft and processing are accepted.
    pub initial_status: OrderStatus,
    pub expected_delivery_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrderResult {
    pub id: Uuid,
    pub number: String,
    pub status: String,
    pub net_payable: Decimal,
    pub created_at: DateTime<Utc>,
}

#[async_trait::async_trait]
impl Command for CreateOrderCommand {
    type Result = CreateOrderResult;

    #[instrument(skip(self, store, event_sender))]
    async fn execute(
        &self,
        store: Arc<dyn CommerceStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, EngineError> {
        self.validate().map_err(|e| {
            ORDER_CREATION_FAILURES.inc();
            let msg = format!("Invalid input: {}", e);
            error!("{}", msg);
            EngineError::ValidationError(msg)
        })?;

        if !self.initial_status.is_editable() {
            ORDER_CREATION_FAILURES.inc();
            let msg = format!(
                "New orders start in draft or processing, not {}",
                self.initial_status
            );
            error!("{}", msg);
            return Err(EngineError::ValidationError(msg));
        }

        let saved_order = self.create_order(store.as_ref()).await?;

        if self.order_type == OrderType::Purchase {
            // Supplier workload counter. Creation-only side effect; a miss
            // here must not fail an already saved order.
            if let Err(e) = store
                .increment_supplier_pending_orders(self.counterparty_id)
                .await
            {
                warn!(
                    supplier_id = %self.counterparty_id,
                    order_id = %saved_order.id,
                    "Failed to increment supplier pending orders: {}", e
                );
            }
        }

        self.log_and_trigger_event(&event_sender, &saved_order)
            .await;

        ORDER_CREATIONS.inc();

        let net_payable = saved_order
            .totals
            .as_ref()
            .map(|totals| totals.net_payable)
            .unwrap_or(Decimal::ZERO);

        Ok(CreateOrderResult {
            id: saved_order.id,
            number: saved_order.number.clone(),
            status: saved_order.status.to_string(),
            net_payable,
            created_at: saved_order.created_at,
        })
    }
}

impl CreateOrderCommand {
    async fn create_order(&self, store: &dyn CommerceStore) -> Result<Order, EngineError> {
        let counterparty = self.resolve_counterparty(store).await?;

        let mut order = Order::new(
            self.number.clone(),
            self.order_type,
            counterparty,
            self.lines.clone(),
            self.global_discount_percent,
            self.initial_status,
        );
        order.expected_delivery_date = self.expected_delivery_date;
        order.notes = self.notes.clone();

        // Validates every line along the way.
        let totals = order.compute_totals().map_err(|e| {
            ORDER_CREATION_FAILURES.inc();
            error!("Failed to compute totals for order {}: {}", self.number, e);
            e
        })?;
        order.totals = Some(totals);

        store.save_order(&order).await.map_err(|e| {
            ORDER_CREATION_FAILURES.inc();
            let msg = format!("Failed to save order {}: {}", self.number, e);
            error!("{}", msg);
            EngineError::StorageError(e)
        })?;

        Ok(order)
    }

    /// Resolves and snapshots the counterparty: the client directory for
    /// sales, the supplier directory for purchases.
    async fn resolve_counterparty(
        &self,
        store: &dyn CommerceStore,
    ) -> Result<Counterparty, EngineError> {
        match self.order_type {
            OrderType::Sale => store
                .get_client(self.counterparty_id)
                .await?
                .map(|client| client.counterparty())
                .ok_or_else(|| {
                    ORDER_CREATION_FAILURES.inc();
                    let msg = format!("Client {} not found", self.counterparty_id);
                    error!("{}", msg);
                    EngineError::NotFound(msg)
                }),
            OrderType::Purchase => store
                .get_supplier(self.counterparty_id)
                .await?
                .map(|supplier| supplier.counterparty())
                .ok_or_else(|| {
                    ORDER_CREATION_FAILURES.inc();
                    let msg = format!("Supplier {} not found", self.counterparty_id);
                    error!("{}", msg);
                    EngineError::NotFound(msg)
                }),
        }
    }

    async fn log_and_trigger_event(&self, event_sender: &EventSender, saved_order: &Order) {
        info!(
            order_id = %saved_order.id,
            number = %saved_order.number,
            order_type = %self.order_type,
            "Order created successfully"
        );

        if let Err(e) = event_sender.send(Event::OrderCreated(saved_order.id)).await {
            warn!(
                order_id = %saved_order.id,
                "Failed to send event for created order: {}", e
            );
        }
    }
}
