use crate::{
    commands::orders::{
        CancelOrderCommand, ConfirmOrderCommand, CreateOrderCommand, DeliverOrderCommand,
        ProcessOrderCommand, ShipOrderCommand,
    },
    commands::Command,
    errors::EngineError,
    events::EventSender,
    models::{Order, OrderLine, OrderStatus},
    store::{CommerceStore, OrderFilter, ProductCatalog},
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Service for managing orders across their lifecycle. Status changes go
/// through the lifecycle commands; `save_order` only accepts content edits.
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn CommerceStore>,
    catalog: Arc<dyn ProductCatalog>,
    event_sender: Arc<EventSender>,
}

impl OrderService {
    /// Creates a new order service instance
    pub fn new(
        store: Arc<dyn CommerceStore>,
        catalog: Arc<dyn ProductCatalog>,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            store,
            catalog,
            event_sender,
        }
    }

    /// Creates a new order and returns the saved record.
    #[instrument(skip(self, command), fields(number = %command.number))]
    pub async fn create_order(&self, command: CreateOrderCommand) -> Result<Order, EngineError> {
        let result = command
            .execute(self.store.clone(), self.event_sender.clone())
            .await?;
        self.get_order(result.id).await
    }

    /// Fetches an order or fails with `NotFound`.
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<Order, EngineError> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("Order {} not found", order_id)))
    }

    /// Lists orders matching the filter, newest first.
    #[instrument(skip(self, filter))]
    pub async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, EngineError> {
        Ok(self.store.list_orders(filter).await?)
    }

    /// Saves content edits to an order: lines, discounts, notes, expected
    /// date. Totals are recomputed on the way in so the stored snapshot never
    /// goes stale. Once the order is confirmed its lines and discounts are
    /// frozen, and the status itself can only move through the lifecycle
    /// commands.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn save_order(&self, mut order: Order) -> Result<Order, EngineError> {
        order.validate()?;

        let stored = self.get_order(order.id).await?;

        if stored.status != order.status {
            return Err(EngineError::InvalidOperation(format!(
                "Order {}: status changes go through the lifecycle commands",
                order.id
            )));
        }

        let content_changed = stored.lines != order.lines
            || stored.global_discount_percent != order.global_discount_percent;
        if content_changed && !stored.status.is_editable() {
            return Err(EngineError::InvalidOperation(format!(
                "Order {}: lines and discounts are frozen once the order is {}",
                order.id, stored.status
            )));
        }

        let totals = order.compute_totals()?;
        order.totals = Some(totals);
        order.updated_at = Some(Utc::now());

        self.store.save_order(&order).await?;
        Ok(order)
    }

    /// Dispatches a target status supplied by the boundary to the matching
    /// lifecycle command and returns the updated order.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        target: OrderStatus,
    ) -> Result<Order, EngineError> {
        let store = self.store.clone();
        let events = self.event_sender.clone();

        match target {
            OrderStatus::Processing => {
                ProcessOrderCommand { order_id }.execute(store, events).await?;
            }
            OrderStatus::Confirmed => {
                ConfirmOrderCommand { order_id }.execute(store, events).await?;
            }
            OrderStatus::Shipped => {
                ShipOrderCommand { order_id }.execute(store, events).await?;
            }
            OrderStatus::Delivered => {
                DeliverOrderCommand { order_id }.execute(store, events).await?;
            }
            OrderStatus::Cancelled => {
                CancelOrderCommand {
                    order_id,
                    reason: None,
                }
                .execute(store, events)
                .await?;
            }
            OrderStatus::Draft => {
                return Err(EngineError::InvalidStatusTransition(format!(
                    "Order {}: no path back to draft",
                    order_id
                )));
            }
        }

        self.get_order(order_id).await
    }

    /// Cancels an order with an optional reason.
    #[instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        order_id: Uuid,
        reason: Option<String>,
    ) -> Result<Order, EngineError> {
        CancelOrderCommand { order_id, reason }
            .execute(self.store.clone(), self.event_sender.clone())
            .await?;
        self.get_order(order_id).await
    }

    /// Builds an order line from the catalog, snapshotting designation,
    /// price and VAT rate. Stock is checked only to warn the operator; the
    /// line is created either way and the catalog is never mutated here.
    #[instrument(skip(self))]
    pub async fn line_from_catalog(
        &self,
        product_ref: &str,
        quantity: i32,
        discount_percent: Decimal,
    ) -> Result<OrderLine, EngineError> {
        let product = self
            .catalog
            .get_product(product_ref)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("Product {} not found", product_ref)))?;

        if quantity > product.stock.on_hand {
            warn!(
                product_ref = %product_ref,
                requested = quantity,
                on_hand = product.stock.on_hand,
                "Requested quantity exceeds stock on hand"
            );
        } else if product.stock.on_hand - quantity <= product.stock.minimum {
            warn!(
                product_ref = %product_ref,
                remaining = product.stock.on_hand - quantity,
                minimum = product.stock.minimum,
                "Order would leave stock at or below the minimum"
            );
        }

        Ok(product.to_line(quantity, discount_percent))
    }
}
