use crate::{
    errors::EngineError,
    events::{Event, EventSender},
    models::{Delivery, DeliveryPatch, DeliveryStatus, DeliveryView, OrderStatus, VirtualDelivery},
    store::{CommerceStore, OrderFilter},
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Service for deliveries, real and virtual. Orders that shipped without a
/// persisted delivery are presented through a read-only projection; the
/// first edit materializes the record, and from then on the delivery runs
/// its own status machine.
#[derive(Clone)]
pub struct DeliveryService {
    store: Arc<dyn CommerceStore>,
    event_sender: Arc<EventSender>,
}

impl DeliveryService {
    /// Creates a new delivery service instance
    pub fn new(store: Arc<dyn CommerceStore>, event_sender: Arc<EventSender>) -> Self {
        Self {
            store,
            event_sender,
        }
    }

    /// Fetches a persisted delivery or fails with `NotFound`.
    #[instrument(skip(self))]
    pub async fn get_delivery(&self, delivery_id: Uuid) -> Result<Delivery, EngineError> {
        self.store
            .get_delivery(delivery_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("Delivery {} not found", delivery_id)))
    }

    /// The delivery view of an order: the persisted record when one exists,
    /// otherwise the virtual projection of a shipped order.
    #[instrument(skip(self))]
    pub async fn get_for_order(&self, order_id: Uuid) -> Result<DeliveryView, EngineError> {
        if let Some(delivery) = self.store.find_delivery_by_order(order_id).await? {
            return Ok(DeliveryView::Real(delivery));
        }

        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("Order {} not found", order_id)))?;

        VirtualDelivery::project(&order)
            .map(DeliveryView::Virtual)
            .ok_or_else(|| {
                EngineError::NotFound(format!("Order {} has no delivery", order_id))
            })
    }

    /// Lists every delivery: persisted records first, then projections for
    /// shipped or delivered orders that have none yet.
    #[instrument(skip(self))]
    pub async fn list_deliveries(&self) -> Result<Vec<DeliveryView>, EngineError> {
        let real = self.store.list_deliveries().await?;
        let covered: HashSet<Uuid> = real.iter().map(|delivery| delivery.order_id).collect();

        let mut views: Vec<DeliveryView> = real.into_iter().map(DeliveryView::Real).collect();

        for status in [OrderStatus::Shipped, OrderStatus::Delivered] {
            let filter = OrderFilter {
                status: Some(status),
                ..Default::default()
            };
            for order in self.store.list_orders(&filter).await? {
                if covered.contains(&order.id) {
                    continue;
                }
                if let Some(projection) = VirtualDelivery::project(&order) {
                    views.push(DeliveryView::Virtual(projection));
                }
            }
        }

        Ok(views)
    }

    /// Turns the virtual delivery of an order into a persisted record with
    /// preparing defaults. Idempotent: an existing delivery is returned
    /// untouched.
    #[instrument(skip(self))]
    pub async fn materialize(&self, order_id: Uuid) -> Result<Delivery, EngineError> {
        if let Some(existing) = self.store.find_delivery_by_order(order_id).await? {
            return Ok(existing);
        }

        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("Order {} not found", order_id)))?;

        if VirtualDelivery::project(&order).is_none() {
            return Err(EngineError::InvalidOperation(format!(
                "Order {} has not shipped; there is no delivery to materialize",
                order_id
            )));
        }

        let delivery = Delivery::materialize(&order, Utc::now());
        self.store.create_delivery(&delivery).await?;

        info!(
            delivery_id = %delivery.id,
            order_id = %order_id,
            "Delivery materialized from projection"
        );
        if let Err(e) = self
            .event_sender
            .send(Event::DeliveryMaterialized {
                delivery_id: delivery.id,
                order_id,
            })
            .await
        {
            warn!(
                delivery_id = %delivery.id,
                "Failed to send event for materialized delivery: {}", e
            );
        }

        Ok(delivery)
    }

    /// Edits the delivery of an order, materializing it first when the order
    /// only had a projection.
    #[instrument(skip(self, patch))]
    pub async fn update_for_order(
        &self,
        order_id: Uuid,
        patch: DeliveryPatch,
    ) -> Result<Delivery, EngineError> {
        let delivery = self.materialize(order_id).await?;
        self.apply_patch(delivery, patch).await
    }

    /// Edits a persisted delivery directly.
    #[instrument(skip(self, patch))]
    pub async fn update_delivery(
        &self,
        delivery_id: Uuid,
        patch: DeliveryPatch,
    ) -> Result<Delivery, EngineError> {
        let delivery = self.get_delivery(delivery_id).await?;
        self.apply_patch(delivery, patch).await
    }

    /// Marks a delivery as shipped, stamping `shipped_at`.
    #[instrument(skip(self))]
    pub async fn mark_shipped(&self, delivery_id: Uuid) -> Result<Delivery, EngineError> {
        self.update_delivery(
            delivery_id,
            DeliveryPatch {
                status: Some(DeliveryStatus::Shipped),
                ..Default::default()
            },
        )
        .await
    }

    /// Marks an in-transit delivery as delivered, stamping `delivered_at`.
    #[instrument(skip(self))]
    pub async fn mark_delivered(&self, delivery_id: Uuid) -> Result<Delivery, EngineError> {
        self.update_delivery(
            delivery_id,
            DeliveryPatch {
                status: Some(DeliveryStatus::Delivered),
                ..Default::default()
            },
        )
        .await
    }

    async fn apply_patch(
        &self,
        mut delivery: Delivery,
        patch: DeliveryPatch,
    ) -> Result<Delivery, EngineError> {
        let now = Utc::now();
        let old_status = delivery.status;

        if let Some(target) = patch.status {
            delivery.transition_to(target, now)?;
        }
        if let Some(carrier) = patch.carrier {
            delivery.carrier = Some(carrier);
        }
        if let Some(address) = patch.delivery_address {
            delivery.delivery_address = Some(address);
        }
        if let Some(expected_at) = patch.expected_at {
            delivery.expected_at = Some(expected_at);
        }
        if let Some(fees) = patch.fees {
            if fees < Decimal::ZERO {
                return Err(EngineError::ValidationError(format!(
                    "Delivery {}: fees cannot be negative",
                    delivery.id
                )));
            }
            delivery.fees = fees;
        }
        if let Some(notes) = patch.notes {
            delivery.notes = Some(notes);
        }
        delivery.updated_at = Some(now);

        self.store.save_delivery(&delivery).await?;

        if delivery.status != old_status {
            if let Err(e) = self
                .event_sender
                .send(Event::DeliveryStatusChanged {
                    delivery_id: delivery.id,
                    old_status,
                    new_status: delivery.status,
                })
                .await
            {
                warn!(
                    delivery_id = %delivery.id,
                    "Failed to send event for delivery status change: {}", e
                );
            }
        }

        Ok(delivery)
    }
}
