use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::EngineError;
use crate::models::order::{Order, OrderStatus};

/// Prefix of delivery numbers, derived from the order number at projection
/// and materialization time.
pub const DELIVERY_NUMBER_PREFIX: &str = "LIV-";

/// Enum representing the possible statuses of a delivery.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeliveryStatus {
    Preparing,
    Shipped,
    InTransit,
    Delivered,
    Returned,
}

impl DeliveryStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Returned)
    }

    /// Valid edges of the delivery lifecycle. A delivery either completes or
    /// comes back; both outcomes branch from `in_transit`.
    pub fn can_transition_to(self, target: DeliveryStatus) -> bool {
        use DeliveryStatus::*;
        matches!(
            (self, target),
            (Preparing, Shipped) | (Shipped, InTransit) | (InTransit, Delivered) | (InTransit, Returned)
        )
    }
}

/// Carrier details attached to a delivery once transport is booked.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CarrierInfo {
    pub name: String,
    /// Shipping mode, free text (e.g. "route", "express").
    pub mode: Option<String>,
    pub tracking_number: Option<String>,
}

/// A persisted delivery. At most one exists per order; before it is created,
/// shipped orders are represented by a [`VirtualDelivery`] projection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: Uuid,

    /// Delivery number, `LIV-` followed by the order number.
    pub number: String,

    pub order_id: Uuid,

    /// Authoritative once materialized; never re-synced from the order.
    pub status: DeliveryStatus,

    pub carrier: Option<CarrierInfo>,

    pub delivery_address: Option<String>,

    /// Transport fees, not part of the order totals.
    pub fees: Decimal,

    pub notes: Option<String>,

    pub prepared_at: DateTime<Utc>,

    pub expected_at: Option<DateTime<Utc>>,

    /// Stamped when the delivery enters `shipped`.
    pub shipped_at: Option<DateTime<Utc>>,

    /// Stamped when the delivery enters `delivered`, or by the order
    /// lifecycle when the order itself is marked delivered.
    pub delivered_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: Option<DateTime<Utc>>,
}

impl Delivery {
    /// Builds the real delivery record for an order, with projection
    /// defaults: `preparing` status, no carrier, zero fees, the address
    /// taken from the counterparty snapshot.
    pub fn materialize(order: &Order, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            number: format!("{}{}", DELIVERY_NUMBER_PREFIX, order.number),
            order_id: order.id,
            status: DeliveryStatus::Preparing,
            carrier: None,
            delivery_address: order.counterparty.address.clone(),
            fees: Decimal::ZERO,
            notes: None,
            prepared_at: now,
            expected_at: order.expected_delivery_date,
            shipped_at: None,
            delivered_at: None,
            created_at: now,
            updated_at: None,
        }
    }

    /// Moves the delivery to `target`, stamping the matching dates.
    pub fn transition_to(
        &mut self,
        target: DeliveryStatus,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        if !self.status.can_transition_to(target) {
            return Err(EngineError::InvalidStatusTransition(format!(
                "Delivery {}: cannot move from {} to {}",
                self.id, self.status, target
            )));
        }
        self.status = target;
        match target {
            DeliveryStatus::Shipped => self.shipped_at = Some(now),
            DeliveryStatus::Delivered => self.delivered_at = Some(now),
            _ => {}
        }
        self.updated_at = Some(now);
        Ok(())
    }
}

/// Read-only projection standing in for the delivery of a shipped order
/// that has no persisted record yet. Editing one materializes it first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VirtualDelivery {
    pub number: String,
    pub order_id: Uuid,
    /// Mirrors the order status for as long as the projection exists.
    pub status: DeliveryStatus,
    pub delivery_address: Option<String>,
    pub expected_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
}

impl VirtualDelivery {
    /// Projects the virtual delivery of `order`, or `None` while the order
    /// has not shipped. Carrier info stays empty; dates come from the order.
    pub fn project(order: &Order) -> Option<Self> {
        let status = match order.status {
            OrderStatus::Shipped => DeliveryStatus::Shipped,
            OrderStatus::Delivered => DeliveryStatus::Delivered,
            _ => return None,
        };
        Some(Self {
            number: format!("{}{}", DELIVERY_NUMBER_PREFIX, order.number),
            order_id: order.id,
            status,
            delivery_address: order.counterparty.address.clone(),
            expected_at: order.expected_delivery_date,
            shipped_at: order.shipped_at,
        })
    }
}

/// One row of the delivery listing: a persisted delivery or a projection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliveryView {
    Real(Delivery),
    Virtual(VirtualDelivery),
}

impl DeliveryView {
    pub fn order_id(&self) -> Uuid {
        match self {
            Self::Real(delivery) => delivery.order_id,
            Self::Virtual(projection) => projection.order_id,
        }
    }

    pub fn status(&self) -> DeliveryStatus {
        match self {
            Self::Real(delivery) => delivery.status,
            Self::Virtual(projection) => projection.status,
        }
    }
}

/// Partial update applied to a delivery; absent fields are left unchanged.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DeliveryPatch {
    pub status: Option<DeliveryStatus>,
    pub carrier: Option<CarrierInfo>,
    pub delivery_address: Option<String>,
    pub expected_at: Option<DateTime<Utc>>,
    pub fees: Option<Decimal>,
    pub notes: Option<String>,
}
