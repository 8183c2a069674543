use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::errors::EngineError;
use crate::money::{validate_percent, validate_unit_price};
use crate::pricing::{self, OrderTotals};

/// Enum representing the possible statuses of an order.
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
pub enum OrderStatus {
    Draft,
    Processing,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Terminal statuses admit no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether lines and discounts may still change.
    pub fn is_editable(self) -> bool {
        matches!(self, Self::Draft | Self::Processing)
    }

    /// Valid edges of the order lifecycle. Cancellation is reachable from
    /// every non-terminal status; everything else moves strictly forward.
    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, target) {
            (Draft, Processing) => true,
            (Processing, Confirmed) => true,
            (Confirmed, Shipped) => true,
            (Shipped, Delivered) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// Kind of commercial order: a sale to a client or a purchase from a
/// supplier. The kind decides which directory the counterparty comes from
/// and which documents can be printed.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderType {
    Sale,
    Purchase,
}

/// Snapshot of the client or supplier the order was taken for, captured at
/// creation time so printed documents stay stable when the directory record
/// changes later.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Counterparty {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
}

/// A single order line. Designation, unit price and VAT rate are snapshots
/// taken from the catalog when the line was entered; catalog edits never
/// reprice an existing order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct OrderLine {
    /// Catalog reference of the product, e.g. "ART-0042".
    #[validate(length(min = 1, message = "Product reference is required"))]
    pub product_ref: String,

    #[validate(length(min = 1, message = "Designation is required"))]
    pub designation: String,

    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,

    /// Unit price excluding tax.
    #[validate(custom = "validate_unit_price")]
    pub unit_price: Decimal,

    /// Line discount in percent of the gross amount.
    #[validate(custom = "validate_percent")]
    pub discount_percent: Decimal,

    #[validate(custom = "validate_percent")]
    pub vat_percent: Decimal,
}

/// A commercial order. Financial state is fully derivable from `lines` and
/// `global_discount_percent`; `totals` is only the display cache of the last
/// computation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct Order {
    pub id: Uuid,

    /// Business order number, e.g. "BC2024-0042". Uniqueness is enforced by
    /// the hosting application.
    #[validate(length(min = 1, message = "Order number is required"))]
    pub number: String,

    pub order_type: OrderType,

    pub counterparty: Counterparty,

    pub status: OrderStatus,

    #[validate]
    pub lines: Vec<OrderLine>,

    /// Order-level discount in percent, applied to the gross total.
    #[validate(custom = "validate_percent")]
    pub global_discount_percent: Decimal,

    /// Display cache of the last computed totals. Rewritten on every save;
    /// document generation recomputes from `lines` instead of trusting it.
    pub totals: Option<OrderTotals>,

    pub notes: Option<String>,

    pub order_date: DateTime<Utc>,

    pub expected_delivery_date: Option<DateTime<Utc>>,

    /// Stamped when the order enters `shipped`.
    pub shipped_at: Option<DateTime<Utc>>,

    /// Stamped when the order enters `cancelled`.
    pub cancelled_at: Option<DateTime<Utc>>,

    pub cancel_reason: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Creates a new order with the specified parameters.
    pub fn new(
        number: String,
        order_type: OrderType,
        counterparty: Counterparty,
        lines: Vec<OrderLine>,
        global_discount_percent: Decimal,
        status: OrderStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            number,
            order_type,
            counterparty,
            status,
            lines,
            global_discount_percent,
            totals: None,
            notes: None,
            order_date: now,
            expected_delivery_date: None,
            shipped_at: None,
            cancelled_at: None,
            cancel_reason: None,
            created_at: now,
            updated_at: None,
        }
    }

    /// Moves the order to `target`, stamping the matching dates. Status and
    /// date stamps change together or not at all.
    pub fn transition_to(
        &mut self,
        target: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        if !self.status.can_transition_to(target) {
            return Err(EngineError::InvalidStatusTransition(format!(
                "Order {}: cannot move from {} to {}",
                self.id, self.status, target
            )));
        }
        self.status = target;
        match target {
            OrderStatus::Shipped => self.shipped_at = Some(now),
            OrderStatus::Cancelled => self.cancelled_at = Some(now),
            _ => {}
        }
        self.updated_at = Some(now);
        Ok(())
    }

    /// Recomputes the financial totals from the lines.
    pub fn compute_totals(&self) -> Result<OrderTotals, EngineError> {
        pricing::compute_order_totals(&self.lines, self.global_discount_percent)
    }

    /// Adds a note to the order.
    pub fn add_note(&mut self, note: String) {
        self.notes = Some(note);
        self.updated_at = Some(Utc::now());
    }
}
