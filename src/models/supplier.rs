use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::order::Counterparty;

/// A supplier from the directory. `pending_orders_count` is a denormalized
/// workload indicator: bumped when a purchase order is created, and only
/// then. Cancellation or delivery of the order never decrements it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct Supplier {
    pub id: Uuid,
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub pending_orders_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Supplier {
    pub fn new(name: String, email: Option<String>, address: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            phone: None,
            address,
            pending_orders_count: 0,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn counterparty(&self) -> Counterparty {
        Counterparty {
            id: self.id,
            name: self.name.clone(),
            address: self.address.clone(),
        }
    }

    /// Records one more pending purchase order.
    pub fn record_pending_order(&mut self) {
        self.pending_orders_count += 1;
        self.updated_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_counter_only_goes_up() {
        let mut supplier = Supplier::new("Fournitures du Sud".to_string(), None, None);
        assert_eq!(supplier.pending_orders_count, 0);

        supplier.record_pending_order();
        supplier.record_pending_order();

        assert_eq!(supplier.pending_orders_count, 2);
        assert!(supplier.updated_at.is_some());
    }
}
