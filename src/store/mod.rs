/*!
 * # Commerce Store
 *
 * Persistence seam for orders, deliveries and counterparties. The engine
 * only ever talks to these traits; the bundled [`memory::InMemoryStore`]
 * backs tests and embedded use, and a database-backed implementation can
 * be dropped in without touching the commands or services.
 */

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::StoreError;
use crate::models::{Client, Delivery, Order, OrderStatus, OrderType, Product, Supplier};

pub mod memory;

pub use memory::InMemoryStore;

/// Filter for order listings. Empty filter matches everything.
#[derive(Clone, Debug, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub order_type: Option<OrderType>,
    pub counterparty_id: Option<Uuid>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(status) = self.status {
            if order.status != status {
                return false;
            }
        }
        if let Some(order_type) = self.order_type {
            if order.order_type != order_type {
                return false;
            }
        }
        if let Some(counterparty_id) = self.counterparty_id {
            if order.counterparty.id != counterparty_id {
                return false;
            }
        }
        true
    }
}

/// Storage operations for the order and delivery lifecycle.
#[async_trait]
pub trait CommerceStore: Send + Sync {
    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError>;
    async fn save_order(&self, order: &Order) -> Result<(), StoreError>;
    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, StoreError>;

    async fn get_delivery(&self, id: Uuid) -> Result<Option<Delivery>, StoreError>;
    /// At most one delivery exists per order.
    async fn find_delivery_by_order(&self, order_id: Uuid) -> Result<Option<Delivery>, StoreError>;
    async fn list_deliveries(&self) -> Result<Vec<Delivery>, StoreError>;
    /// Inserts a new delivery. Fails if the order already has one.
    async fn create_delivery(&self, delivery: &Delivery) -> Result<(), StoreError>;
    async fn save_delivery(&self, delivery: &Delivery) -> Result<(), StoreError>;

    async fn get_client(&self, id: Uuid) -> Result<Option<Client>, StoreError>;
    async fn get_supplier(&self, id: Uuid) -> Result<Option<Supplier>, StoreError>;
    /// Bumps the supplier's pending purchase order counter.
    async fn increment_supplier_pending_orders(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Read access to the product catalog, keyed by product reference.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn get_product(&self, reference: &str) -> Result<Option<Product>, StoreError>;
}
