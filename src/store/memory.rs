use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::StoreError;
use crate::models::{Client, Delivery, Order, Product, Supplier};
use crate::store::{CommerceStore, OrderFilter, ProductCatalog};

/// In-memory store backed by concurrent maps. Products are keyed by their
/// reference, everything else by UUID. Cloned handles share the same data.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    orders: Arc<DashMap<Uuid, Order>>,
    deliveries: Arc<DashMap<Uuid, Delivery>>,
    clients: Arc<DashMap<Uuid, Client>>,
    suppliers: Arc<DashMap<Uuid, Supplier>>,
    products: Arc<DashMap<String, Product>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a product into the catalog.
    pub fn insert_product(&self, product: Product) {
        self.products.insert(product.reference.clone(), product);
    }

    /// Seeds a client.
    pub fn insert_client(&self, client: Client) {
        self.clients.insert(client.id, client);
    }

    /// Seeds a supplier.
    pub fn insert_supplier(&self, supplier: Supplier) {
        self.suppliers.insert(supplier.id, supplier);
    }
}

#[async_trait]
impl CommerceStore for InMemoryStore {
    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.get(&id).map(|entry| entry.clone()))
    }

    async fn save_order(&self, order: &Order) -> Result<(), StoreError> {
        self.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.clone())
            .collect();
        orders.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.number.cmp(&b.number))
        });
        Ok(orders)
    }

    async fn get_delivery(&self, id: Uuid) -> Result<Option<Delivery>, StoreError> {
        Ok(self.deliveries.get(&id).map(|entry| entry.clone()))
    }

    async fn find_delivery_by_order(&self, order_id: Uuid) -> Result<Option<Delivery>, StoreError> {
        Ok(self
            .deliveries
            .iter()
            .find(|entry| entry.order_id == order_id)
            .map(|entry| entry.clone()))
    }

    async fn list_deliveries(&self) -> Result<Vec<Delivery>, StoreError> {
        let mut deliveries: Vec<Delivery> =
            self.deliveries.iter().map(|entry| entry.clone()).collect();
        deliveries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.number.cmp(&b.number))
        });
        Ok(deliveries)
    }

    async fn create_delivery(&self, delivery: &Delivery) -> Result<(), StoreError> {
        if self
            .deliveries
            .iter()
            .any(|entry| entry.order_id == delivery.order_id)
        {
            return Err(StoreError::Backend(format!(
                "Order {} already has a delivery",
                delivery.order_id
            )));
        }
        if self.deliveries.contains_key(&delivery.id) {
            return Err(StoreError::Backend(format!(
                "Delivery {} already exists",
                delivery.id
            )));
        }
        self.deliveries.insert(delivery.id, delivery.clone());
        Ok(())
    }

    async fn save_delivery(&self, delivery: &Delivery) -> Result<(), StoreError> {
        self.deliveries.insert(delivery.id, delivery.clone());
        Ok(())
    }

    async fn get_client(&self, id: Uuid) -> Result<Option<Client>, StoreError> {
        Ok(self.clients.get(&id).map(|entry| entry.clone()))
    }

    async fn get_supplier(&self, id: Uuid) -> Result<Option<Supplier>, StoreError> {
        Ok(self.suppliers.get(&id).map(|entry| entry.clone()))
    }

    async fn increment_supplier_pending_orders(&self, id: Uuid) -> Result<(), StoreError> {
        let mut supplier = self
            .suppliers
            .get_mut(&id)
            .ok_or_else(|| StoreError::Backend(format!("Supplier {} not found", id)))?;
        supplier.pending_orders_count += 1;
        supplier.updated_at = Some(Utc::now());
        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for InMemoryStore {
    async fn get_product(&self, reference: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.products.get(reference).map(|entry| entry.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Counterparty, DeliveryStatus, OrderLine, OrderStatus, OrderType};
    use rust_decimal_macros::dec;

    fn sample_order() -> Order {
        Order::new(
            "BC2024-0042".to_string(),
            OrderType::Sale,
            Counterparty {
                id: Uuid::new_v4(),
                name: "Société El Amen".to_string(),
                address: Some("14 avenue Habib Bourguiba, Tunis".to_string()),
            },
            vec![OrderLine {
                product_ref: "ART-0042".to_string(),
                designation: "Rame papier A4".to_string(),
                quantity: 3,
                unit_price: dec!(100.00),
                discount_percent: dec!(10),
                vat_percent: dec!(20),
            }],
            dec!(5),
            OrderStatus::Draft,
        )
    }

    #[tokio::test]
    async fn order_round_trip() {
        let store = InMemoryStore::new();
        let order = sample_order();

        store.save_order(&order).await.unwrap();
        let loaded = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(loaded.number, order.number);
        assert_eq!(loaded.lines.len(), 1);

        assert!(store.get_order(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_orders_applies_the_filter() {
        let store = InMemoryStore::new();
        let mut draft = sample_order();
        draft.number = "BC2024-0001".to_string();
        let mut confirmed = sample_order();
        confirmed.number = "BC2024-0002".to_string();
        confirmed.status = OrderStatus::Confirmed;

        store.save_order(&draft).await.unwrap();
        store.save_order(&confirmed).await.unwrap();

        let all = store.list_orders(&OrderFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let filter = OrderFilter {
            status: Some(OrderStatus::Confirmed),
            ..Default::default()
        };
        let confirmed_only = store.list_orders(&filter).await.unwrap();
        assert_eq!(confirmed_only.len(), 1);
        assert_eq!(confirmed_only[0].number, "BC2024-0002");
    }

    #[tokio::test]
    async fn one_delivery_per_order() {
        let store = InMemoryStore::new();
        let order = sample_order();
        store.save_order(&order).await.unwrap();

        let delivery = Delivery::materialize(&order, Utc::now());
        store.create_delivery(&delivery).await.unwrap();

        let second = Delivery::materialize(&order, Utc::now());
        let err = store.create_delivery(&second).await.unwrap_err();
        assert!(err.to_string().contains("already has a delivery"));

        let found = store
            .find_delivery_by_order(order.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, delivery.id);
        assert_eq!(found.status, DeliveryStatus::Preparing);
    }

    #[tokio::test]
    async fn save_delivery_updates_in_place() {
        let store = InMemoryStore::new();
        let order = sample_order();
        let mut delivery = Delivery::materialize(&order, Utc::now());
        store.create_delivery(&delivery).await.unwrap();

        delivery
            .transition_to(DeliveryStatus::Shipped, Utc::now())
            .unwrap();
        store.save_delivery(&delivery).await.unwrap();

        let loaded = store.get_delivery(delivery.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, DeliveryStatus::Shipped);
        assert!(loaded.shipped_at.is_some());
    }

    #[tokio::test]
    async fn supplier_counter_increments() {
        let store = InMemoryStore::new();
        let supplier = Supplier::new("Fournitures du Sud".to_string(), None, None);
        let id = supplier.id;
        store.insert_supplier(supplier);

        store.increment_supplier_pending_orders(id).await.unwrap();
        store.increment_supplier_pending_orders(id).await.unwrap();

        let loaded = store.get_supplier(id).await.unwrap().unwrap();
        assert_eq!(loaded.pending_orders_count, 2);

        let err = store
            .increment_supplier_pending_orders(Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn catalog_lookup_by_reference() {
        let store = InMemoryStore::new();
        store.insert_product(Product {
            reference: "ART-0042".to_string(),
            designation: "Rame papier A4".to_string(),
            sale_price: dec!(12.500),
            vat_percent: dec!(19),
            stock: crate::models::StockLevel {
                on_hand: 40,
                minimum: 10,
            },
        });

        let product = store.get_product("ART-0042").await.unwrap().unwrap();
        assert_eq!(product.designation, "Rame papier A4");
        assert!(store.get_product("ART-9999").await.unwrap().is_none());
    }
}
