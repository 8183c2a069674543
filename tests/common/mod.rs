use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::mpsc;
use uuid::Uuid;

use gescom_core::{
    commands::orders::CreateOrderCommand,
    config::EngineConfig,
    events::Event,
    models::{
        customer::Client,
        order::{OrderLine, OrderStatus, OrderType},
        product::{Product, StockLevel},
        supplier::Supplier,
    },
    services::Services,
    store::InMemoryStore,
};

/// Product reference seeded into every test catalog.
pub const SEED_PRODUCT_REF: &str = "ART-0042";

/// Helper harness wiring the full service stack over a fresh in-memory store.
pub struct TestApp {
    pub store: Arc<InMemoryStore>,
    pub services: Services,
    pub client_id: Uuid,
    pub supplier_id: Uuid,
    // Held so that event sends keep succeeding for the lifetime of the test.
    pub event_receiver: mpsc::Receiver<Event>,
}

impl TestApp {
    /// Construct a new test application with fresh store state and seed data.
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());

        store.insert_product(Product {
            reference: SEED_PRODUCT_REF.to_string(),
            designation: "Ramette papier A4".to_string(),
            sale_price: dec!(100.00),
            vat_percent: dec!(20),
            stock: StockLevel {
                on_hand: 50,
                minimum: 10,
            },
        });

        let client = Client::new(
            "Société El Amen".to_string(),
            Some("contact@elamen.tn".to_string()),
            Some("12 Rue de Marseille, Tunis".to_string()),
        );
        let client_id = client.id;
        store.insert_client(client);

        let supplier = Supplier::new(
            "Fournitures du Sud".to_string(),
            Some("ventes@fdsud.tn".to_string()),
            Some("Zone Industrielle, Sfax".to_string()),
        );
        let supplier_id = supplier.id;
        store.insert_supplier(supplier);

        let config = EngineConfig::default();
        let (services, event_receiver) =
            Services::build(store.clone(), store.clone(), &config);

        Self {
            store,
            services,
            client_id,
            supplier_id,
            event_receiver,
        }
    }

    /// Reference line used across the lifecycle tests: 3 x 100.00 with a 10%
    /// line discount and 20% VAT.
    pub fn reference_line(&self) -> OrderLine {
        OrderLine {
            product_ref: SEED_PRODUCT_REF.to_string(),
            designation: "Ramette papier A4".to_string(),
            quantity: 3,
            unit_price: dec!(100.00),
            discount_percent: dec!(10),
            vat_percent: dec!(20),
        }
    }

    /// Command for a draft sale order carrying the reference line and a 5%
    /// global discount.
    pub fn sale_order_command(&self, number: &str) -> CreateOrderCommand {
        CreateOrderCommand {
            order_type: OrderType::Sale,
            number: number.to_string(),
            counterparty_id: self.client_id,
            lines: vec![self.reference_line()],
            global_discount_percent: dec!(5),
            initial_status: OrderStatus::Draft,
            expected_delivery_date: Some(Utc::now()),
            notes: None,
        }
    }

    /// Command for a draft purchase order addressed to the seeded supplier.
    pub fn purchase_order_command(&self, number: &str) -> CreateOrderCommand {
        CreateOrderCommand {
            order_type: OrderType::Purchase,
            number: number.to_string(),
            counterparty_id: self.supplier_id,
            lines: vec![self.reference_line()],
            global_discount_percent: Decimal::ZERO,
            initial_status: OrderStatus::Draft,
            expected_delivery_date: None,
            notes: None,
        }
    }

    /// Create a sale order and return its id.
    pub async fn create_sale_order(&self, number: &str) -> Uuid {
        let result = self
            .services
            .orders
            .create_order(self.sale_order_command(number))
            .await
            .expect("sale order creation failed");
        result.id
    }

    /// Create a purchase order and return its id.
    pub async fn create_purchase_order(&self, number: &str) -> Uuid {
        let result = self
            .services
            .orders
            .create_order(self.purchase_order_command(number))
            .await
            .expect("purchase order creation failed");
        result.id
    }

    /// Walk an order forward through the lifecycle until it reaches `target`.
    pub async fn drive_to(&self, order_id: Uuid, target: OrderStatus) {
        let path = [
            OrderStatus::Processing,
            OrderStatus::Confirmed,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ];
        for status in path {
            self.services
                .orders
                .update_status(order_id, status)
                .await
                .expect("lifecycle step failed");
            if status == target {
                return;
            }
        }
        panic!("{:?} is not reachable through the forward lifecycle", target);
    }
}
