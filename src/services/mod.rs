// Core services
pub mod deliveries;
pub mod documents;
pub mod orders;
pub mod suppliers;

pub use deliveries::DeliveryService;
pub use documents::DocumentService;
pub use orders::OrderService;
pub use suppliers::SupplierService;

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::EngineConfig;
use crate::documents::DocumentRenderer;
use crate::events::{event_channel, Event};
use crate::store::{CommerceStore, ProductCatalog};

/// Service container holding all service instances
#[derive(Clone)]
pub struct Services {
    pub orders: OrderService,
    pub deliveries: DeliveryService,
    pub suppliers: SupplierService,
    pub documents: DocumentService,
}

impl Services {
    /// Wires every service onto the shared store, catalog and event channel.
    /// The returned receiver is the host's end of the channel; dropping it
    /// turns later event sends into logged warnings.
    pub fn build(
        store: Arc<dyn CommerceStore>,
        catalog: Arc<dyn ProductCatalog>,
        config: &EngineConfig,
    ) -> (Self, mpsc::Receiver<Event>) {
        let (event_sender, event_receiver) = event_channel(config.event_channel_capacity);
        let event_sender = Arc::new(event_sender);
        let renderer = Arc::new(DocumentRenderer::new(
            config.issuer.clone(),
            config.currency.clone(),
        ));

        let services = Self {
            orders: OrderService::new(store.clone(), catalog, event_sender.clone()),
            deliveries: DeliveryService::new(store.clone(), event_sender.clone()),
            suppliers: SupplierService::new(store.clone()),
            documents: DocumentService::new(store, renderer),
        };

        (services, event_receiver)
    }
}
